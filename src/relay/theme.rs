//! Story themes: catalogue metadata, world setting, starting kit, encounter odds.

use std::fmt;

use super::chance::EncounterOdds;

/// Theme id used when the client sends none.
pub const DEFAULT_CUSTOM_THEME: &str = "神秘古宅";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Theme {
    CyberpunkNovel,
    PathToNowhere,
    ChineseFolklore,
    TombRaiding,
    RuleHorror,
    /// Free-form theme; the id is passed to the model as-is.
    Custom(String),
}

/// What the player carries into a freshly generated scenario.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartingKit {
    pub inventory: &'static [&'static str],
    pub status: &'static str,
    pub hints: &'static [&'static str],
}

impl Theme {
    /// Built-in themes in menu order.
    pub fn builtin() -> [Theme; 5] {
        [
            Theme::CyberpunkNovel,
            Theme::PathToNowhere,
            Theme::ChineseFolklore,
            Theme::TombRaiding,
            Theme::RuleHorror,
        ]
    }

    pub fn from_id(id: &str) -> Theme {
        match id.trim() {
            "cyberpunk_novel" => Theme::CyberpunkNovel,
            "path_to_nowhere" => Theme::PathToNowhere,
            "chinese_folklore" => Theme::ChineseFolklore,
            "tomb_raiding" => Theme::TombRaiding,
            "rule_horror" => Theme::RuleHorror,
            "" => Theme::Custom(DEFAULT_CUSTOM_THEME.to_string()),
            other => Theme::Custom(other.to_string()),
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Theme::CyberpunkNovel => "cyberpunk_novel",
            Theme::PathToNowhere => "path_to_nowhere",
            Theme::ChineseFolklore => "chinese_folklore",
            Theme::TombRaiding => "tomb_raiding",
            Theme::RuleHorror => "rule_horror",
            Theme::Custom(id) => id,
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            Theme::CyberpunkNovel => "穿进赛博游戏",
            Theme::PathToNowhere => "无期迷途",
            Theme::ChineseFolklore => "中式民俗",
            Theme::TombRaiding => "盗墓探险",
            Theme::RuleHorror => "规则怪谈",
            Theme::Custom(id) => id,
        }
    }

    pub fn description(&self) -> &str {
        match self {
            Theme::CyberpunkNovel => "赛博朋克未来，七大区财团统治，义体改造与地下反抗军的博弈。",
            Theme::PathToNowhere => {
                "身处狄斯城（辛迪加/新城/MBCC），身为禁闭者的你，需要在狂厄与混乱中求生。"
            }
            Theme::ChineseFolklore => {
                "偏远山村，封建迷信，纸人冥婚，诡异的民俗仪式。你为了寻找失踪的亲人回到故乡。"
            }
            Theme::TombRaiding => "分金定穴，点烛开棺。在机关重重的古墓中寻找失落的秘宝，小心\"粽子\"。",
            Theme::RuleHorror => "看似正常的场所暗藏不可名状的恐怖。找到规则，遵守规则，然后活着离开。",
            Theme::Custom(_) => "自定义主题。",
        }
    }

    /// World background handed to the model when generating a scenario.
    pub fn setting(&self) -> String {
        let text = match self {
            Theme::CyberpunkNovel => CYBERPUNK_SETTING,
            Theme::PathToNowhere => PATH_TO_NOWHERE_SETTING,
            Theme::ChineseFolklore => FOLKLORE_SETTING,
            Theme::TombRaiding => TOMB_SETTING,
            Theme::RuleHorror => RULE_HORROR_SETTING,
            Theme::Custom(id) => return format!("主题：{}", id),
        };
        text.to_string()
    }

    /// Short world name used in the per-turn writing rules.
    pub fn world_label(&self) -> &str {
        match self {
            Theme::CyberpunkNovel => "赛博朋克",
            Theme::PathToNowhere => "《无期迷途》",
            Theme::ChineseFolklore => "中式民俗恐怖",
            Theme::TombRaiding => "盗墓探险",
            Theme::RuleHorror => "规则怪谈（违反规则必死）",
            Theme::Custom(id) => id,
        }
    }

    pub fn starting_kit(&self) -> Option<StartingKit> {
        let kit = match self {
            Theme::CyberpunkNovel => StartingKit {
                inventory: &["便携式终端", "基础破解芯片"],
                status: "义体负荷正常",
                hints: &[],
            },
            Theme::PathToNowhere => StartingKit {
                inventory: &[],
                status: "正常",
                hints: &[],
            },
            Theme::ChineseFolklore => StartingKit {
                inventory: &["老式手电筒"],
                status: "惊魂未定",
                hints: &[],
            },
            Theme::TombRaiding => StartingKit {
                inventory: &["洛阳铲", "黑驴蹄子", "蜡烛", "糯米"],
                status: "状态良好",
                hints: &[],
            },
            Theme::RuleHorror => StartingKit {
                inventory: &["手机（电量47%）", "钥匙"],
                status: "心跳加速",
                hints: &[
                    "【规则1】不要与穿红衣服的人说话",
                    "【规则2】听到敲门声，数到10再开门",
                    "【规则3】凌晨3点必须躲在被子里",
                ],
            },
            Theme::Custom(_) => return None,
        };
        Some(kit)
    }

    pub fn encounter_odds(&self) -> EncounterOdds {
        match self {
            Theme::RuleHorror => EncounterOdds {
                npc: 0.30,
                item: 0.25,
            },
            Theme::Custom(_) => EncounterOdds::NONE,
            _ => EncounterOdds {
                npc: 0.25,
                item: 0.20,
            },
        }
    }

    /// What kind of characters the model should invent when an NPC turns up.
    pub fn npc_guidance(&self) -> &'static str {
        match self {
            Theme::CyberpunkNovel => CYBERPUNK_NPCS,
            Theme::PathToNowhere => PATH_TO_NOWHERE_NPCS,
            Theme::ChineseFolklore => FOLKLORE_NPCS,
            Theme::TombRaiding => TOMB_NPCS,
            Theme::RuleHorror => RULE_HORROR_NPCS,
            Theme::Custom(_) => "请设计符合当前场景氛围的原创NPC，为其设计独特的外号和外貌特征。",
        }
    }

    /// Where granted items should come from.
    pub fn item_guidance(&self) -> &'static str {
        match self {
            Theme::PathToNowhere => {
                "根据场景给予合适道具：辛迪加可得狂厄抑制剂、简易武器、情报记录；\
                 新城可得门禁卡、伪造证件；彼岸诊所可得医疗用品、狂厄检测仪。"
            }
            Theme::RuleHorror => {
                "给予线索或道具：上一个受害者留下的日记/便条、补充规则的纸条、\
                 可能帮助逃脱的钥匙或工具。"
            }
            _ => "如果玩家进行了探索、战斗或解谜，请给予符合场景的道具。",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

const CYBERPUNK_SETTING: &str = "\
世界观参考小说《穿进赛博游戏后干掉boss成功上位》。
背景：赛博朋克未来，世界分为七大区。
核心元素：义体改造、财团统治、地下反抗军、傀儡城。
玩家角色：可能是试图推翻\"长老会\"的反叛者，或者是意外穿越的游戏玩家。
风格：黑暗、霓虹、高科技低生活、暴力美学。
特殊设定：
1. 你的目标是生存并在财团的追捕下完成任务。
2. 道具系统：场景中可能包含黑客工具、义体插件、武器、恢复剂等。";

const PATH_TO_NOWHERE_SETTING: &str = "\
世界观参考游戏《无期迷途》。
【世界背景】
狄斯城（DisCity）：殒星降临后，人类在内海附近建立的新城邦。以锈河为界，西岸为异方晶采矿业中心，东岸为商业娱乐新区。
【主要区域】
1. 辛迪加（Syndicate）：原称\"西区\"，采矿业凋零后沦为非法组织藏身地，暴力团伙自治，争斗与狂厄泛滥。关键地标：彼岸诊所。
2. 新城（New City）：市议会迁驻后最繁荣的城区，秩序井然但暗流涌动。
3. MBCC（米诺斯危机管理局）：专门收容和控制禁闭者的秘密机构，由第九机关领导。
4. 白砂之海：沙漠与荒野交界的边缘地带，散落着卫星城和聚落。
【核心元素】
- 狂厄（Mania）：神秘的精神侵蚀现象，会导致禁闭者失控暴走。
- 禁闭者（Sinners）：拥有异能的特殊人类，分为普/危/狂三个等级。
- 异方晶：稀有矿物，与狂厄和异能密切相关。
【重要NPC】
- 艾恩：彼岸诊所主理人，医术高超，对狂厄武器深恶痛绝，对官方不信任。
- 安：彼岸诊所护士长，对患者有极高的责任感。
- 帕尔马：导致辛迪加狂厄武器泛滥的幕后黑手。
- 米诺斯局长：拥有\"枷锁\"能力，仅在玩家生死关头有极低概率（5%）出现救场。
【特殊设定】
1. 你的目标是生存和逃离当前困境。
2. 场景中可能隐藏关键道具（狂厄抑制剂、门禁卡、简易武器、情报记录等）。
3. 过度使用异能会提高狂厄值，达到临界点可能失控。
4. 文本风格要贴近原生游戏，注重逻辑性和沉浸感。";

const FOLKLORE_SETTING: &str = "\
世界观参考《纸嫁衣》、《烟火》等中式民俗恐怖作品。
背景：偏远闭塞的山村（如\"封门村\"、\"葬铃村\"），保留着诡异的封建迷信习俗。
核心元素：冥婚/阴亲、纸人/纸扎、五行八卦、观落阴、赶尸人、养虫蛊。
氛围：阴森、压抑、诡异、凄美。
玩家角色：误入山村的民俗学者/寻找失踪亲人的普通人/意外闯入的游客。
特殊设定：
1. 场景中充满中式恐怖元素（红灯笼、绣花鞋、棺材、灵位）。
2. 谜题多与民俗传说、五行八卦有关。
3. 道具：罗盘、朱砂、符咒、糯米、黑驴蹄子等。";

const TOMB_SETTING: &str = "\
世界观参考《盗墓笔记》、《鬼吹灯》。
背景：深山古墓、秦岭神树、海底墓穴等。
核心元素：风水秘术（寻龙分金，看山定穴）、机关陷阱（流沙、翻板、毒箭、悬魂梯）、粽子/尸变、禁忌生物（尸蹩、九头蛇柏、人面鸟）。
玩家角色：摸金校尉/发丘中郎将/搬山道人/卸岭力士的后人。
特殊设定：
1. 需要利用风水知识和专业工具生存。
2. 描述要体现古墓的阴冷、幽闭和历史的厚重感。
3. 可能会有身怀绝技的队友。";

const RULE_HORROR_SETTING: &str = "\
世界观参考\"动物园规则怪谈\"、\"大洛山\"等。
背景：看似正常的场所（学校、医院、游乐园），但背后隐藏着不可名状的恐怖。
核心元素：规则纸条（可能包含被\"它\"篡改的谎言）、认知污染、心理压迫、不可名状的后果。
玩家角色：普通的访客/学生/员工。
特殊设定：
1. 必须遵守规则：违反规则通常意味着死亡或比死更可怕的结局。
2. 玩家需要从相互矛盾的规则中推断出真相，并在遵守规则的前提下找到逃离的方法。
3. 场景中可能包含线索物品（残破的日记、神秘的符号、上一个受害者的遗物）。
4. 在description中必须包含3-5条清晰的规则，格式如：【规则1】xxx【规则2】xxx";

const CYBERPUNK_NPCS: &str = "\
请设计有赛博朋克特色的原创NPC：义体改造者（描述其改造部位）、黑客/网络入侵者、企业特工、街头混混/赏金猎人。
为每个NPC设计独特的外号和外貌特征。";

const PATH_TO_NOWHERE_NPCS: &str = "\
请安排有特色的原创NPC登场，每个NPC都要有独特的外貌特征（伤疤、义肢、纹身、发色等）和有意味的绰号（如\"疯犬艾克\"、\"锈铁老六\"）。
优先使用：彼岸诊所成员（艾恩、安）、帕尔马组织的特工/研究员、辛迪加帮派、其他普/危/狂级禁闭者。
米诺斯局长仅在玩家生死关头时有5%概率出现救场。";

const FOLKLORE_NPCS: &str = "\
请设计符合中式民俗恐怖氛围的NPC：知晓秘密的村中老人、装扮诡异的戏班成员、悲伤或疯癫的失踪者亲人、懂得驱邪法术的道士/神婆。
每个NPC都要有鲜明的特征和诡异感。";

const TOMB_NPCS: &str = "\
请设计符合盗墓探险风格的NPC：各有绝活的摸金校尉、考古队成员、神秘的守墓人后裔、被困在墓中的探险者。
每个NPC都要有专业背景和独特技能。";

const RULE_HORROR_NPCS: &str = "\
请设计符合规则怪谈氛围的诡异存在：看似正常但行为诡异的\"人\"、已经疯了的其他受害者、知道部分规则的引路人、违反规则后出现的\"它\"。
NPC要有令人不安的细节描写（笑容僵硬、眼睛不会眨、影子方向不对等）。";

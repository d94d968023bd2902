//! Prompt construction for scenario generation and turn resolution.

use std::fmt::Write;

use super::chance::{Encounters, SinnerRank};
use super::schema::{ActionContext, HistoryEntry};
use super::theme::Theme;

pub const DEFAULT_DIFFICULTY: &str = "普通";

pub const SCENARIO_SYSTEM_PROMPT: &str = "你是一个富有创造力的游戏上帝，擅长描写极具画面感和沉浸感的文字。\
专门为游戏引擎输出有效的 JSON 数据。请始终使用中文回复。\
严禁包含 markdown 格式（如 ```json），仅输出纯 JSON 文本。确保所有字符串中的双引号都已正确转义。";

pub const ACTION_SYSTEM_PROMPT: &str = "你是一个专业的文字游戏剧本家，擅长创作氛围浓厚、逻辑严密的互动小说。\
你的文字风格冷峻、细腻，极具代入感。请始终使用中文回复。\
严禁包含 markdown 格式（如 ```json），仅输出纯 JSON 文本。确保所有字符串中的双引号都已正确转义。";

const JSON_ONLY: &str = "不要包含 JSON 以外的任何文本。确保内容是中文的。";

const TURN_PRINCIPLES: &str = "\
【核心设计原则】
1. 故事连贯性：每个场景都要与之前的剧情有逻辑联系，保持主线清晰，避免没有铺垫的突兀转折。
2. 真相探索：设计一条清晰的主线，逐步提供线索，每个选择都应推进剧情或揭示新信息。
3. 玩家友好：不要刻意为难玩家，避免陷阱选项；即使选择不够完美，也要给予继续的机会。
4. 选项设计：每个选项都是合理的行动，不同选项导向不同分支，至少有一个选项能推进主线。";

const NPC_FORMAT: &str = "\
如果有NPC出场或与玩家互动，请在JSON中返回npc_encounter数组，每个元素包含 name（名称）、\
title（称号/职位）、attitude（友好/中立/敌对/警惕）、description（一句话外貌特征）、dialogue（台词，可选）。";

const TURN_SHAPE: &str = r#"{
  "result_text": "简洁的结果描述（80-150字，直接承接玩家动作，注重逻辑衔接）",
  "new_options": ["选项1（推进主线）", "选项2（探索支线）", "选项3（谨慎行动）"],
  "game_over": false,
  "is_win": false,
  "inventory": ["物品1"],
  "hints": ["规则1", "规则2"],
  "status": "玩家状态",
  "npc_encounter": [
    {
      "name": "NPC名字",
      "title": "称号/身份",
      "attitude": "友好/中立/敌对/警惕",
      "description": "外貌特征描述",
      "dialogue": "NPC说的话（可选）"
    }
  ],
  "score": 0,
  "rank": "C",
  "comment": "评价"
}"#;

/// User prompt asking for an opening scene.
///
/// `rank` is only meaningful for [`Theme::PathToNowhere`]; the player's
/// sinner grade is written into both the setting and the expected output.
pub fn scenario_prompt(theme: &Theme, difficulty: &str, rank: Option<SinnerRank>) -> String {
    let difficulty = match difficulty.trim() {
        "" => DEFAULT_DIFFICULTY,
        d => d,
    };
    let mut out = String::with_capacity(2048);
    out.push_str("你是一个文字逃生游戏的上帝（Game Master）。\n请创建一个新的游戏场景。\n\n");
    out.push_str(&theme.setting());
    out.push('\n');
    if let (Theme::PathToNowhere, Some(rank)) = (theme, rank) {
        let label = rank.label();
        let _ = write!(
            out,
            "【玩家角色】\n你是一名刚刚觉醒的【{label}级禁闭者】。注意：玩家不是局长！\n\
             你拥有异能（根据等级{label}，能力强度不同），但使用过度会加深狂厄侵蚀。\n\
             玩家当前身份：{label}级禁闭者。\n"
        );
    }
    let _ = writeln!(out, "难度：{}\n", difficulty);

    out.push_str("请以 JSON 格式输出，结构如下：\n{\n");
    out.push_str("  \"title\": \"场景标题\",\n");
    out.push_str("  \"description\": \"房间或情境的开场描述（请使用生动的中文描述，极具沉浸感，符合上述世界观）\",\n");
    out.push_str("  \"initial_options\": [\"选项1\", \"选项2\", \"选项3\"]");
    if let Some(kit) = theme.starting_kit() {
        if let (Theme::PathToNowhere, Some(rank)) = (theme, rank) {
            let _ = write!(out, ",\n  \"player_rank\": {}", quote(rank.label()));
        }
        let _ = write!(out, ",\n  \"inventory\": {}", quote_list(kit.inventory));
        if !kit.hints.is_empty() {
            let _ = write!(out, ",\n  \"hints\": {}", quote_list(kit.hints));
        }
        let _ = write!(out, ",\n  \"status\": {}", quote(kit.status));
    }
    out.push_str("\n}\n");
    out.push_str(JSON_ONLY);
    out
}

/// User prompt asking the model to resolve `action` against the current state.
pub fn action_prompt(action: &str, ctx: &ActionContext, encounters: Encounters) -> String {
    let theme = Theme::from_id(&ctx.theme);
    let status = ctx.status.as_deref().unwrap_or("未知");
    let role = match ctx.player_rank.as_deref() {
        Some(rank) => format!("{}级禁闭者", rank),
        None => "普通人".to_string(),
    };
    let inventory = serde_json::to_string(&ctx.inventory).unwrap_or_else(|_| "[]".to_string());

    let mut out = String::with_capacity(4096);
    out.push_str("你是一个文字冒险游戏（AVG）的剧本生成引擎。\n\n");
    let _ = writeln!(
        out,
        "【当前游戏状态】\n场景标题：{}\n玩家当前状态：{}\n玩家角色：{}\n玩家背包：{}",
        ctx.title, status, role, inventory
    );
    if !ctx.hints.is_empty() {
        let _ = writeln!(out, "已知规则/线索：{}", ctx.hints.join(" "));
    }
    out.push('\n');
    let digest = history_digest(&ctx.history);
    if !digest.is_empty() {
        out.push_str(&digest);
        out.push('\n');
    }
    let _ = writeln!(out, "【玩家最新动作】\n{}\n", action.trim());
    out.push_str(TURN_PRINCIPLES);
    out.push_str("\n\n【任务目标】\n请判定这个动作的结果，并生成下一段剧情。\n\n");
    let _ = writeln!(
        out,
        "【写作要求】\n\
         1. 简洁精炼：result_text 控制在 80-150 字以内，使用短句，每句不超过30字，开头直接承接玩家动作的结果。\n\
         2. 上下文衔接：先说明动作的直接结果，再描述场景变化或新发现。\n\
         3. 沉浸感：使用第二人称（\"你...\"）。\n\
         4. 世界观：严格遵守{}世界观。\n\
         5. 难度平衡：挑战来自策略选择而不是猜谜，即使选择不佳也给予补救机会。\n\
         6. 评分系统：如果game_over为true，请给出score(0-100)、rank(S/A/B/C)和comment(评价)。\n",
        theme.world_label()
    );
    out.push_str(&encounter_section(&theme, encounters));
    out.push_str("\n请以 JSON 格式输出，结构如下：\n");
    out.push_str(TURN_SHAPE);
    out.push_str("\n注意：npc_encounter如果没有NPC出场就返回空数组[]。\n");
    out.push_str(JSON_ONLY);
    out
}

/// "Recent events" block built from the history the client sent.
pub fn history_digest(history: &[HistoryEntry]) -> String {
    if history.is_empty() {
        return String::new();
    }
    let lines: Vec<String> = history
        .iter()
        .map(|entry| match entry {
            HistoryEntry::Scenario { content } => format!("场景：{}", content.title),
            HistoryEntry::Action { action, result } => {
                format!("玩家：{}\n结果：{}", action, result.result_text)
            }
        })
        .collect();
    format!("近期发生的事情：\n{}\n", lines.join("\n"))
}

fn encounter_section(theme: &Theme, encounters: Encounters) -> String {
    let mut out = String::from("【本回合判定】\n");
    if *theme == Theme::RuleHorror {
        out.push_str(
            "- 规则违反判定：检查玩家的行动是否违反了已知规则。违反规则必须产生严重后果（遭遇\"它们\"、陷入危险、触发死亡结局）。\n\
             - 时刻提醒玩家规则的存在，描述中包含细微的诡异细节。\n\
             - 如果玩家发现了新的规则或线索，请在 hints 数组中返回更新后的所有规则（包括旧的和新的）。\n",
        );
    }
    if *theme == Theme::PathToNowhere {
        out.push_str(
            "- 狂厄值追踪：如果玩家过度使用异能，在status中提示\"狂厄侵蚀加深\"；接近临界点时描述中要有明显的狂厄症状。\n",
        );
    }
    if encounters.npc {
        let _ = writeln!(out, "- NPC遭遇已触发：{}", theme.npc_guidance());
        let _ = writeln!(out, "  {}", NPC_FORMAT);
    } else {
        out.push_str("- 本回合没有新的NPC登场，除非剧情中已有角色在场。没有NPC时返回 \"npc_encounter\": []。\n");
    }
    if encounters.item {
        let _ = writeln!(
            out,
            "- 道具获取已触发：{}把新道具加入 inventory。",
            theme.item_guidance()
        );
    }
    out
}

fn quote(s: &str) -> String {
    serde_json::Value::from(s).to_string()
}

fn quote_list(items: &[&str]) -> String {
    serde_json::Value::from(items.to_vec()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relay::schema::{Scenario, TurnOutcome};

    fn outcome(text: &str) -> TurnOutcome {
        TurnOutcome::from_model_json(&format!("{{\"result_text\": \"{}\"}}", text)).unwrap()
    }

    #[test]
    fn scenario_prompt_carries_rank_and_kit() {
        let p = scenario_prompt(&Theme::PathToNowhere, "", Some(SinnerRank::Hazard));
        assert!(p.contains("【危级禁闭者】"));
        assert!(p.contains("\"player_rank\": \"危\""));
        assert!(p.contains("\"inventory\": []"));
        assert!(p.contains("\"status\": \"正常\""));
        assert!(p.contains("难度：普通"));
    }

    #[test]
    fn every_kit_theme_gets_its_starting_items() {
        let p = scenario_prompt(&Theme::TombRaiding, "困难", None);
        assert!(p.contains("\"inventory\": [\"洛阳铲\",\"黑驴蹄子\",\"蜡烛\",\"糯米\"]"));
        assert!(p.contains("难度：困难"));
        assert!(!p.contains("player_rank"));

        let p = scenario_prompt(&Theme::RuleHorror, "普通", None);
        assert!(p.contains("\"hints\": [\"【规则1】"));
    }

    #[test]
    fn custom_theme_prompt_has_plain_shape() {
        let p = scenario_prompt(&Theme::from_id("太空站"), "普通", None);
        assert!(p.contains("主题：太空站"));
        assert!(!p.contains("\"inventory\""));
        assert!(p.ends_with(JSON_ONLY));
    }

    #[test]
    fn history_digest_formats_entries() {
        let history = vec![
            HistoryEntry::Scenario {
                content: Scenario {
                    title: "废弃医院".into(),
                    description: "d".into(),
                    initial_options: vec![],
                    inventory: vec![],
                    hints: vec![],
                    status: None,
                    player_rank: None,
                },
            },
            HistoryEntry::Action {
                action: "推门".into(),
                result: outcome("门吱呀一声开了。"),
            },
        ];
        assert_eq!(
            history_digest(&history),
            "近期发生的事情：\n场景：废弃医院\n玩家：推门\n结果：门吱呀一声开了。\n"
        );
        assert_eq!(history_digest(&[]), "");
    }

    #[test]
    fn action_prompt_reflects_state() {
        let ctx = ActionContext {
            title: "狄斯城".into(),
            theme: "path_to_nowhere".into(),
            inventory: vec!["门禁卡".into()],
            player_rank: Some("狂".into()),
            ..Default::default()
        };
        let p = action_prompt("  使用 门禁卡 ", &ctx, Encounters::default());
        assert!(p.contains("场景标题：狄斯城"));
        assert!(p.contains("玩家当前状态：未知"));
        assert!(p.contains("玩家角色：狂级禁闭者"));
        assert!(p.contains("玩家背包：[\"门禁卡\"]"));
        assert!(p.contains("【玩家最新动作】\n使用 门禁卡\n"));
        assert!(p.contains("严格遵守《无期迷途》世界观"));
        assert!(p.contains("狂厄值追踪"));
    }

    #[test]
    fn encounters_only_appear_when_rolled() {
        let ctx = ActionContext {
            theme: "chinese_folklore".into(),
            ..Default::default()
        };
        let quiet = action_prompt("看看四周", &ctx, Encounters::default());
        assert!(!quiet.contains("NPC遭遇已触发"));
        assert!(!quiet.contains("道具获取已触发"));
        assert!(quiet.contains("玩家角色：普通人"));

        let busy = action_prompt("看看四周", &ctx, Encounters { npc: true, item: true });
        assert!(busy.contains("NPC遭遇已触发"));
        assert!(busy.contains("村中老人"));
        assert!(busy.contains("道具获取已触发"));
    }

    #[test]
    fn rule_horror_always_checks_rules() {
        let ctx = ActionContext {
            theme: "rule_horror".into(),
            hints: vec!["【规则1】不要回头".into()],
            ..Default::default()
        };
        let p = action_prompt("回头", &ctx, Encounters::default());
        assert!(p.contains("规则违反判定"));
        assert!(p.contains("已知规则/线索：【规则1】不要回头"));
        assert!(p.contains("规则怪谈（违反规则必死）"));
    }
}

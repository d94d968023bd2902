//! Client-side game state.
//!
//! [`GameState`] is a plain value; the only way to change it is
//! [`GameState::apply`] with a [`GameEvent`]. The shell feeds it relay
//! responses, the countdown and player input, then renders what comes out.

pub mod countdown;

use crate::relay::schema::{
    ActionContext, HistoryEntry, NpcEncounter, Rank, Scenario, TurnOutcome,
};
use crate::relay::theme::Theme;

pub const WELCOME_TITLE: &str = "开启逃生";
pub const WELCOME_TEXT: &str = "欢迎来到 AI 生成的逃生密室。请选择主题并开始游戏。";
pub const DEFAULT_STATUS: &str = "正常";
pub const START_FAILED_TEXT: &str = "启动游戏失败。请检查后端连接。";
pub const ACTION_FAILED_TEXT: &str = "处理动作失败。";
pub const TIME_UP_TEXT: &str = "时间到！你没能逃脱...";
pub const DEFAULT_HISTORY_WINDOW: usize = 5;

/// Grade handed out when the game ends on a model turn.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FinalScore {
    pub score: Option<u32>,
    pub rank: Option<Rank>,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GameState {
    pub theme: Theme,
    pub started: bool,
    pub loading: bool,
    pub title: String,
    pub description: String,
    pub options: Vec<String>,
    pub result_text: String,
    pub game_over: bool,
    pub is_win: bool,
    pub history: Vec<HistoryEntry>,
    pub inventory: Vec<String>,
    pub hints: Vec<String>,
    pub status: String,
    pub player_rank: Option<String>,
    pub npcs: Vec<NpcEncounter>,
    pub final_score: Option<FinalScore>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    ScenarioRequested,
    ScenarioStarted(Scenario),
    ScenarioFailed,
    ActionSubmitted(String),
    TurnResolved { action: String, outcome: TurnOutcome },
    ActionFailed,
    TimeExpired,
    Reset,
}

impl Default for GameState {
    fn default() -> Self {
        Self::new(Theme::CyberpunkNovel)
    }
}

impl GameState {
    pub fn new(theme: Theme) -> Self {
        Self {
            theme,
            started: false,
            loading: false,
            title: WELCOME_TITLE.to_string(),
            description: WELCOME_TEXT.to_string(),
            options: Vec::new(),
            result_text: String::new(),
            game_over: false,
            is_win: false,
            history: Vec::new(),
            inventory: Vec::new(),
            hints: Vec::new(),
            status: DEFAULT_STATUS.to_string(),
            player_rank: None,
            npcs: Vec::new(),
            final_score: None,
        }
    }

    pub fn apply(mut self, event: GameEvent) -> GameState {
        if self.game_over && event != GameEvent::Reset {
            return self;
        }
        match event {
            GameEvent::ScenarioRequested => {
                self.loading = true;
            }
            GameEvent::ScenarioStarted(scenario) => {
                self.started = true;
                self.loading = false;
                self.title = scenario.title.clone();
                self.description = scenario.description.clone();
                self.options = scenario.initial_options.clone();
                self.result_text.clear();
                self.inventory = scenario.inventory.clone();
                self.hints = scenario.hints.clone();
                self.status = scenario
                    .status
                    .clone()
                    .unwrap_or_else(|| DEFAULT_STATUS.to_string());
                self.player_rank = scenario.player_rank.clone();
                self.npcs.clear();
                self.final_score = None;
                self.history = vec![HistoryEntry::Scenario { content: scenario }];
            }
            GameEvent::ScenarioFailed => {
                self.loading = false;
                self.result_text = START_FAILED_TEXT.to_string();
            }
            GameEvent::ActionSubmitted(_) => {
                if self.started {
                    self.loading = true;
                }
            }
            GameEvent::TurnResolved { action, outcome } => {
                if !self.started {
                    return self;
                }
                self.loading = false;
                self.result_text = outcome.result_text.clone();
                self.options = outcome.new_options.clone();
                self.game_over = outcome.game_over;
                self.is_win = outcome.is_win;
                if let Some(inventory) = &outcome.inventory {
                    self.inventory = inventory.clone();
                }
                if let Some(hints) = &outcome.hints {
                    self.hints = hints.clone();
                }
                if let Some(status) = &outcome.status {
                    self.status = status.clone();
                }
                self.npcs = outcome.npc_encounter.clone();
                if outcome.game_over {
                    self.final_score = Some(FinalScore {
                        score: outcome.score,
                        rank: outcome.rank,
                        comment: outcome.comment.clone(),
                    });
                }
                self.history.push(HistoryEntry::Action {
                    action,
                    result: outcome,
                });
            }
            GameEvent::ActionFailed => {
                self.loading = false;
                self.result_text = ACTION_FAILED_TEXT.to_string();
            }
            GameEvent::TimeExpired => {
                if self.started {
                    self.loading = false;
                    self.game_over = true;
                    self.is_win = false;
                    self.options.clear();
                    self.result_text = TIME_UP_TEXT.to_string();
                }
            }
            GameEvent::Reset => return GameState::new(self.theme),
        }
        self
    }

    /// Text to reveal for the current turn.
    pub fn narrative(&self) -> &str {
        if self.result_text.is_empty() {
            &self.description
        } else {
            &self.result_text
        }
    }

    /// Context sent with the next action; carries the last `window` history entries.
    pub fn action_context(&self, window: usize) -> ActionContext {
        let skip = self.history.len().saturating_sub(window);
        ActionContext {
            title: self.title.clone(),
            description: self.description.clone(),
            last_result: self.result_text.clone(),
            theme: self.theme.id().to_string(),
            inventory: self.inventory.clone(),
            hints: self.hints.clone(),
            status: Some(self.status.clone()),
            player_rank: self.player_rank.clone(),
            history: self.history[skip..].to_vec(),
        }
    }

    pub fn can_act(&self) -> bool {
        self.started && !self.loading && !self.game_over
    }
}

pub fn use_item_action(item: &str) -> String {
    format!("使用 {}", item)
}

/// What a line typed at the prompt means.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Empty,
    Quit,
    Action(String),
    Invalid(String),
}

/// Resolve a prompt line: an option number, `u <n>` for an inventory item,
/// `q` to quit, or free text taken as a custom action.
pub fn resolve_input(line: &str, state: &GameState) -> Input {
    let line = line.trim();
    if line.is_empty() {
        return Input::Empty;
    }
    if matches!(line, "q" | "quit" | "exit" | "退出") {
        return Input::Quit;
    }
    if let Ok(n) = line.parse::<usize>() {
        return match n.checked_sub(1).and_then(|i| state.options.get(i)) {
            Some(option) => Input::Action(option.clone()),
            None => Input::Invalid(format!("没有选项 {}", n)),
        };
    }
    if let Some(rest) = line.strip_prefix("u ") {
        return match rest.trim().parse::<usize>() {
            Ok(n) => match n.checked_sub(1).and_then(|i| state.inventory.get(i)) {
                Some(item) => Input::Action(use_item_action(item)),
                None => Input::Invalid(format!("背包里没有第 {} 件物品", n)),
            },
            Err(_) => Input::Invalid("用法：u <物品编号>".to_string()),
        };
    }
    Input::Action(line.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario() -> Scenario {
        Scenario {
            title: "古墓".into(),
            description: "墓道很黑。".into(),
            initial_options: vec!["点蜡烛".into(), "往前走".into()],
            inventory: vec!["洛阳铲".into(), "蜡烛".into()],
            hints: vec![],
            status: None,
            player_rank: None,
        }
    }

    fn outcome(json: &str) -> TurnOutcome {
        TurnOutcome::from_model_json(json).unwrap()
    }

    fn started() -> GameState {
        GameState::new(Theme::TombRaiding)
            .apply(GameEvent::ScenarioRequested)
            .apply(GameEvent::ScenarioStarted(scenario()))
    }

    #[test]
    fn fresh_state_shows_welcome() {
        let s = GameState::default();
        assert!(!s.started);
        assert_eq!(s.title, WELCOME_TITLE);
        assert_eq!(s.narrative(), WELCOME_TEXT);
        assert_eq!(s.status, "正常");
    }

    #[test]
    fn scenario_start_populates_state() {
        let s = started();
        assert!(s.started && !s.loading);
        assert_eq!(s.options.len(), 2);
        assert_eq!(s.status, DEFAULT_STATUS);
        assert_eq!(s.narrative(), "墓道很黑。");
        assert_eq!(s.history.len(), 1);
    }

    #[test]
    fn turn_keeps_omitted_fields() {
        let s = started()
            .apply(GameEvent::ActionSubmitted("点蜡烛".into()))
            .apply(GameEvent::TurnResolved {
                action: "点蜡烛".into(),
                outcome: outcome(r#"{"result_text": "火光摇曳。", "new_options": ["看墙"]}"#),
            });
        assert_eq!(s.inventory, vec!["洛阳铲", "蜡烛"]);
        assert_eq!(s.status, DEFAULT_STATUS);
        assert_eq!(s.narrative(), "火光摇曳。");
        assert_eq!(s.options, vec!["看墙"]);
        assert!(matches!(&s.history[1], HistoryEntry::Action { action, .. } if action == "点蜡烛"));

        let s = s.apply(GameEvent::TurnResolved {
            action: "使用 蜡烛".into(),
            outcome: outcome(r#"{"result_text": "烧完了。", "inventory": ["洛阳铲"], "status": "受伤"}"#),
        });
        assert_eq!(s.inventory, vec!["洛阳铲"]);
        assert_eq!(s.status, "受伤");
    }

    #[test]
    fn failures_set_generic_text() {
        let s = GameState::default()
            .apply(GameEvent::ScenarioRequested)
            .apply(GameEvent::ScenarioFailed);
        assert!(!s.loading);
        assert_eq!(s.narrative(), START_FAILED_TEXT);

        let s = started()
            .apply(GameEvent::ActionSubmitted("x".into()))
            .apply(GameEvent::ActionFailed);
        assert_eq!(s.result_text, ACTION_FAILED_TEXT);
        assert!(s.can_act());
    }

    #[test]
    fn game_over_freezes_until_reset() {
        let s = started().apply(GameEvent::TurnResolved {
            action: "逃".into(),
            outcome: outcome(
                r#"{"result_text": "你逃出了古墓。", "game_over": true, "is_win": true,
                    "score": 88, "rank": "A", "comment": "干净利落"}"#,
            ),
        });
        assert!(s.game_over && s.is_win);
        assert_eq!(
            s.final_score,
            Some(FinalScore {
                score: Some(88),
                rank: Some(Rank::A),
                comment: Some("干净利落".into())
            })
        );

        let frozen = s.clone().apply(GameEvent::TimeExpired);
        assert_eq!(frozen, s);
        let frozen = s.clone().apply(GameEvent::ActionFailed);
        assert_eq!(frozen, s);

        let reset = s.apply(GameEvent::Reset);
        assert!(!reset.started);
        assert_eq!(reset.theme, Theme::TombRaiding);
        assert_eq!(reset.title, WELCOME_TITLE);
    }

    #[test]
    fn time_expiry_ends_a_running_game() {
        let s = started().apply(GameEvent::TimeExpired);
        assert!(s.game_over && !s.is_win);
        assert!(s.options.is_empty());
        assert_eq!(s.narrative(), TIME_UP_TEXT);

        let idle = GameState::default().apply(GameEvent::TimeExpired);
        assert!(!idle.game_over);
    }

    #[test]
    fn context_window_keeps_latest_entries() {
        let mut s = started();
        for i in 0..7 {
            s = s.apply(GameEvent::TurnResolved {
                action: format!("动作{}", i),
                outcome: outcome(&format!(r#"{{"result_text": "结果{}"}}"#, i)),
            });
        }
        assert_eq!(s.history.len(), 8);
        let ctx = s.action_context(DEFAULT_HISTORY_WINDOW);
        assert_eq!(ctx.history.len(), 5);
        assert!(matches!(&ctx.history[0], HistoryEntry::Action { action, .. } if action == "动作2"));
        assert_eq!(ctx.theme, "tomb_raiding");
        assert_eq!(ctx.last_result, "结果6");
        assert_eq!(ctx.status.as_deref(), Some("正常"));
    }

    #[test]
    fn input_resolution() {
        let s = started();
        assert_eq!(resolve_input("   ", &s), Input::Empty);
        assert_eq!(resolve_input("q", &s), Input::Quit);
        assert_eq!(resolve_input("2", &s), Input::Action("往前走".into()));
        assert!(matches!(resolve_input("9", &s), Input::Invalid(_)));
        assert!(matches!(resolve_input("0", &s), Input::Invalid(_)));
        assert_eq!(resolve_input("u 2", &s), Input::Action("使用 蜡烛".into()));
        assert!(matches!(resolve_input("u x", &s), Input::Invalid(_)));
        assert_eq!(resolve_input(" 摸摸墙壁 ", &s), Input::Action("摸摸墙壁".into()));
    }
}

//! Scenario and action relay.
//!
//! The relay turns a client request into a prompt, sends it to the hosted
//! model, salvages the JSON object from the free-form reply and validates it
//! before anything is handed back to the client. Random branches (sinner
//! rank, encounter gates) are rolled up front into a plan so no RNG is held
//! across the model call.

pub mod chance;
pub mod client;
pub mod extract;
pub mod prompt;
pub mod schema;
pub mod theme;

use std::sync::Arc;

use log::{debug, info, warn};
use rand::Rng;
use thiserror::Error;

use crate::logutil::{log_preview, DEFAULT_PREVIEW_CHARS};
use chance::{roll_sinner_rank, Encounters, SinnerRank};
use client::{ModelClient, ModelError, ModelRequest};
use extract::extract_json;
use schema::{ActionContext, ActionRequest, Scenario, ScenarioRequest, SchemaError, TurnOutcome};
use theme::Theme;

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Missing API Key")]
    MissingApiKey,

    #[error("action must not be empty")]
    EmptyAction,

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("model returned an invalid scenario: {source}")]
    InvalidScenario {
        #[source]
        source: SchemaError,
        raw: String,
    },

    #[error("model returned an invalid turn: {source}")]
    InvalidOutcome {
        #[source]
        source: SchemaError,
        raw: String,
    },
}

/// Everything random about a scenario request, decided before the model call.
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioPlan {
    pub theme: Theme,
    pub difficulty: String,
    pub rank: Option<SinnerRank>,
}

impl ScenarioPlan {
    pub fn roll<R: Rng + ?Sized>(request: &ScenarioRequest, rng: &mut R) -> Self {
        let theme = Theme::from_id(request.theme.as_deref().unwrap_or_default());
        let rank = (theme == Theme::PathToNowhere).then(|| roll_sinner_rank(rng));
        let difficulty = request
            .difficulty
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .unwrap_or(prompt::DEFAULT_DIFFICULTY)
            .to_string();
        Self {
            theme,
            difficulty,
            rank,
        }
    }
}

/// A validated action with its encounter gates rolled.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionPlan {
    pub action: String,
    pub context: ActionContext,
    pub encounters: Encounters,
}

impl ActionPlan {
    pub fn roll<R: Rng + ?Sized>(request: ActionRequest, rng: &mut R) -> Result<Self, RelayError> {
        let action = request.action.trim().to_string();
        if action.is_empty() {
            return Err(RelayError::EmptyAction);
        }
        let encounters = Theme::from_id(&request.current_context.theme)
            .encounter_odds()
            .roll(rng);
        Ok(Self {
            action,
            context: request.current_context,
            encounters,
        })
    }
}

pub struct Relay {
    model: Arc<dyn ModelClient>,
}

impl Relay {
    pub fn new(model: Arc<dyn ModelClient>) -> Self {
        Self { model }
    }

    pub fn is_configured(&self) -> bool {
        self.model.is_configured()
    }

    pub async fn generate_scenario(&self, request: ScenarioRequest) -> Result<Scenario, RelayError> {
        let plan = ScenarioPlan::roll(&request, &mut rand::thread_rng());
        self.run_scenario(plan).await
    }

    pub async fn run_scenario(&self, plan: ScenarioPlan) -> Result<Scenario, RelayError> {
        self.ensure_configured()?;
        info!(
            "generating scenario theme={} difficulty={} rank={}",
            plan.theme,
            plan.difficulty,
            plan.rank.map(SinnerRank::label).unwrap_or("-")
        );
        let raw = self
            .model
            .complete(ModelRequest {
                system: prompt::SCENARIO_SYSTEM_PROMPT.to_string(),
                prompt: prompt::scenario_prompt(&plan.theme, &plan.difficulty, plan.rank),
            })
            .await?;
        debug!("scenario reply: {}", log_preview(&raw, DEFAULT_PREVIEW_CHARS));

        match Scenario::from_model_json(extract_json(&raw)) {
            Ok(scenario) => Ok(finish_scenario(&plan, scenario)),
            Err(source) => {
                warn!("rejecting scenario reply: {}: {}", source, log_preview(&raw, DEFAULT_PREVIEW_CHARS));
                Err(RelayError::InvalidScenario { source, raw })
            }
        }
    }

    pub async fn submit_action(&self, request: ActionRequest) -> Result<TurnOutcome, RelayError> {
        self.ensure_configured()?;
        let plan = ActionPlan::roll(request, &mut rand::thread_rng())?;
        self.run_action(plan).await
    }

    pub async fn run_action(&self, plan: ActionPlan) -> Result<TurnOutcome, RelayError> {
        self.ensure_configured()?;
        info!(
            "resolving action theme={} npc={} item={} history={}",
            plan.context.theme,
            plan.encounters.npc,
            plan.encounters.item,
            plan.context.history.len()
        );
        let raw = self
            .model
            .complete(ModelRequest {
                system: prompt::ACTION_SYSTEM_PROMPT.to_string(),
                prompt: prompt::action_prompt(&plan.action, &plan.context, plan.encounters),
            })
            .await?;
        debug!("turn reply: {}", log_preview(&raw, DEFAULT_PREVIEW_CHARS));

        TurnOutcome::from_model_json(extract_json(&raw)).map_err(|source| {
            warn!("rejecting turn reply: {}: {}", source, log_preview(&raw, DEFAULT_PREVIEW_CHARS));
            RelayError::InvalidOutcome { source, raw }
        })
    }

    fn ensure_configured(&self) -> Result<(), RelayError> {
        if self.model.is_configured() {
            Ok(())
        } else {
            Err(RelayError::MissingApiKey)
        }
    }
}

/// Fill in what the model left out from the plan and the theme's starting kit.
fn finish_scenario(plan: &ScenarioPlan, mut scenario: Scenario) -> Scenario {
    if let (Theme::PathToNowhere, Some(rank)) = (&plan.theme, plan.rank) {
        if scenario.player_rank.is_none() {
            scenario.player_rank = Some(rank.label().to_string());
            scenario.inventory.clear();
            scenario.status = Some("正常".to_string());
        }
        return scenario;
    }
    if let Some(kit) = plan.theme.starting_kit() {
        if scenario.inventory.is_empty() {
            scenario.inventory = kit.inventory.iter().map(|s| s.to_string()).collect();
        }
        if scenario.hints.is_empty() {
            scenario.hints = kit.hints.iter().map(|s| s.to_string()).collect();
        }
        if scenario.status.is_none() {
            scenario.status = Some(kit.status.to_string());
        }
    }
    scenario
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use rand::rngs::mock::StepRng;
    use std::sync::Mutex;

    struct ScriptedModel {
        configured: bool,
        replies: Mutex<Vec<Result<String, ModelError>>>,
        seen: Mutex<Vec<ModelRequest>>,
    }

    impl ScriptedModel {
        fn replying(replies: Vec<&str>) -> Arc<Self> {
            Arc::new(Self {
                configured: true,
                replies: Mutex::new(replies.into_iter().rev().map(|r| Ok(r.to_string())).collect()),
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl ModelClient for ScriptedModel {
        async fn complete(&self, request: ModelRequest) -> Result<String, ModelError> {
            self.seen.lock().unwrap().push(request);
            self.replies
                .lock()
                .unwrap()
                .pop()
                .unwrap_or(Err(ModelError::EmptyReply))
        }

        fn is_configured(&self) -> bool {
            self.configured
        }
    }

    fn fixed(p: f64) -> StepRng {
        StepRng::new(((p * (1u64 << 53) as f64).ceil() as u64) << 11, 0)
    }

    fn scenario_request(theme: &str) -> ScenarioRequest {
        ScenarioRequest {
            theme: Some(theme.to_string()),
            difficulty: None,
        }
    }

    #[tokio::test]
    async fn missing_key_short_circuits_before_model_call() {
        let model = Arc::new(ScriptedModel {
            configured: false,
            replies: Mutex::new(Vec::new()),
            seen: Mutex::new(Vec::new()),
        });
        let relay = Relay::new(model.clone());
        let err = relay.generate_scenario(scenario_request("tomb_raiding")).await.unwrap_err();
        assert!(matches!(err, RelayError::MissingApiKey));
        assert!(model.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn path_to_nowhere_gets_rolled_rank_when_model_omits_it() {
        let model = ScriptedModel::replying(vec![
            "当然！\n{\"title\": \"辛迪加暗巷\", \"description\": \"雨。\", \"inventory\": [\"刀\"]}",
        ]);
        let relay = Relay::new(model.clone());
        let plan = ScenarioPlan::roll(&scenario_request("path_to_nowhere"), &mut fixed(0.05));
        assert_eq!(plan.rank, Some(SinnerRank::Mania));
        assert_eq!(plan.difficulty, "普通");

        let scenario = relay.run_scenario(plan).await.unwrap();
        assert_eq!(scenario.player_rank.as_deref(), Some("狂"));
        assert!(scenario.inventory.is_empty());
        assert_eq!(scenario.status.as_deref(), Some("正常"));

        let seen = model.seen.lock().unwrap();
        assert_eq!(seen[0].system, prompt::SCENARIO_SYSTEM_PROMPT);
        assert!(seen[0].prompt.contains("【狂级禁闭者】"));
    }

    #[tokio::test]
    async fn kit_fills_missing_inventory_and_status() {
        let model = ScriptedModel::replying(vec!["{\"title\": \"t\", \"description\": \"d\"}"]);
        let relay = Relay::new(model);
        let scenario = relay.generate_scenario(scenario_request("rule_horror")).await.unwrap();
        assert_eq!(scenario.inventory, vec!["手机（电量47%）", "钥匙"]);
        assert_eq!(scenario.hints.len(), 3);
        assert_eq!(scenario.status.as_deref(), Some("心跳加速"));
    }

    #[tokio::test]
    async fn invalid_scenario_keeps_raw_reply() {
        let model = ScriptedModel::replying(vec!["抱歉，我无法生成。"]);
        let relay = Relay::new(model);
        match relay.generate_scenario(ScenarioRequest::default()).await {
            Err(RelayError::InvalidScenario { raw, .. }) => assert_eq!(raw, "抱歉，我无法生成。"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[tokio::test]
    async fn blank_action_is_rejected() {
        let model = ScriptedModel::replying(vec![]);
        let relay = Relay::new(model.clone());
        let err = relay
            .submit_action(ActionRequest {
                action: "   ".into(),
                current_context: ActionContext::default(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::EmptyAction));
        assert!(model.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_key_is_reported_before_blank_action() {
        let model = Arc::new(ScriptedModel {
            configured: false,
            replies: Mutex::new(Vec::new()),
            seen: Mutex::new(Vec::new()),
        });
        let relay = Relay::new(model);
        let err = relay
            .submit_action(ActionRequest {
                action: String::new(),
                current_context: ActionContext::default(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::MissingApiKey));
    }

    #[tokio::test]
    async fn action_reply_is_validated() {
        let model = ScriptedModel::replying(vec![
            "```json\n{\"result_text\": \"你推开了门。\", \"new_options\": [\"进去\"], \"score\": 150}\n```",
            "{\"new_options\": []}",
        ]);
        let relay = Relay::new(model.clone());
        let request = ActionRequest {
            action: "推门".into(),
            current_context: ActionContext {
                theme: "tomb_raiding".into(),
                ..Default::default()
            },
        };
        let outcome = relay.submit_action(request.clone()).await.unwrap();
        assert_eq!(outcome.result_text, "你推开了门。");
        assert_eq!(outcome.score, Some(100));

        let err = relay.submit_action(request).await.unwrap_err();
        assert!(matches!(
            err,
            RelayError::InvalidOutcome {
                source: SchemaError::MissingField("result_text"),
                ..
            }
        ));
        assert_eq!(model.seen.lock().unwrap()[0].system, prompt::ACTION_SYSTEM_PROMPT);
    }

    #[test]
    fn custom_theme_never_rolls_encounters() {
        let plan = ActionPlan::roll(
            ActionRequest {
                action: "走".into(),
                current_context: ActionContext {
                    theme: "太空站".into(),
                    ..Default::default()
                },
            },
            &mut StepRng::new(0, 0),
        )
        .unwrap();
        assert_eq!(plan.encounters, Encounters::default());
    }
}

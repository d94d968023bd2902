//! Typed payloads exchanged with the model and the client.
//!
//! Model replies are untrusted: [`Scenario::from_model_json`] and
//! [`TurnOutcome::from_model_json`] walk the decoded JSON value, enforce the
//! required fields and coerce the optional ones (trimmed strings, blank list
//! entries dropped, score clamped, rank restricted to S/A/B/C). The derived
//! serde impls are used for the relay ↔ client hop, where data has already
//! been validated once.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("expected a JSON object")]
    NotAnObject,

    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    #[error("field `{field}` must be {expected}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
    },
}

/// Opening scene of a game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub initial_options: Vec<String>,
    #[serde(default)]
    pub inventory: Vec<String>,
    #[serde(default)]
    pub hints: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player_rank: Option<String>,
}

impl Scenario {
    pub fn from_model_json(json: &str) -> Result<Self, SchemaError> {
        let value: Value = serde_json::from_str(json)?;
        let obj = value.as_object().ok_or(SchemaError::NotAnObject)?;
        Ok(Self {
            title: required_string(obj, "title")?,
            description: required_string(obj, "description")?,
            initial_options: string_list(obj, "initial_options")?.unwrap_or_default(),
            inventory: string_list(obj, "inventory")?.unwrap_or_default(),
            hints: string_list(obj, "hints")?.unwrap_or_default(),
            status: optional_string(obj, "status")?,
            player_rank: optional_string(obj, "player_rank")?,
        })
    }
}

/// Final grade handed out at game over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rank {
    S,
    A,
    B,
    C,
}

impl Rank {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "S" => Some(Rank::S),
            "A" => Some(Rank::A),
            "B" => Some(Rank::B),
            "C" => Some(Rank::C),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Rank::S => "S",
            Rank::A => "A",
            Rank::B => "B",
            Rank::C => "C",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NpcEncounter {
    pub name: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub attitude: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dialogue: Option<String>,
}

impl NpcEncounter {
    fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let text = |key: &str| {
            obj.get(key)
                .and_then(Value::as_str)
                .map(str::trim)
                .unwrap_or_default()
                .to_string()
        };
        let name = text("name");
        if name.is_empty() {
            return None;
        }
        let dialogue = text("dialogue");
        Some(Self {
            name,
            title: text("title"),
            attitude: text("attitude"),
            description: text("description"),
            dialogue: (!dialogue.is_empty()).then_some(dialogue),
        })
    }
}

/// Result of one player action.
///
/// `inventory`, `hints` and `status` are `None` when the model left them out;
/// callers keep the previous values in that case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnOutcome {
    pub result_text: String,
    #[serde(default)]
    pub new_options: Vec<String>,
    #[serde(default)]
    pub game_over: bool,
    #[serde(default)]
    pub is_win: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inventory: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hints: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default)]
    pub npc_encounter: Vec<NpcEncounter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank: Option<Rank>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl TurnOutcome {
    pub fn from_model_json(json: &str) -> Result<Self, SchemaError> {
        let value: Value = serde_json::from_str(json)?;
        let obj = value.as_object().ok_or(SchemaError::NotAnObject)?;
        let npc_encounter = match obj.get("npc_encounter") {
            Some(Value::Array(items)) => items.iter().filter_map(NpcEncounter::from_value).collect(),
            Some(single @ Value::Object(_)) => NpcEncounter::from_value(single).into_iter().collect(),
            _ => Vec::new(),
        };
        Ok(Self {
            result_text: required_string(obj, "result_text")?,
            new_options: string_list(obj, "new_options")?.unwrap_or_default(),
            game_over: flag(obj, "game_over"),
            is_win: flag(obj, "is_win"),
            inventory: string_list(obj, "inventory")?,
            hints: string_list(obj, "hints")?,
            status: optional_string(obj, "status")?,
            npc_encounter,
            score: score(obj),
            rank: obj.get("rank").and_then(Value::as_str).and_then(Rank::parse),
            comment: optional_string(obj, "comment")?,
        })
    }
}

/// One remembered step, echoed back to the relay as context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HistoryEntry {
    Scenario { content: Scenario },
    Action { action: String, result: TurnOutcome },
}

/// Client-side game state sent along with an action.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionContext {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub last_result: String,
    #[serde(default)]
    pub theme: String,
    #[serde(default)]
    pub inventory: Vec<String>,
    #[serde(default)]
    pub hints: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(
        default,
        rename = "playerRank",
        alias = "player_rank",
        skip_serializing_if = "Option::is_none"
    )]
    pub player_rank: Option<String>,
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScenarioRequest {
    #[serde(default)]
    pub theme: Option<String>,
    #[serde(default)]
    pub difficulty: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRequest {
    #[serde(default)]
    pub action: String,
    #[serde(default, rename = "currentContext", alias = "current_context")]
    pub current_context: ActionContext,
}

fn required_string(obj: &Map<String, Value>, field: &'static str) -> Result<String, SchemaError> {
    optional_string(obj, field)?.ok_or(SchemaError::MissingField(field))
}

/// Trimmed string; blank or null counts as absent.
fn optional_string(
    obj: &Map<String, Value>,
    field: &'static str,
) -> Result<Option<String>, SchemaError> {
    match obj.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => {
            let s = s.trim();
            Ok((!s.is_empty()).then(|| s.to_string()))
        }
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(_) => Err(SchemaError::WrongType {
            field,
            expected: "a string",
        }),
    }
}

/// List of trimmed, non-blank strings. A lone string is treated as a
/// one-element list; numbers are stringified.
fn string_list(
    obj: &Map<String, Value>,
    field: &'static str,
) -> Result<Option<Vec<String>>, SchemaError> {
    let items = match obj.get(field) {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Array(items)) => items.iter().collect::<Vec<_>>(),
        Some(single @ Value::String(_)) => vec![single],
        Some(_) => {
            return Err(SchemaError::WrongType {
                field,
                expected: "a list of strings",
            })
        }
    };
    let mut out = Vec::with_capacity(items.len());
    for item in items {
        let text = match item {
            Value::String(s) => s.trim().to_string(),
            Value::Number(n) => n.to_string(),
            Value::Null => continue,
            _ => {
                return Err(SchemaError::WrongType {
                    field,
                    expected: "a list of strings",
                })
            }
        };
        if !text.is_empty() {
            out.push(text);
        }
    }
    Ok(Some(out))
}

fn flag(obj: &Map<String, Value>, field: &str) -> bool {
    match obj.get(field) {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s.trim().eq_ignore_ascii_case("true"),
        _ => false,
    }
}

fn score(obj: &Map<String, Value>) -> Option<u32> {
    let raw = match obj.get("score")? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if raw.is_nan() {
        return None;
    }
    Some(raw.clamp(0.0, 100.0).round() as u32)
}

// crates/types/src/api.rs
//! Request/response bodies for the session-management HTTP API.
//!
//! These are plain request/response collaborators of the sync layer. No
//! retry semantics live here.

use serde::{Deserialize, Serialize};

use crate::params::ToneModifier;
use crate::protocol::PlayerRole;

/// Which negotiation family to launch. Only bargaining is fully modeled
/// client-side today; the others pass through to the engine untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameFamily {
    Bargaining,
    Negotiation,
    Persuasion,
}

/// Body of `POST /api/games`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSessionRequest {
    pub game_family: GameFamily,
    pub player_role: PlayerRole,
    pub money_to_divide: i64,
    pub max_rounds: u32,
    pub delta_1: f64,
    pub delta_2: f64,
    pub complete_information: bool,
    pub messages_allowed: bool,
}

impl Default for CreateSessionRequest {
    fn default() -> Self {
        Self {
            game_family: GameFamily::Bargaining,
            player_role: PlayerRole::Alice,
            money_to_divide: 10_000,
            max_rounds: 12,
            delta_1: 0.95,
            delta_2: 0.95,
            complete_information: true,
            messages_allowed: true,
        }
    }
}

/// Response to session creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionCreated {
    pub session_id: String,
    pub game_family: String,
    pub player_role: String,
    pub status: String,
}

/// One row of `GET /api/games`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: String,
    pub game_family: String,
    pub player_role: String,
    pub status: String,
    #[serde(default)]
    pub created_at: String,
}

/// Full record of one session from `GET /api/games/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionDetail {
    pub session_id: String,
    pub game_family: String,
    pub player_role: String,
    pub status: String,
    #[serde(default)]
    pub game_args: serde_json::Value,
    #[serde(default)]
    pub delta_1: f64,
    #[serde(default)]
    pub delta_2: f64,
}

/// What kind of suggestion to ask the assistant for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestType {
    Split,
    Message,
}

/// Body of `POST /api/games/{id}/ai-suggest`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestRequest {
    pub suggest_type: SuggestType,
    #[serde(default)]
    pub tone_modifiers: Vec<ToneModifier>,
    #[serde(default)]
    pub current_message: String,
}

/// A suggested split, keyed by party.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestedSplit {
    pub alice: f64,
    pub bob: f64,
}

/// Response to a suggestion request. Exactly one of the two fields is set,
/// matching the requested `suggest_type`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SuggestResponse {
    #[serde(default)]
    pub suggested_split: Option<SuggestedSplit>,
    #[serde(default)]
    pub suggested_message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_request_serializes_snake_case_fields() {
        let req = CreateSessionRequest::default();
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["game_family"], "bargaining");
        assert_eq!(json["player_role"], "alice");
        assert_eq!(json["money_to_divide"], 10_000);
    }

    #[test]
    fn suggest_response_decodes_either_arm() {
        let split: SuggestResponse =
            serde_json::from_str(r#"{"suggested_split": {"alice": 6000, "bob": 4000}}"#).unwrap();
        assert_eq!(split.suggested_split.unwrap().alice, 6000.0);
        assert!(split.suggested_message.is_none());

        let msg: SuggestResponse =
            serde_json::from_str(r#"{"suggested_message": "let's settle"}"#).unwrap();
        assert_eq!(msg.suggested_message.as_deref(), Some("let's settle"));
    }
}

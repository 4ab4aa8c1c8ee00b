// crates/types/src/protocol.rs
//! Wire protocol for the live session channel.
//!
//! Inbound messages are discriminated by a top-level `type` field; anything
//! that fails to decode as [`ServerMessage`] is dropped by the transport
//! layer. Outbound traffic is always a [`ClientEnvelope`].

use serde::{Deserialize, Serialize};

use crate::params::{GameParams, Offer};

/// Author of a chat record, as reported by the negotiation engine.
///
/// `Assistant` is the local player's own prior output; `User` is what the
/// engine fed the player (the opponent's moves plus narration).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// One raw transcript record. Append-only; the content string is never
/// rewritten after arrival.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRecord {
    pub role: ChatRole,
    pub content: String,
}

impl ChatRecord {
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(ChatRole::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(ChatRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(ChatRole::Assistant, content)
    }
}

/// Whose turn it is, as dictated by the engine. Never inferred locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnType {
    Proposal,
    Decision,
    Waiting,
    Finished,
}

/// Which seat the local human occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerRole {
    Alice,
    Bob,
}

impl PlayerRole {
    /// Display name the engine uses in narration ("Alice", "Bob").
    pub fn display_name(&self) -> &'static str {
        match self {
            PlayerRole::Alice => "Alice",
            PlayerRole::Bob => "Bob",
        }
    }

    pub fn rival(&self) -> PlayerRole {
        match self {
            PlayerRole::Alice => PlayerRole::Bob,
            PlayerRole::Bob => PlayerRole::Alice,
        }
    }
}

/// A full state snapshot pushed by the server. Replaces prior session state
/// wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameStateMsg {
    pub session_id: String,
    pub turn_type: TurnType,
    #[serde(default)]
    pub round_number: u32,
    #[serde(default)]
    pub messages: Vec<ChatRecord>,
    #[serde(default)]
    pub game_params: GameParams,
    pub player_role: PlayerRole,
    #[serde(default)]
    pub last_offer: Option<Offer>,
}

/// Terminal notice: the session concluded with `outcome`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameFinishedMsg {
    pub session_id: String,
    #[serde(default)]
    pub outcome: String,
    #[serde(default)]
    pub final_alice: Option<f64>,
    #[serde(default)]
    pub final_bob: Option<f64>,
}

/// Inbound server → client messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    GameState(GameStateMsg),
    GameFinished(GameFinishedMsg),
}

/// The human's answer on a decision turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecisionChoice {
    Accept,
    Reject,
}

/// Payload of a `submit_response` envelope: either a decision or a split.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponsePayload {
    Decision {
        decision: DecisionChoice,
    },
    Proposal {
        alice_gain: f64,
        bob_gain: f64,
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
}

impl ResponsePayload {
    pub fn decision(choice: DecisionChoice) -> Self {
        Self::Decision { decision: choice }
    }

    /// Build a proposal payload. The message key is omitted entirely when the
    /// session was created with messaging disabled, or when the draft text is
    /// blank (the engine treats a present-but-empty message as sent).
    pub fn proposal(
        alice_gain: f64,
        bob_gain: f64,
        message: Option<&str>,
        messages_allowed: bool,
    ) -> Self {
        let message = message
            .map(str::trim)
            .filter(|m| messages_allowed && !m.is_empty())
            .map(String::from);
        Self::Proposal {
            alice_gain,
            bob_gain,
            message,
        }
    }
}

/// Payload of a `track_event` envelope. Best-effort telemetry; the server
/// appends these to the session's interaction log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackEventPayload {
    pub event: String,
    /// ISO-8601 emission timestamp.
    pub ts: String,
    /// Logical round at emission time, read from current session state.
    pub round: u32,
    #[serde(default)]
    pub data: serde_json::Value,
}

/// Outbound client → server envelope: `{ "type": ..., "payload": ... }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ClientEnvelope {
    SubmitResponse(ResponsePayload),
    TrackEvent(TrackEventPayload),
}

// crates/types/src/params.rs
//! Game parameters and offers as carried inside snapshots.

use serde::{Deserialize, Serialize};

fn default_money() -> i64 {
    10_000
}

fn default_max_rounds() -> u32 {
    12
}

fn default_delta() -> f64 {
    0.95
}

fn default_true() -> bool {
    true
}

/// Flat bag of game settings, wholesale-replaced by each snapshot.
///
/// The engine passes its own parameter dictionary through verbatim; keys we
/// don't model land in `extra` so a replacement never silently loses data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameParams {
    #[serde(default = "default_money")]
    pub money_to_divide: i64,
    #[serde(default = "default_max_rounds")]
    pub max_rounds: u32,
    #[serde(default = "default_delta")]
    pub delta_1: f64,
    #[serde(default = "default_delta")]
    pub delta_2: f64,
    #[serde(default = "default_true")]
    pub complete_information: bool,
    #[serde(default = "default_true")]
    pub messages_allowed: bool,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Default for GameParams {
    fn default() -> Self {
        Self {
            money_to_divide: default_money(),
            max_rounds: default_max_rounds(),
            delta_1: default_delta(),
            delta_2: default_delta(),
            complete_information: true,
            messages_allowed: true,
            extra: serde_json::Map::new(),
        }
    }
}

/// An offer on the table: how the money splits between the two parties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Offer {
    #[serde(default)]
    pub alice_gain: f64,
    #[serde(default)]
    pub bob_gain: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Tone dials for AI-assisted message drafting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToneModifier {
    MoreCredible,
    LessCredible,
    MoreLogical,
    LessLogical,
    MoreAggressive,
    LessAggressive,
    MoreEmotional,
    LessEmotional,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn params_default_from_empty_object() {
        let p: GameParams = serde_json::from_str("{}").unwrap();
        assert_eq!(p.money_to_divide, 10_000);
        assert_eq!(p.max_rounds, 12);
        assert!(p.messages_allowed);
        assert!(p.extra.is_empty());
    }

    #[test]
    fn params_keep_unknown_keys() {
        let p: GameParams =
            serde_json::from_str(r#"{"money_to_divide": 500, "public_name": "Bob"}"#).unwrap();
        assert_eq!(p.money_to_divide, 500);
        assert_eq!(p.extra["public_name"], "Bob");
    }

    #[test]
    fn tone_modifier_wire_form() {
        let json = serde_json::to_value(ToneModifier::MoreAggressive).unwrap();
        assert_eq!(json, "more_aggressive");
    }
}

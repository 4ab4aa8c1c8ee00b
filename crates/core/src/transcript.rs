// crates/core/src/transcript.rs
//! Record classifier: turns one raw [`ChatRecord`] into a typed event.
//!
//! The engine speaks two independent encodings for the same semantic events.
//! A player's own responses arrive as JSON fragments embedded in prose
//! (`{"alice_gain": 6000, "bob_gain": 4000}`), while the opponent's moves are
//! relayed as labeled text blocks (`# Bob gain: 6,500`). Classification is an
//! ordered chain of pure attempts (structured, then textual, then fallback)
//! so precedence is testable in isolation.

use std::sync::OnceLock;

use regex_lite::Regex;

use haggle_types::{ChatRecord, ChatRole};

/// Maximum preview length for records that classify as freeform prose.
/// The full raw content stays on the record; only the derived event truncates.
pub const FREEFORM_PREVIEW_MAX: usize = 160;

/// Display-only round marker lifted from narration (`Round 3 of 12`).
///
/// The engine numbers rounds per party, so this cannot be used as a linear
/// counter across the whole transcript; see [`crate::timeline`] for the
/// authoritative count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundLabel {
    pub number: u32,
    pub of: Option<u32>,
}

/// A single transcript record, interpreted.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedEvent {
    /// A split offer, from either encoding.
    Proposal {
        alice_gain: f64,
        bob_gain: f64,
        message: Option<String>,
        /// The record narrated a rejection of the previous offer before
        /// making this one. Best-effort phrase heuristic, not a guarantee.
        rejected_before: bool,
        round_label: Option<RoundLabel>,
    },
    /// An accept/reject verdict on the offer on the table.
    Decision { accepted: bool },
    /// Engine narration with role `system`; hidden from rendering by default.
    SystemNote,
    /// Anything else: kept verbatim, previewed truncated.
    Freeform { preview: String },
}

fn gain_re(slot: &'static OnceLock<Regex>, name: &str) -> &'static Regex {
    slot.get_or_init(|| {
        Regex::new(&format!(r"(?i){name}\s+gain:\s*([0-9][0-9,]*(?:\.[0-9]+)?)")).unwrap()
    })
}

fn alice_gain_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    gain_re(&RE, "alice")
}

fn bob_gain_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    gain_re(&RE, "bob")
}

fn message_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)[A-Za-z]+'s message:[ \t]*(.+)").unwrap())
}

fn rejection_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)rejected\s+[A-Za-z]+'s\s+offer").unwrap())
}

fn round_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)round\s+([0-9]+)(?:\s+of\s+([0-9]+))?").unwrap())
}

/// Classify one record. Pure; never fails. The fallback arm absorbs
/// everything the two real encodings don't match.
pub fn classify(record: &ChatRecord) -> ParsedEvent {
    if let Some(event) = try_structured(&record.content) {
        return event;
    }
    if let Some(event) = try_labeled_text(&record.content) {
        return event;
    }
    match record.role {
        ChatRole::System => ParsedEvent::SystemNote,
        _ => ParsedEvent::Freeform {
            preview: preview_of(&record.content, FREEFORM_PREVIEW_MAX),
        },
    }
}

/// Attempt 1: a JSON object embedded anywhere in the content.
fn try_structured(content: &str) -> Option<ParsedEvent> {
    let raw = balanced_object(content)?;
    let cleaned = strip_digit_commas(raw);
    let value: serde_json::Value = serde_json::from_str(&cleaned).ok()?;
    let obj = value.as_object()?;

    if let Some(decision) = obj.get("decision") {
        // Exact, case-sensitive match: "Accept" is not an acceptance.
        let accepted = decision.as_str() == Some("accept");
        return Some(ParsedEvent::Decision { accepted });
    }

    if obj.contains_key("alice_gain") || obj.contains_key("bob_gain") {
        return Some(ParsedEvent::Proposal {
            alice_gain: obj.get("alice_gain").and_then(|v| v.as_f64()).unwrap_or(0.0),
            bob_gain: obj.get("bob_gain").and_then(|v| v.as_f64()).unwrap_or(0.0),
            message: obj
                .get("message")
                .and_then(|v| v.as_str())
                .map(String::from),
            rejected_before: rejection_re().is_match(content),
            round_label: round_label_of(content),
        });
    }

    None
}

/// Attempt 2: the engine's labeled text block. Both gain lines must be
/// present; everything else is optional garnish.
fn try_labeled_text(content: &str) -> Option<ParsedEvent> {
    let alice = captured_number(alice_gain_re(), content)?;
    let bob = captured_number(bob_gain_re(), content)?;

    let message = message_re()
        .captures(content)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|m| !m.is_empty());

    Some(ParsedEvent::Proposal {
        alice_gain: alice,
        bob_gain: bob,
        message,
        rejected_before: rejection_re().is_match(content),
        round_label: round_label_of(content),
    })
}

fn captured_number(re: &Regex, content: &str) -> Option<f64> {
    let raw = re.captures(content)?.get(1)?.as_str();
    strip_digit_commas(raw).parse().ok()
}

fn round_label_of(content: &str) -> Option<RoundLabel> {
    let caps = round_re().captures(content)?;
    let number = caps.get(1)?.as_str().parse().ok()?;
    let of = caps.get(2).and_then(|m| m.as_str().parse().ok());
    Some(RoundLabel { number, of })
}

/// The first balanced `{...}` substring, tracking nesting and JSON string
/// literals so a brace inside a quoted message doesn't end the scan early.
fn balanced_object(content: &str) -> Option<&str> {
    let start = content.find('{')?;
    let bytes = content.as_bytes();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate().skip(start) {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&content[start..=i]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Remove thousand separators: a comma is dropped only when flanked by
/// digits, so commas in prose survive.
fn strip_digit_commas(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    for (i, &b) in bytes.iter().enumerate() {
        if b == b','
            && i > 0
            && bytes[i - 1].is_ascii_digit()
            && bytes.get(i + 1).is_some_and(u8::is_ascii_digit)
        {
            continue;
        }
        out.push(b);
    }
    // Only ASCII commas were removed, so the bytes are still valid UTF-8.
    String::from_utf8(out).unwrap_or_else(|_| s.to_string())
}

/// Truncate at a char boundary and append an ellipsis.
pub(crate) fn preview_of(content: &str, max: usize) -> String {
    let trimmed = content.trim();
    if trimmed.chars().count() <= max {
        return trimmed.to_string();
    }
    let cut: String = trimmed.chars().take(max).collect();
    format!("{}…", cut.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn proposal(content: &str) -> (f64, f64, Option<String>, bool) {
        match classify(&ChatRecord::user(content)) {
            ParsedEvent::Proposal {
                alice_gain,
                bob_gain,
                message,
                rejected_before,
                ..
            } => (alice_gain, bob_gain, message, rejected_before),
            other => panic!("expected proposal, got {other:?}"),
        }
    }

    #[test]
    fn json_proposal_classifies() {
        let (alice, bob, message, _) =
            proposal(r#"My offer: {"alice_gain": 6000, "bob_gain": 4000}"#);
        assert_eq!(alice, 6000.0);
        assert_eq!(bob, 4000.0);
        assert_eq!(message, None);
    }

    #[test]
    fn json_proposal_with_thousand_separators() {
        let (alice, bob, _, _) = proposal(r#"{"alice_gain": 6,000, "bob_gain": 4,000}"#);
        assert_eq!(alice, 6000.0);
        assert_eq!(bob, 4000.0);
    }

    #[test]
    fn json_proposal_keeps_commas_inside_message() {
        let (_, _, message, _) =
            proposal(r#"{"alice_gain": 7000, "bob_gain": 3000, "message": "Take it, please"}"#);
        assert_eq!(message.as_deref(), Some("Take it, please"));
    }

    #[test]
    fn json_decision_accept_and_reject() {
        assert_eq!(
            classify(&ChatRecord::assistant(r#"{"decision": "accept"}"#)),
            ParsedEvent::Decision { accepted: true }
        );
        assert_eq!(
            classify(&ChatRecord::assistant(r#"{"decision": "reject"}"#)),
            ParsedEvent::Decision { accepted: false }
        );
    }

    #[test]
    fn decision_match_is_case_sensitive() {
        assert_eq!(
            classify(&ChatRecord::assistant(r#"{"decision": "Accept"}"#)),
            ParsedEvent::Decision { accepted: false }
        );
    }

    #[test]
    fn labeled_text_proposal() {
        let (alice, bob, message, _) =
            proposal("# Alice gain: 3,500\n# Bob gain: 6,500\n# Alice's message: hello");
        assert_eq!(alice, 3500.0);
        assert_eq!(bob, 6500.0);
        assert_eq!(message.as_deref(), Some("hello"));
    }

    #[test]
    fn labeled_text_is_case_insensitive_and_hash_optional() {
        let (alice, bob, message, _) = proposal("ALICE GAIN: 1200\nbob gain: 800");
        assert_eq!(alice, 1200.0);
        assert_eq!(bob, 800.0);
        assert_eq!(message, None);
    }

    #[test]
    fn labeled_text_requires_both_gains() {
        let event = classify(&ChatRecord::user("# Alice gain: 3,500\nno counterpart"));
        assert!(matches!(event, ParsedEvent::Freeform { .. }));
    }

    #[test]
    fn rejection_phrase_sets_flag() {
        let (_, _, _, rejected) = proposal(
            "Round 4\nBob rejected Alice's offer.\n# Alice gain: 2,000\n# Bob gain: 8,000",
        );
        assert!(rejected);

        let (_, _, _, clean) = proposal("# Alice gain: 2,000\n# Bob gain: 8,000");
        assert!(!clean);
    }

    #[test]
    fn round_label_extracted_for_display() {
        match classify(&ChatRecord::user(
            "Round 4 of 12\n# Alice gain: 100\n# Bob gain: 900",
        )) {
            ParsedEvent::Proposal { round_label, .. } => {
                assert_eq!(
                    round_label,
                    Some(RoundLabel {
                        number: 4,
                        of: Some(12)
                    })
                );
            }
            other => panic!("expected proposal, got {other:?}"),
        }
    }

    #[test]
    fn structured_wins_over_labeled_text() {
        // Both encodings present in one record: the ordered chain takes JSON.
        let (alice, _, _, _) =
            proposal("# Alice gain: 1\n# Bob gain: 2\n{\"alice_gain\": 9000, \"bob_gain\": 1000}");
        assert_eq!(alice, 9000.0);
    }

    #[test]
    fn system_fallback_is_note() {
        assert_eq!(
            classify(&ChatRecord::system("You are playing a bargaining game.")),
            ParsedEvent::SystemNote
        );
    }

    #[test]
    fn freeform_preview_truncates_but_record_keeps_raw() {
        let long = "x".repeat(400);
        let record = ChatRecord::user(long.clone());
        match classify(&record) {
            ParsedEvent::Freeform { preview } => {
                assert!(preview.chars().count() <= FREEFORM_PREVIEW_MAX + 1);
                assert!(preview.ends_with('…'));
            }
            other => panic!("expected freeform, got {other:?}"),
        }
        assert_eq!(record.content, long);
    }

    #[test]
    fn unbalanced_brace_falls_through() {
        let event = classify(&ChatRecord::user("{\"alice_gain\": 5"));
        assert!(matches!(event, ParsedEvent::Freeform { .. }));
    }

    #[test]
    fn brace_inside_string_does_not_close_object() {
        let (_, _, message, _) =
            proposal(r#"{"alice_gain": 1, "bob_gain": 2, "message": "curly } brace"}"#);
        assert_eq!(message.as_deref(), Some("curly } brace"));
    }

    #[test]
    fn non_proposal_json_falls_through_to_text() {
        // A JSON object without decision/gain keys must not shadow a valid
        // labeled-text block later in the record.
        let (alice, _, _, _) =
            proposal("{\"note\": \"fyi\"}\n# Alice gain: 400\n# Bob gain: 600");
        assert_eq!(alice, 400.0);
    }
}

// crates/core/src/timeline.rs
//! Rendering pass: a canonical, orderable event timeline derived from the
//! raw record list.
//!
//! Recomputed from scratch on every call: the timeline is a pure function
//! of the transcript, never accumulated state, so re-renders of an unchanged
//! record list are idempotent by construction. The per-timeline round counter
//! lives here and nowhere else: the engine numbers rounds per party, which
//! does not produce one linear count across both participants.

use haggle_types::{ChatRecord, ChatRole};

use crate::transcript::{classify, preview_of, ParsedEvent, RoundLabel};

/// Who an event is attributed to in the rendered view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Author {
    /// The local human (`assistant` records, the player's own prior output).
    Local,
    /// The counterparty (`user` records, what the engine relayed).
    Remote,
    /// Engine narration that survived collapsing.
    Engine,
}

/// One rendered timeline entry.
#[derive(Debug, Clone, PartialEq)]
pub struct TimelineEvent {
    pub author: Author,
    pub kind: EventKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    Proposal {
        /// Linear 1-based round index across both parties, assigned by this
        /// pass. Increments exactly once per rendered proposal.
        round: u32,
        alice_gain: f64,
        bob_gain: f64,
        message: Option<String>,
        /// The engine's own per-party round marker, display-only.
        round_label: Option<RoundLabel>,
    },
    Decision {
        accepted: bool,
    },
    /// Collapsed narration, reduced to a short fixed label.
    Note {
        label: &'static str,
    },
    Freeform {
        preview: String,
    },
}

/// Rendering knobs. System notes are hidden unless asked for.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimelineOptions {
    pub include_system_notes: bool,
}

/// What to do with a piece of narration that carries no structured payload.
enum Narration {
    /// Redundant with a structured event or the turn state; drop it.
    Suppress,
    /// Replace with a short fixed label.
    Label(&'static str),
    /// Nothing known about it; keep as freeform.
    Keep,
}

/// Known engine boilerplate. The phrases are heuristic; anything unmatched
/// stays visible rather than silently vanishing.
fn collapse_narration(content: &str) -> Narration {
    let lower = content.to_lowercase();
    if lower.contains("accepted the offer") || lower.contains("rejected the offer") {
        // Accept/reject outcomes are rendered structurally.
        return Narration::Suppress;
    }
    if lower.contains("do you accept") {
        // Turn prompt; the turn state already says it's decision time.
        return Narration::Suppress;
    }
    if lower.contains("reply with") || lower.contains("respond with") {
        // Format instructions aimed at the engine's text interface.
        return Narration::Suppress;
    }
    if lower.contains("you are playing") || lower.contains("rules of the game") {
        return Narration::Label("Rules briefing");
    }
    Narration::Keep
}

/// Derive the rendered timeline from the transcript.
///
/// The merge rule: a remote proposal whose record narrates a rejection of the
/// previous offer yields a synthetic `Decision { accepted: false }` event
/// immediately before it, attributed to the remote party. The synthetic event
/// exists only in the returned vec (the record list is untouched) and the
/// proposal still counts one round, not two.
pub fn render_timeline(records: &[ChatRecord], opts: TimelineOptions) -> Vec<TimelineEvent> {
    let mut events = Vec::with_capacity(records.len());
    let mut round = 0u32;

    for record in records {
        let author = match record.role {
            ChatRole::Assistant => Author::Local,
            ChatRole::User => Author::Remote,
            ChatRole::System => Author::Engine,
        };

        match classify(record) {
            ParsedEvent::Proposal {
                alice_gain,
                bob_gain,
                message,
                rejected_before,
                round_label,
            } => {
                if rejected_before && author == Author::Remote {
                    events.push(TimelineEvent {
                        author: Author::Remote,
                        kind: EventKind::Decision { accepted: false },
                    });
                }
                round += 1;
                events.push(TimelineEvent {
                    author,
                    kind: EventKind::Proposal {
                        round,
                        alice_gain,
                        bob_gain,
                        message,
                        round_label,
                    },
                });
            }
            ParsedEvent::Decision { accepted } => {
                events.push(TimelineEvent {
                    author,
                    kind: EventKind::Decision { accepted },
                });
            }
            ParsedEvent::SystemNote => {
                if !opts.include_system_notes {
                    continue;
                }
                match collapse_narration(&record.content) {
                    Narration::Suppress => {}
                    Narration::Label(label) => events.push(TimelineEvent {
                        author: Author::Engine,
                        kind: EventKind::Note { label },
                    }),
                    Narration::Keep => events.push(TimelineEvent {
                        author: Author::Engine,
                        kind: EventKind::Freeform {
                            preview: preview_of(
                                &record.content,
                                crate::transcript::FREEFORM_PREVIEW_MAX,
                            ),
                        },
                    }),
                }
            }
            ParsedEvent::Freeform { preview } => match collapse_narration(&record.content) {
                Narration::Suppress => {}
                Narration::Label(label) => events.push(TimelineEvent {
                    author: Author::Engine,
                    kind: EventKind::Note { label },
                }),
                Narration::Keep => events.push(TimelineEvent {
                    author,
                    kind: EventKind::Freeform { preview },
                }),
            },
        }
    }

    events
}

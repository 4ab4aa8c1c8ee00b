// crates/core/src/store.rs
//! Session state reducer and local draft-form state.
//!
//! Inbound messages fold into a [`SessionState`] published through a
//! `tokio::sync::watch` channel: a new value is fully built inside one
//! `send_modify` closure, so subscribers can only ever observe complete
//! snapshots; there is no half-applied state to see. The draft form lives
//! beside the session state and is deliberately untouched by snapshot
//! application; only an explicit [`SessionStore::clear_form`] resets it.

use tokio::sync::watch;
use tracing::{debug, warn};

use haggle_types::{
    ChatRecord, GameFinishedMsg, GameParams, GameStateMsg, Offer, PlayerRole, ResponsePayload,
    ServerMessage, ToneModifier, TurnType,
};

use crate::error::ValidationError;
use crate::validate::validate_split;

/// Slider proportion restored by `clear_form`.
pub const DEFAULT_SLIDER_PCT: u8 = 50;

/// Terminal outcome, set once per session and sticky thereafter.
#[derive(Debug, Clone, PartialEq)]
pub struct Finished {
    pub outcome: String,
    pub final_alice: Option<f64>,
    pub final_bob: Option<f64>,
}

/// The coherent view of one session, replaced wholesale per snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    pub session_id: String,
    pub turn_type: TurnType,
    pub round_number: u32,
    pub messages: Vec<ChatRecord>,
    pub game_params: GameParams,
    pub player_role: PlayerRole,
    pub last_offer: Option<Offer>,
    pub finished: Option<Finished>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            session_id: String::new(),
            turn_type: TurnType::Waiting,
            round_number: 0,
            messages: Vec::new(),
            game_params: GameParams::default(),
            player_role: PlayerRole::Alice,
            last_offer: None,
            finished: None,
        }
    }
}

/// Local-only form state. Protocol-independent: no inbound message ever
/// reads or writes it.
#[derive(Debug, Clone, PartialEq)]
pub struct DraftState {
    pub slider_pct: u8,
    pub message_text: String,
    pub tone_modifiers: Vec<ToneModifier>,
}

impl Default for DraftState {
    fn default() -> Self {
        Self {
            slider_pct: DEFAULT_SLIDER_PCT,
            message_text: String::new(),
            tone_modifiers: Vec::new(),
        }
    }
}

/// Reducer owning the session view. Exactly one writer context is assumed;
/// readers subscribe via [`SessionStore::subscribe`].
pub struct SessionStore {
    tx: watch::Sender<SessionState>,
    draft: DraftState,
}

impl SessionStore {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(SessionState::default());
        Self {
            tx,
            draft: DraftState::default(),
        }
    }

    /// Watch the session state. Each observed value is a complete snapshot.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.tx.subscribe()
    }

    /// Clone of the current state.
    pub fn snapshot(&self) -> SessionState {
        self.tx.borrow().clone()
    }

    pub fn is_finished(&self) -> bool {
        self.tx.borrow().finished.is_some()
    }

    /// Fold one inbound message into the state.
    ///
    /// Snapshots replace turn/round/messages/params/role/offer as one unit.
    /// A terminal notice wins over everything: once set, later snapshots are
    /// ignored and later terminals are idempotent no-ops.
    pub fn apply(&mut self, msg: ServerMessage) {
        match msg {
            ServerMessage::GameState(snapshot) => self.apply_snapshot(snapshot),
            ServerMessage::GameFinished(terminal) => self.apply_terminal(terminal),
        }
    }

    fn apply_snapshot(&mut self, snapshot: GameStateMsg) {
        if self.is_finished() {
            debug!(session_id = %snapshot.session_id, "snapshot after terminal notice ignored");
            return;
        }
        self.tx.send_modify(|state| {
            state.session_id = snapshot.session_id;
            state.turn_type = snapshot.turn_type;
            // Both round counters are monotonic for the session's lifetime;
            // a regressing snapshot keeps the high-water mark.
            if snapshot.round_number < state.round_number {
                warn!(
                    incoming = snapshot.round_number,
                    current = state.round_number,
                    "round number regressed; keeping current"
                );
            } else {
                state.round_number = snapshot.round_number;
            }
            // The transcript is append-only upstream; a shorter list means a
            // stale or partial push, and swapping it in would flicker.
            if snapshot.messages.len() >= state.messages.len() {
                state.messages = snapshot.messages;
            } else {
                warn!(
                    incoming = snapshot.messages.len(),
                    current = state.messages.len(),
                    "snapshot shrank the transcript; keeping current records"
                );
            }
            state.game_params = snapshot.game_params;
            state.player_role = snapshot.player_role;
            state.last_offer = snapshot.last_offer;
        });
    }

    fn apply_terminal(&mut self, terminal: GameFinishedMsg) {
        if self.is_finished() {
            debug!(session_id = %terminal.session_id, "duplicate terminal notice ignored");
            return;
        }
        self.tx.send_modify(|state| {
            state.turn_type = TurnType::Finished;
            state.finished = Some(Finished {
                outcome: terminal.outcome,
                final_alice: terminal.final_alice,
                final_bob: terminal.final_bob,
            });
        });
    }

    // ── Draft form ──────────────────────────────────────────────────────

    pub fn draft(&self) -> &DraftState {
        &self.draft
    }

    /// Set the slider, clamped to 0..=100. Returns the stored value.
    pub fn set_slider_pct(&mut self, pct: u8) -> u8 {
        self.draft.slider_pct = pct.min(100);
        self.draft.slider_pct
    }

    pub fn set_message_text(&mut self, text: impl Into<String>) {
        self.draft.message_text = text.into();
    }

    /// Toggle a tone modifier on or off.
    pub fn toggle_tone(&mut self, tone: ToneModifier) {
        if let Some(pos) = self.draft.tone_modifiers.iter().position(|t| *t == tone) {
            self.draft.tone_modifiers.remove(pos);
        } else {
            self.draft.tone_modifiers.push(tone);
        }
    }

    /// Reset the form to its defaults. Has no effect on the transcript or
    /// any other inbound-driven state.
    pub fn clear_form(&mut self) {
        self.draft = DraftState::default();
    }

    /// Gains implied by the current slider position: the slider percentage
    /// is Alice's share of the pot, whole units.
    pub fn slider_gains(&self) -> (f64, f64) {
        let money = self.tx.borrow().game_params.money_to_divide as f64;
        let alice = (money * f64::from(self.draft.slider_pct) / 100.0).round();
        (alice, money - alice)
    }

    /// Build a submit-ready proposal from the current draft. The split is
    /// checked against the pot first; a failing check means nothing is sent.
    pub fn draft_proposal(&self) -> Result<ResponsePayload, ValidationError> {
        let (alice, bob) = self.slider_gains();
        let params = self.tx.borrow().game_params.clone();
        validate_split(alice, bob, &params)?;
        Ok(ResponsePayload::proposal(
            alice,
            bob,
            Some(&self.draft.message_text),
            params.messages_allowed,
        ))
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn snapshot(round: u32, messages: Vec<ChatRecord>) -> ServerMessage {
        ServerMessage::GameState(GameStateMsg {
            session_id: "s1".into(),
            turn_type: TurnType::Proposal,
            round_number: round,
            messages,
            game_params: GameParams::default(),
            player_role: PlayerRole::Alice,
            last_offer: None,
        })
    }

    fn terminal(outcome: &str) -> ServerMessage {
        ServerMessage::GameFinished(GameFinishedMsg {
            session_id: "s1".into(),
            outcome: outcome.into(),
            final_alice: Some(6000.0),
            final_bob: Some(4000.0),
        })
    }

    #[test]
    fn snapshot_replaces_state_as_unit() {
        let mut store = SessionStore::new();
        store.apply(snapshot(2, vec![ChatRecord::user("hi")]));

        let state = store.snapshot();
        assert_eq!(state.session_id, "s1");
        assert_eq!(state.turn_type, TurnType::Proposal);
        assert_eq!(state.round_number, 2);
        assert_eq!(state.messages.len(), 1);
    }

    #[test]
    fn terminal_is_sticky_and_idempotent() {
        let mut store = SessionStore::new();
        store.apply(snapshot(1, vec![ChatRecord::user("hi")]));
        store.apply(terminal("deal"));

        assert_eq!(store.snapshot().turn_type, TurnType::Finished);

        // Later snapshots are ignored wholesale.
        store.apply(snapshot(5, vec![]));
        let state = store.snapshot();
        assert_eq!(state.turn_type, TurnType::Finished);
        assert_eq!(state.messages.len(), 1);

        // A second terminal is a no-op, not a replacement.
        store.apply(terminal("no_deal"));
        assert_eq!(store.snapshot().finished.unwrap().outcome, "deal");
    }

    #[test]
    fn round_number_never_regresses() {
        let mut store = SessionStore::new();
        store.apply(snapshot(4, vec![]));
        store.apply(snapshot(2, vec![]));
        assert_eq!(store.snapshot().round_number, 4);
    }

    #[test]
    fn shrinking_transcript_is_rejected() {
        let mut store = SessionStore::new();
        store.apply(snapshot(
            1,
            vec![ChatRecord::user("a"), ChatRecord::user("b")],
        ));
        store.apply(snapshot(2, vec![ChatRecord::user("a")]));

        let state = store.snapshot();
        assert_eq!(state.messages.len(), 2);
        // The rest of the snapshot still applied.
        assert_eq!(state.round_number, 2);
    }

    #[test]
    fn draft_survives_snapshot_application() {
        let mut store = SessionStore::new();
        store.set_slider_pct(72);
        store.set_message_text("thinking about it");
        store.toggle_tone(ToneModifier::MoreLogical);

        store.apply(snapshot(3, vec![ChatRecord::user("offer")]));

        assert_eq!(store.draft().slider_pct, 72);
        assert_eq!(store.draft().message_text, "thinking about it");
        assert_eq!(store.draft().tone_modifiers, vec![ToneModifier::MoreLogical]);
    }

    #[test]
    fn clear_form_resets_draft_only() {
        let mut store = SessionStore::new();
        store.apply(snapshot(1, vec![ChatRecord::user("offer")]));
        store.set_slider_pct(90);
        store.set_message_text("final answer");
        store.toggle_tone(ToneModifier::MoreAggressive);

        store.clear_form();

        assert_eq!(store.draft().slider_pct, DEFAULT_SLIDER_PCT);
        assert_eq!(store.draft().message_text, "");
        assert!(store.draft().tone_modifiers.is_empty());
        // Transcript untouched.
        assert_eq!(store.snapshot().messages.len(), 1);
    }

    #[test]
    fn slider_clamps_to_hundred() {
        let mut store = SessionStore::new();
        assert_eq!(store.set_slider_pct(250), 100);
    }

    #[test]
    fn toggle_tone_flips() {
        let mut store = SessionStore::new();
        store.toggle_tone(ToneModifier::LessEmotional);
        store.toggle_tone(ToneModifier::LessEmotional);
        assert!(store.draft().tone_modifiers.is_empty());
    }

    #[test]
    fn slider_gains_split_the_pot() {
        let mut store = SessionStore::new();
        store.apply(snapshot(1, vec![]));
        store.set_slider_pct(60);
        assert_eq!(store.slider_gains(), (6000.0, 4000.0));
    }

    #[test]
    fn draft_proposal_builds_from_slider_and_message() {
        let mut store = SessionStore::new();
        store.apply(snapshot(1, vec![]));
        store.set_slider_pct(60);
        store.set_message_text("meet me halfway");

        let payload = store.draft_proposal().unwrap();
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["alice_gain"], 6000.0);
        assert_eq!(json["bob_gain"], 4000.0);
        assert_eq!(json["message"], "meet me halfway");
    }

    #[test]
    fn watch_subscribers_see_complete_snapshots() {
        let mut store = SessionStore::new();
        let rx = store.subscribe();
        store.apply(snapshot(1, vec![ChatRecord::user("hi")]));

        let seen = rx.borrow().clone();
        assert_eq!(seen.round_number, 1);
        assert_eq!(seen.messages.len(), 1);
    }
}

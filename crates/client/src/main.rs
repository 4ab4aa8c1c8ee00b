// crates/client/src/main.rs
//! `haggle` binary: headless driver for live bargaining sessions.
//!
//! Creates sessions, follows their event timelines from the terminal, and
//! fetches assistant suggestions. This is a driver for the sync layer, not a
//! UI: it prints the rendered timeline as it grows and exits when the
//! session concludes.

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use haggle_client::{ClientConfig, GameApi, SessionChannel, DEFAULT_SERVER_URL};
use haggle_core::{render_timeline, Author, EventKind, SessionState, SessionStore, TimelineOptions};
use haggle_types::{
    CreateSessionRequest, GameFamily, PlayerRole, SuggestRequest, SuggestType, ToneModifier,
};

#[derive(Parser)]
#[command(name = "haggle", version, about = "Terminal client for live bargaining sessions")]
struct Cli {
    /// Base URL of the session server.
    #[arg(long, env = "HAGGLE_SERVER_URL", default_value = DEFAULT_SERVER_URL, global = true)]
    server_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create a session and print its id.
    Create {
        #[arg(long, value_enum, default_value = "alice")]
        role: RoleArg,
        /// Money on the table.
        #[arg(long, default_value_t = 10_000)]
        money: i64,
        /// Round limit.
        #[arg(long, default_value_t = 12)]
        rounds: u32,
        #[arg(long, default_value_t = 0.95)]
        delta1: f64,
        #[arg(long, default_value_t = 0.95)]
        delta2: f64,
        /// Disable free-text messages between parties.
        #[arg(long)]
        no_messages: bool,
        /// Hide the opponent's discount factor.
        #[arg(long)]
        incomplete_info: bool,
        /// Follow the new session immediately.
        #[arg(long)]
        watch: bool,
    },
    /// List sessions the server knows about.
    List,
    /// Follow a session's live timeline until it concludes.
    Watch { session_id: String },
    /// Ask the assistant for a split or message suggestion.
    Suggest {
        session_id: String,
        #[arg(long, value_enum)]
        kind: SuggestKindArg,
        /// Current message draft, for message suggestions.
        #[arg(long, default_value = "")]
        draft: String,
        /// Tone dials, repeatable.
        #[arg(long = "tone", value_enum)]
        tones: Vec<ToneArg>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum RoleArg {
    Alice,
    Bob,
}

impl From<RoleArg> for PlayerRole {
    fn from(role: RoleArg) -> Self {
        match role {
            RoleArg::Alice => PlayerRole::Alice,
            RoleArg::Bob => PlayerRole::Bob,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum SuggestKindArg {
    Split,
    Message,
}

#[derive(Clone, Copy, ValueEnum)]
enum ToneArg {
    MoreCredible,
    LessCredible,
    MoreLogical,
    LessLogical,
    MoreAggressive,
    LessAggressive,
    MoreEmotional,
    LessEmotional,
}

impl From<ToneArg> for ToneModifier {
    fn from(tone: ToneArg) -> Self {
        match tone {
            ToneArg::MoreCredible => ToneModifier::MoreCredible,
            ToneArg::LessCredible => ToneModifier::LessCredible,
            ToneArg::MoreLogical => ToneModifier::MoreLogical,
            ToneArg::LessLogical => ToneModifier::LessLogical,
            ToneArg::MoreAggressive => ToneModifier::MoreAggressive,
            ToneArg::LessAggressive => ToneModifier::LessAggressive,
            ToneArg::MoreEmotional => ToneModifier::MoreEmotional,
            ToneArg::LessEmotional => ToneModifier::LessEmotional,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("HAGGLE_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let config = ClientConfig::new(cli.server_url.clone());
    let api = GameApi::new(cli.server_url);

    match cli.command {
        Command::Create {
            role,
            money,
            rounds,
            delta1,
            delta2,
            no_messages,
            incomplete_info,
            watch,
        } => {
            let request = CreateSessionRequest {
                game_family: GameFamily::Bargaining,
                player_role: role.into(),
                money_to_divide: money,
                max_rounds: rounds,
                delta_1: delta1,
                delta_2: delta2,
                complete_information: !incomplete_info,
                messages_allowed: !no_messages,
            };
            let created = api.create_session(&request).await?;
            println!("{}", created.session_id);
            if watch {
                watch_session(&config, &created.session_id).await?;
            }
        }
        Command::List => {
            for session in api.list_sessions().await? {
                println!(
                    "{}  {}  {}  {}",
                    session.session_id, session.game_family, session.player_role, session.status
                );
            }
        }
        Command::Watch { session_id } => {
            watch_session(&config, &session_id).await?;
        }
        Command::Suggest {
            session_id,
            kind,
            draft,
            tones,
        } => {
            let request = SuggestRequest {
                suggest_type: match kind {
                    SuggestKindArg::Split => SuggestType::Split,
                    SuggestKindArg::Message => SuggestType::Message,
                },
                tone_modifiers: tones.into_iter().map(Into::into).collect(),
                current_message: draft,
            };
            match api.suggest(&session_id, &request).await {
                Ok(suggestion) => {
                    if let Some(split) = suggestion.suggested_split {
                        println!("suggested split: Alice {} / Bob {}", split.alice, split.bob);
                    }
                    if let Some(message) = suggestion.suggested_message {
                        println!("suggested message: {message}");
                    }
                }
                Err(e) => {
                    // One shot; report and move on.
                    debug!(error = %e, "suggestion request failed");
                    println!("no suggestion available");
                }
            }
        }
    }

    Ok(())
}

/// Follow one session: fold inbound messages into the store and print the
/// timeline as it grows, until the terminal notice lands.
async fn watch_session(config: &ClientConfig, session_id: &str) -> Result<()> {
    let (channel, mut inbound) = SessionChannel::open(config, session_id)?;
    let mut connected = channel.connected();
    let mut store = SessionStore::new();
    let mut printed = 0usize;

    info!(%session_id, "following session");

    loop {
        tokio::select! {
            changed = connected.changed() => {
                if changed.is_err() {
                    break;
                }
                if *connected.borrow() {
                    info!("connected");
                } else {
                    info!("reconnecting");
                }
            }
            msg = inbound.recv() => {
                let Some(msg) = msg else { break };
                store.apply(msg);
                let state = store.snapshot();

                let events = render_timeline(&state.messages, TimelineOptions::default());
                for event in events.iter().skip(printed) {
                    println!("{}", describe(event, &state));
                }
                printed = printed.max(events.len());

                if let Some(finished) = &state.finished {
                    match (finished.final_alice, finished.final_bob) {
                        (Some(alice), Some(bob)) => println!(
                            "session over: {} (Alice {alice} / Bob {bob})",
                            finished.outcome
                        ),
                        _ => println!("session over: {}", finished.outcome),
                    }
                    break;
                }
            }
        }
    }

    channel.close();
    Ok(())
}

fn describe(event: &haggle_core::TimelineEvent, state: &SessionState) -> String {
    let who = |author: Author| match author {
        Author::Local => state.player_role.display_name(),
        Author::Remote => state.player_role.rival().display_name(),
        Author::Engine => "engine",
    };
    match &event.kind {
        EventKind::Proposal {
            round,
            alice_gain,
            bob_gain,
            message,
            ..
        } => {
            let mut line = format!(
                "[round {round}] {} proposes Alice {alice_gain} / Bob {bob_gain}",
                who(event.author)
            );
            if let Some(message) = message {
                line.push_str(&format!(" with message \"{message}\""));
            }
            line
        }
        EventKind::Decision { accepted } => {
            let verb = if *accepted { "accepts" } else { "rejects" };
            format!("{} {verb} the offer", who(event.author))
        }
        EventKind::Note { label } => format!("· {label}"),
        EventKind::Freeform { preview } => format!("{}: {preview}", who(event.author)),
    }
}

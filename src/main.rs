//! Scatter terminal client: create a session, or join one and play it from stdin.

use std::{io, sync::Arc};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::{Instant, sleep_until};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use scatter_client::{
    config::ScatterConfig,
    dto::{
        decisions::{CellKey, ResponseKey},
        identity::{Identity, UserIdentity},
        session::{MIN_USER_COUNT, NewSession, SessionStatus},
    },
    error::SESSION_CREATE_ERROR,
    remote::{SessionApi, http::HttpSessionApi},
    services::{
        create::create_game,
        owner::{Clipboard, OwnerPanel},
    },
    state::{
        Overlay, SessionMachine, View,
        round_timer::TickTicket,
        view::{
            BOOKMARK_HINT, EXPIRED_MESSAGE, EXPIRED_TITLE, GENERIC_ERROR, START_NEW_GAME,
            winner_heading,
        },
    },
};

#[derive(Parser)]
#[command(name = "scatter-client")]
#[command(about = "Create or join a Scatter word game session", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a session and text the invited players
    Create {
        /// Number of letters to play
        #[arg(long, default_value_t = 3)]
        rounds: u32,
        /// Seconds per letter, in steps of 15
        #[arg(long, default_value_t = 75)]
        time_limit: u32,
        /// Players expected to join, including you
        #[arg(long, default_value_t = MIN_USER_COUNT)]
        players: u32,
        /// Do not send text message updates
        #[arg(long)]
        no_texts: bool,
        /// Phone number to invite; repeat for each player
        #[arg(long)]
        invite: Vec<String>,
    },
    /// Join a session and play it from the terminal
    Join {
        /// Id from the session link
        session_id: String,
        /// Your phone number
        phone: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let config = ScatterConfig::load();
    let api: Arc<dyn SessionApi> = Arc::new(
        HttpSessionApi::new(config.api_config().context("configuring session API")?)
            .context("building session API client")?,
    );

    match cli.command {
        Commands::Create {
            rounds,
            time_limit,
            players,
            no_texts,
            invite,
        } => {
            let settings = NewSession {
                rounds,
                time_limit,
                user_count: players,
                text_updates: !no_texts,
            };
            create(&config, api.as_ref(), settings, &invite).await
        }
        Commands::Join { session_id, phone } => join(&config, api, &session_id, &phone).await,
    }
}

async fn create(
    config: &ScatterConfig,
    api: &dyn SessionApi,
    settings: NewSession,
    invitees: &[String],
) -> anyhow::Result<()> {
    match create_game(api, settings, invitees).await {
        Ok(created) => {
            println!("Game created: {}{}", config.app_origin.trim_end_matches('/'), created.path);
            for identity in &created.invited {
                println!("Invited {identity}");
            }
            println!("Join with: scatter-client join {} <phone>", created.session_id);
            Ok(())
        }
        Err(err) => {
            eprintln!("{SESSION_CREATE_ERROR}");
            Err(err).context("creating session")
        }
    }
}

async fn join(
    config: &ScatterConfig,
    api: Arc<dyn SessionApi>,
    session_id: &str,
    phone: &str,
) -> anyhow::Result<()> {
    let identity = Identity::from_phone_input(phone)
        .map_err(|err| anyhow::anyhow!("{}", err.message.unwrap_or_default()))
        .context("reading phone number")?;

    let mut machine = SessionMachine::new(session_id, api.clone(), config.session());
    machine.mount().await;
    machine.set_identity(Some(UserIdentity::guest(identity))).await;

    let mut panel = machine
        .is_owner()
        .then(|| OwnerPanel::new(session_id, config.app_origin.clone(), machine.session()));

    let mut tick = None;
    if machine.status() == SessionStatus::Playing && machine.session().has_categories() {
        match machine.start_round(Instant::now()).await {
            Ok(next) => tick = next,
            Err(err) => warn!(error = %err, "could not start playing"),
        }
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    render(&machine, panel.as_ref());

    while !finished(&machine) {
        tokio::select! {
            _ = sleep_until(tick.map_or_else(Instant::now, |ticket: TickTicket| ticket.due)), if tick.is_some() => {
                if let Some(ticket) = tick {
                    tick = machine.tick(ticket, Instant::now()).await;
                    if tick.is_some() {
                        println!("{}s left", machine.remaining(Instant::now()));
                    } else {
                        render(&machine, panel.as_ref());
                    }
                }
            }
            line = lines.next_line() => {
                let Some(line) = line.context("reading stdin")? else {
                    break;
                };
                match handle_command(&mut machine, panel.as_mut(), api.as_ref(), line.trim()).await {
                    Outcome::Quit => break,
                    Outcome::Ticked(next) => tick = next,
                    Outcome::Handled => {}
                }
                render(&machine, panel.as_ref());
            }
        }
    }

    info!(session_id, status = ?machine.status(), "leaving session");
    Ok(())
}

fn finished(machine: &SessionMachine) -> bool {
    matches!(
        machine.view(),
        View::Error(_) | View::Expired | View::Winner { .. }
    ) || machine.overlay() == Overlay::Waiting { please_refresh: true }
}

enum Outcome {
    Quit,
    Ticked(Option<TickTicket>),
    Handled,
}

async fn handle_command(
    machine: &mut SessionMachine,
    panel: Option<&mut OwnerPanel>,
    api: &dyn SessionApi,
    line: &str,
) -> Outcome {
    let words: Vec<&str> = line.split_whitespace().collect();
    match (machine.status(), words.as_slice()) {
        (_, ["quit"]) => return Outcome::Quit,
        (SessionStatus::Playing, ["submit"]) => {
            return Outcome::Ticked(machine.submit_category(Instant::now()).await);
        }
        (SessionStatus::Playing, ["players", count]) => match (panel, count.parse()) {
            (Some(panel), Ok(count)) => {
                if let Err(err) = panel.set_user_count(count) {
                    println!("{err}");
                } else if let Some(updated) = panel.submit(api, machine.session()).await {
                    machine.adopt_session(updated);
                }
            }
            (None, _) => println!("Only the session owner can change the player count."),
            (_, Err(_)) => println!("Player count must be a number."),
        },
        (SessionStatus::Playing, ["link"]) => match panel {
            Some(panel) => panel.copy_session_url(&mut StdoutClipboard),
            None => println!("Only the session owner can share the link."),
        },
        (SessionStatus::Playing, [index, ..]) => match index.parse() {
            Ok(index) => {
                let text = line[index_len(line)..].trim().to_string();
                if let Err(err) = machine.set_draft(index, text) {
                    println!("{err}");
                }
            }
            Err(_) => println!("Type `<number> <answer>`, `submit` or `quit`."),
        },
        (SessionStatus::Pointing, ["toggle", participant, letter, index]) => match index.parse() {
            Ok(index) => {
                let key = ResponseKey::new(
                    Identity::from(*participant),
                    CellKey::new(letter.to_uppercase(), index),
                );
                match machine.toggle_point(&key) {
                    Ok(points) => println!("{participant} {letter}{index}: {points}"),
                    Err(err) => println!("{err}"),
                }
            }
            Err(_) => println!("Type `toggle <phone> <letter> <number>`."),
        },
        (SessionStatus::Pointing, ["submit"]) => {
            if let Err(err) = machine.submit_points().await {
                println!("{err}");
            }
        }
        _ => println!("Unrecognised command."),
    }
    Outcome::Handled
}

fn index_len(line: &str) -> usize {
    line.find(char::is_whitespace).unwrap_or(line.len())
}

/// Prints the link instead of touching a system clipboard.
struct StdoutClipboard;

impl Clipboard for StdoutClipboard {
    fn write_text(&mut self, text: &str) -> io::Result<()> {
        println!("{text}");
        Ok(())
    }
}

fn render(machine: &SessionMachine, panel: Option<&OwnerPanel>) {
    let overlay = machine.overlay();
    if let Some((heading, detail)) = overlay.messages() {
        println!("== {heading} ==");
        if let Some(detail) = detail {
            println!("{detail}");
        }
        if matches!(overlay, Overlay::Waiting { .. }) {
            println!("{BOOKMARK_HINT}");
        }
    }

    match machine.view() {
        View::Error(message) => println!("{message}"),
        View::Expired => println!("{EXPIRED_TITLE}\n{EXPIRED_MESSAGE}\n{START_NEW_GAME}: scatter-client create"),
        View::IdentityPrompt => println!("Enter your phone number to join."),
        View::Playing {
            letter,
            show_owner_panel,
        } => {
            if let Some(letter) = letter {
                println!("Letter {letter} ({}s)", machine.remaining(Instant::now()));
                for (index, label) in machine.current_prompts() {
                    println!("  {index:>2}. {label}");
                }
            }
            if let (true, Some(panel)) = (show_owner_panel, panel) {
                println!(
                    "[owner] players: {} | expires {} | `players N`, `link`",
                    panel.pending_user_count(),
                    OwnerPanel::expiration_label(machine.session())
                );
                if let Some(notice) = panel.notice() {
                    println!("[owner] {}", notice.message);
                }
            }
        }
        View::Idle => {}
        View::Pointing => {
            if let Some(board) = machine.points_board() {
                for (key, entry) in board.entries().filter(|(_, entry)| !entry.locked) {
                    println!(
                        "  [{}] {} {}{}: {} ({} max)",
                        if entry.is_checked() { "x" } else { " " },
                        key.participant,
                        key.cell.letter,
                        key.cell.index,
                        entry.response.as_deref().unwrap_or("-"),
                        entry.computed
                    );
                }
                for (participant, total) in board.totals() {
                    println!("  {participant}: {total} points");
                }
            }
        }
        View::Winner { winners } => {
            let (heading, names) = winner_heading(&winners);
            println!("{heading} {names}");
        }
        View::GenericError => println!("{GENERIC_ERROR}"),
    }
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,scatter_client=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

mod display;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use lexdesk_client::{ChatSession, ClientConfig, HttpChatBackend, SendOutcome, SessionEvent};
use lexdesk_core::{CaseId, DocumentViewer};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "lexdesk", version, about = "Case chat and document search client")]
struct Cli {
    /// Base URL of the legal-database API.
    #[arg(long, env = "LEXDESK_API_URL", default_value = lexdesk_client::config::DEFAULT_BASE_URL)]
    api_url: String,

    /// Per-request timeout in seconds.
    #[arg(long, env = "LEXDESK_TIMEOUT_SECS", default_value_t = 60)]
    timeout_secs: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Chat with the AI assistant about a case.
    Chat {
        #[arg(long)]
        case_id: String,
    },
    /// Print an AI-generated summary of a case.
    Summary {
        #[arg(long)]
        case_id: String,
    },
    /// Search a case document (HTML) for a literal phrase.
    Search {
        file: PathBuf,
        query: String,
        /// Print the document with matches highlighted instead of snippets.
        #[arg(long)]
        highlight: bool,
        /// Characters of context shown either side of a match.
        #[arg(long, default_value_t = 40)]
        context: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
    tracing::info!("lexdesk v{}", env!("CARGO_PKG_VERSION"));

    let cli = Cli::parse();
    let config = ClientConfig::new(cli.api_url).with_timeout(Duration::from_secs(cli.timeout_secs));

    match cli.command {
        Command::Chat { case_id } => cmd_chat(&config, case_id.into()).await,
        Command::Summary { case_id } => cmd_summary(&config, case_id.into()).await,
        Command::Search {
            file,
            query,
            highlight,
            context,
        } => cmd_search(&file, &query, highlight, context).await,
    }
}

fn open_session(config: &ClientConfig, case_id: CaseId) -> anyhow::Result<ChatSession> {
    let backend = HttpChatBackend::new(config).context("building HTTP client")?;
    Ok(ChatSession::new(Arc::new(backend), case_id))
}

async fn cmd_chat(config: &ClientConfig, case_id: CaseId) -> anyhow::Result<()> {
    let session = open_session(config, case_id)?;
    let mut events = session.subscribe();
    let mut shown = 0usize;

    eprintln!(
        "Chatting about case {}. Commands: /summary, /reset, /quit",
        session.case_id()
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("reading stdin")? {
        match line.trim() {
            "/quit" | "/exit" => break,
            "/reset" => session.reset(),
            "/summary" => {
                session.generate_case_summary().await;
            }
            _ => {
                session.send_message(&line).await;
            }
        }
        drain_events(&session, &mut events, &mut shown);
    }

    Ok(())
}

/// Print whatever changed since the last drain: new assistant replies and
/// errors.
fn drain_events(
    session: &ChatSession,
    events: &mut broadcast::Receiver<SessionEvent>,
    shown: &mut usize,
) {
    loop {
        match events.try_recv() {
            Ok(SessionEvent::MessagesChanged { len }) => {
                let messages = session.messages();
                let end = len.min(messages.len());
                for message in messages.get(*shown..end).unwrap_or_default() {
                    display::print_reply(message);
                }
                *shown = (*shown).max(end);
            }
            Ok(SessionEvent::ErrorChanged(Some(error))) => display::print_error(&error),
            Ok(SessionEvent::Reset) => {
                *shown = 0;
                eprintln!("  (conversation reset)");
            }
            Ok(_) => {}
            Err(broadcast::error::TryRecvError::Lagged(_)) => {
                // Resync from the current history.
                let messages = session.messages();
                for message in messages.get(*shown..).unwrap_or_default() {
                    display::print_reply(message);
                }
                *shown = messages.len();
            }
            Err(_) => break,
        }
    }
}

async fn cmd_summary(config: &ClientConfig, case_id: CaseId) -> anyhow::Result<()> {
    let session = open_session(config, case_id)?;
    match session.generate_case_summary().await {
        SendOutcome::Replied => {
            if let Some(message) = session.messages().last() {
                println!("{}", message.content);
            }
            Ok(())
        }
        _ => bail!(
            "{}",
            session
                .last_error()
                .unwrap_or_else(|| "summary request did not complete".into())
        ),
    }
}

async fn cmd_search(
    file: &Path,
    query: &str,
    highlight: bool,
    context: usize,
) -> anyhow::Result<()> {
    let html = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("reading {}", file.display()))?;

    let mut viewer = DocumentViewer::new();
    viewer.open(file.display().to_string(), html);
    let search = viewer
        .search_mut()
        .context("document viewer did not open")?;
    search.set_query(query);

    if highlight {
        println!("{}", search.render_highlighted());
    } else {
        display::print_search_results(search, context);
    }

    viewer.close();
    Ok(())
}

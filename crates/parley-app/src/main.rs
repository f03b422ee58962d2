mod cli;
mod repl;

use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{reload, EnvFilter};

use parley_chat::{ChatBot, JsonFormatter, OutputFormatter, TextFormatter};
use parley_core::config::ParleyConfig;
use parley_storage::StatementStore;

use cli::CliArgs;
use repl::{parse_line, Command, HELP};

type AppResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Train the bot from a file with one utterance per line.
async fn train_from_file(bot: &Arc<ChatBot>, path: &Path) -> AppResult<usize> {
    let content = tokio::fs::read_to_string(path).await?;
    let lines: Vec<String> = content.lines().map(str::to_string).collect();
    let bot = Arc::clone(bot);
    let learned = tokio::task::spawn_blocking(move || bot.trainer().train(lines.as_slice())).await??;
    tracing::info!(path = %path.display(), learned, "Trained from file");
    Ok(learned)
}

async fn run_repl(
    bot: Arc<ChatBot>,
    session: Option<String>,
    formatter: Box<dyn OutputFormatter>,
    json: bool,
) -> AppResult<()> {
    let session_name = session
        .clone()
        .unwrap_or_else(|| bot.default_session().to_string());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    if !json {
        eprintln!("{} is listening. {}", bot.name(), HELP);
    }

    loop {
        let line = tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted, shutting down");
                break;
            }
            line = lines.next_line() => line?,
        };
        let Some(line) = line else {
            break;
        };

        match parse_line(&line) {
            Command::Nothing => {}
            Command::Quit => break,
            Command::Help => eprintln!("{}", HELP),
            Command::Unknown(cmd) => eprintln!("Unknown command '/{}'. {}", cmd, HELP),
            Command::History => match bot.conversation_history(&session_name) {
                Ok(history) if json => println!("{}", serde_json::to_string(&history)?),
                Ok(history) => {
                    for statement in history {
                        println!("{}", statement);
                    }
                }
                Err(e) => eprintln!("{}", e),
            },
            Command::Sessions => match bot.list_conversations() {
                Ok(sessions) if json => println!("{}", serde_json::to_string(&sessions)?),
                Ok(sessions) => {
                    for s in sessions {
                        println!("{}  {} turns  last {}", s.id, s.turn_count, s.last_turn_at);
                    }
                }
                Err(e) => eprintln!("{}", e),
            },
            Command::Reset => match bot.reset_conversations() {
                Ok(()) if !json => eprintln!("All conversations forgotten."),
                Ok(()) => {}
                Err(e) => eprintln!("{}", e),
            },
            Command::Say(text) => {
                let worker = Arc::clone(&bot);
                let session = session.clone();
                let result =
                    tokio::task::spawn_blocking(move || worker.get_response(text, session.as_deref()))
                        .await?;
                match result {
                    Ok(reply) => println!("{}", formatter.format(&reply)),
                    Err(e) => {
                        tracing::warn!(error = %e, "Failed to respond");
                        eprintln!("error: {}", e);
                    }
                }
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> AppResult<()> {
    let args = CliArgs::parse();

    // Tracing first so config loading can log. RUST_LOG wins over the flag
    // and the config file; without it the filter is swapped once the
    // config is known.
    let initial = args.log_level.as_deref().unwrap_or("info");
    let (filter, filter_handle) = reload::Layer::new(
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(initial)),
    );
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config_file = args.resolve_config_path();
    let mut config = ParleyConfig::load_or_default(&config_file);

    if std::env::var_os("RUST_LOG").is_none() {
        let level = args.resolve_log_level(&config.general.log_level);
        filter_handle.reload(EnvFilter::new(level))?;
    }

    if args.init_config {
        config.save(&config_file)?;
        eprintln!("Wrote configuration to {}", config_file.display());
        return Ok(());
    }

    tracing::info!("Starting Parley v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(path = %config_file.display(), "Configuration resolved");

    if args.read_only {
        config.engine.read_only = true;
    }

    let store = ChatBot::open_store(&config)?;
    let bot = Arc::new(ChatBot::new(&config, store)?);
    tracing::info!(
        statements = bot.store().count()?,
        read_only = bot.is_read_only(),
        "Corpus ready"
    );

    if let Some(ref path) = args.train {
        let learned = train_from_file(&bot, path).await?;
        if !args.json {
            eprintln!("Learned {} statements from {}", learned, path.display());
        }
    }

    let formatter: Box<dyn OutputFormatter> = if args.json {
        Box::new(JsonFormatter)
    } else {
        Box::new(TextFormatter::with_name(bot.name()))
    };

    run_repl(bot, args.session, formatter, args.json).await?;

    tracing::info!("Parley stopped");
    Ok(())
}

//! Social CLI - a command-line client for the social network.
//!
//! Each command is one "view": public ones (login, register) talk to the
//! server directly, protected ones (feed, profile) pass through the route
//! guard first and get sent to login when the session is gone.

mod app;
mod views;

use std::io;
use std::process::ExitCode;

use anyhow::Result;
use tracing::{debug, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use app::App;
use social_core::Config;

/// If set, logs are also written to a daily rolling file in this directory
const ENV_LOG_DIR: &str = "SOCIAL_LOG_DIR";

/// Log file prefix inside `SOCIAL_LOG_DIR`
const LOG_FILE_PREFIX: &str = "social.log";

const USAGE: &str = "\
Usage: social <command> [args]

Commands:
  login [email]              Sign in (password from SOCIAL_PASSWORD or prompt)
  logout                     Forget the stored session
  status                     Show who is signed in
  register <username> <email>
                             Create an account
  feed                       Show the latest posts
  post <text...>             Publish a post
  profile                    Show your profile
  bio <text...>              Replace your bio

Environment:
  SOCIAL_API_URL             API base URL (default http://localhost:8000/api)
  SOCIAL_STORAGE             Credential storage: file, keyring or memory
  SOCIAL_LOG_DIR             Also write logs to this directory
  RUST_LOG                   Log filter (default warn)";

/// Initialize the tracing subscriber for logging.
/// The returned guard must live until exit so the file writer flushes.
fn init_tracing() -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match std::env::var(ENV_LOG_DIR) {
        Ok(dir) if !dir.trim().is_empty() => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(fmt::layer().with_writer(writer).with_ansi(false)), Some(guard))
        }
        _ => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let _log_guard = init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = args.first() else {
        eprintln!("{}", USAGE);
        return Ok(ExitCode::FAILURE);
    };
    let rest = &args[1..];

    let config = Config::load()?;
    debug!(api = %config.api_base_url, storage = ?config.storage, "Config loaded");
    info!(command = %command, "Social CLI starting");

    let mut app = App::new(config)?;

    let ok = match (command.as_str(), rest) {
        ("login", [email]) => app.login(Some(email.as_str())).await?,
        ("login", []) => app.login(None).await?,
        ("logout", []) => app.logout()?,
        ("status", []) => app.status().await?,
        ("register", [username, email]) => app.register(username, email).await?,
        ("feed", []) => app.feed().await?,
        ("post", words) if !words.is_empty() => app.post(&words.join(" ")).await?,
        ("profile", []) => app.profile().await?,
        ("bio", words) if !words.is_empty() => app.bio(&words.join(" ")).await?,
        ("help" | "--help" | "-h", _) => {
            println!("{}", USAGE);
            true
        }
        _ => {
            eprintln!("{}", USAGE);
            false
        }
    };

    app.shutdown();
    Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

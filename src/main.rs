mod analytics;
mod config;
mod export;
mod models;
mod run;
mod session;
mod store;

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use config::{Backend, Config};
use session::Session;
use store::{RestStore, SqliteStore, Unconfigured};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (user_flag, command) = run::split_user_flag(&args)?;

    let config = Config::from_env()?;
    let mut session = open_session(&config)?;
    if let Some(user) = user_flag {
        session.sign_in(user);
    }
    if session.user_id().is_none() {
        warn!(
            "no user id; set {} or pass --user <id> to see your records",
            config::USER_ID
        );
    }

    let today = chrono::Local::now().date_naive();
    run::as_cli(command, &session, today).await
}

fn open_session(config: &Config) -> Result<Session> {
    let user_id = config.user_id.clone();
    let session = match config.backend()? {
        Backend::Rest { url, key, timeout } => {
            Session::new(Arc::new(RestStore::new(url, key, timeout)?), user_id)
        }
        Backend::Sqlite(path) => {
            if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
                std::fs::create_dir_all(dir).with_context(|| {
                    format!("Failed to create data directory: {}", dir.display())
                })?;
            }
            Session::new(Arc::new(SqliteStore::open(&path)?), user_id)
        }
        Backend::Unconfigured => {
            warn!(
                "{} and {} are not set; nothing will be saved",
                config::STORE_URL,
                config::STORE_KEY
            );
            Session::new(Arc::new(Unconfigured), user_id)
        }
    };
    Ok(session)
}

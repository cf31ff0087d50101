//! Tavern Engine - line command driver.
//!
//! Reads `<user_key> <command> [args...]` lines from stdin and writes one
//! JSON response per line to stdout. Logs go to stderr.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tavern_engine::api::{self, Response};
use tavern_engine::infrastructure::config::EngineConfig;
use tavern_engine::App;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment from repo root when run through cargo.
    load_dotenv_from_repo_root();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tavern_engine=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!("Starting Tavern Engine");

    let config = EngineConfig::from_env();
    let app = Arc::new(App::new(config));

    // Drop idle users from the limiter and lock tables once per command window.
    let pruner = {
        let app = app.clone();
        tokio::spawn(async move {
            let period = app.config.command_rate_limit.window.max(Duration::from_secs(1));
            let mut interval = tokio::time::interval(period);
            interval.tick().await;
            loop {
                interval.tick().await;
                app.rate_limits.commands.prune();
                app.rate_limits.mentions.prune();
                app.sheet_locks.prune();
                tracing::trace!(
                    command_users = app.rate_limits.commands.tracked_users(),
                    mention_users = app.rate_limits.mentions.tracked_users(),
                    sheet_locks = app.sheet_locks.len(),
                    "Pruned idle limiter and lock entries"
                );
            }
        })
    };

    // Requests run concurrently; one writer keeps output lines whole.
    let (tx, mut rx) = mpsc::channel::<Response>(64);
    let writer = tokio::spawn(async move {
        let mut stdout = tokio::io::stdout();
        while let Some(response) = rx.recv().await {
            let mut line = serde_json::to_string(&response)?;
            line.push('\n');
            stdout.write_all(line.as_bytes()).await?;
            stdout.flush().await?;
        }
        anyhow::Ok(())
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut seq: u64 = 0;
    let mut tasks = JoinSet::new();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        seq += 1;

        // Reap finished commands so the set only holds in-flight work.
        while let Some(joined) = tasks.try_join_next() {
            if let Err(e) = joined {
                tracing::warn!(error = %e, "Command task failed");
            }
        }

        match api::parse_line(&line) {
            Ok(parsed) => {
                let app = app.clone();
                let tx = tx.clone();
                tasks.spawn(async move {
                    let response = api::execute(&app, seq, &parsed).await;
                    if tx.send(response).await.is_err() {
                        tracing::warn!(seq = seq, "Output closed, dropping response");
                    }
                });
            }
            Err(e) => {
                tracing::debug!(seq = seq, error = %e, "Unparseable command line");
                tx.send(Response::bad_command(seq, &e)).await?;
            }
        }
    }

    while let Some(joined) = tasks.join_next().await {
        if let Err(e) = joined {
            tracing::warn!(error = %e, "Command task failed");
        }
    }
    drop(tx);
    writer.await??;
    pruner.abort();

    tracing::info!(commands = seq, "Input closed, shutting down");
    Ok(())
}

fn load_dotenv_from_repo_root() {
    let repo_root = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..");

    // Prefer local overrides, then fall back to the working directory.
    for filename in [".env.local", ".env"] {
        let path = repo_root.join(filename);
        if path.exists() {
            let _ = dotenvy::from_path(path);
        }
    }
    let _ = dotenvy::dotenv();
}

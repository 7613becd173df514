use std::sync::Arc;

use anyhow::{Context, Result};
use colored::Colorize;

use copilot_history_sessions::SessionHistory;

use crate::api;
use crate::config::HistoryConfig;

pub async fn handle_serve_command(
    history: SessionHistory,
    config: &HistoryConfig,
    port: u16,
) -> Result<()> {
    if !history.store().exists() {
        tracing::warn!(
            dir = %history.store().sessions_dir().display(),
            "session directory does not exist yet"
        );
    }

    let router = api::create_router(Arc::new(history), config);

    let addr = format!("127.0.0.1:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind API server to {}", addr))?;

    eprintln!();
    eprintln!(
        "  {} {}",
        "->".bright_green(),
        format!("Listening on http://{}", addr).bold()
    );
    eprintln!("  {} Press {} to stop", "->".dimmed(), "Ctrl+C".bold());
    eprintln!();

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("API server error")
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    eprintln!("\nShutting down...");
}

//! Dashboard session client
//!
//! 1. Loads configuration (`DASHBOARD_CONFIG`, default `config.yaml` if present)
//! 2. Restores or opens a session (`DASHBOARD_USERNAME` / `DASHBOARD_PASSWORD`)
//! 3. Refreshes the active account and its broker snapshot
//! 4. Logs notifications until Ctrl+C

use std::path::PathBuf;

use anyhow::Context;
use tokio::signal;
use tokio::sync::broadcast::error::RecvError;
use tracing::{error, info, warn};

use dashboard_session::config::constants::DASHBOARD_PATH;
use dashboard_session::config::{self, logging::init_logging, ClientConfig};
use dashboard_session::stores::NotificationEvent;
use dashboard_session::DashboardClient;

fn load_client_config() -> anyhow::Result<ClientConfig> {
    let explicit = std::env::var("DASHBOARD_CONFIG").ok().map(PathBuf::from);
    let path = explicit.clone().unwrap_or_else(|| PathBuf::from("config.yaml"));

    let config = if explicit.is_some() || path.exists() {
        info!(path = %path.display(), "Loading configuration");
        config::load_config(&path)?
    } else {
        info!("No configuration file, using defaults");
        ClientConfig::default()
    };

    Ok(config.with_env_overrides()?)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_logging();

    let config = load_client_config().context("configuration failed")?;
    let app = DashboardClient::bootstrap(&config).context("client setup failed")?;

    let mut events = app.notifications.subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(NotificationEvent::Added(n)) => {
                    info!(id = n.id, severity = ?n.severity, details = ?n.details, "{}", n.message)
                }
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "Notification log lagging"),
                Err(RecvError::Closed) => break,
            }
        }
    });

    if !app.auth.is_authenticated().await {
        let username = std::env::var("DASHBOARD_USERNAME").ok();
        let password = std::env::var("DASHBOARD_PASSWORD").ok();
        match (username, password) {
            (Some(username), Some(password)) => {
                if let Err(e) = app.auth.login(&username, &password).await {
                    error!(error = %e, "Login failed");
                }
            }
            _ => warn!("No persisted session and no DASHBOARD_USERNAME/DASHBOARD_PASSWORD"),
        }
    } else {
        app.accounts.fetch_active_account().await;
        app.accounts.fetch_accounts().await;
    }

    let landed = app.router.navigate(DASHBOARD_PATH).await;
    info!(route = %landed, "Navigated");

    if app.auth.is_authenticated().await {
        app.accounts.fetch_account_info().await;

        let state = app.accounts.snapshot().await;
        info!(
            active = %app.accounts.active_account_name().await,
            accounts = state.accounts.len(),
            info_fields = state.account_info.as_ref().map_or(0, |i| i.0.len()),
            info_error = ?state.info_error,
            "Account state"
        );
    }

    info!("Session ready. Press Ctrl+C to exit.");
    match signal::ctrl_c().await {
        Ok(()) => info!("[SHUTDOWN] Clean exit"),
        Err(err) => error!(error = %err, "Failed to listen for Ctrl+C signal"),
    }
    Ok(())
}

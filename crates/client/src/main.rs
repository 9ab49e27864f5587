//! Gipie rewards client binary.
//!
//! Composition root: loads configuration, sets up logging, builds the
//! runtime and keeps it alive until Ctrl-C. Connection, balance and
//! transaction activity is reported through the log.
//!
//! ```bash
//! GIPIE_AUTO_CONNECT=true cargo run -p gipie-client
//! ```

use anyhow::Result;
use client_bootstrap::{AppConfig, ClientBuilder, setup_logging};
use game_rewards::{DailyClaimScreen, StakingScreen};
use runtime::{ConnectionStatus, ReconnectOutcome, Topic};
use tokio::sync::broadcast::error::RecvError;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // 1. Configuration and logging
    let config = AppConfig::from_env()?;
    let _log_guard = setup_logging(&config.log_dir()?)?;
    tracing::info!("Starting Gipie client");

    // 2. Runtime, plus the wallet's account watcher
    let setup = ClientBuilder::new(config).build().await?;
    let watcher = setup.wallet.spawn_watcher();
    let handle = setup.runtime.handle();

    match setup.runtime.reconnect_outcome() {
        ReconnectOutcome::Restored(address) => tracing::info!("Session restored for {}", address),
        outcome => {
            tracing::info!(?outcome, "No session restored");
            if setup.config.auto_connect {
                match handle.connect().await {
                    Ok(address) => tracing::info!("Connected {}", address),
                    Err(e) => tracing::warn!("Connect failed: {}", e),
                }
            }
        }
    }

    // Summary screens keep their status fresh while connected
    let daily = DailyClaimScreen::new(handle.clone());
    let staking = StakingScreen::new(handle.clone());
    let mut daily_status = daily.status();
    let mut staking_status = staking.status();

    let mut connection = handle.watch_connection();
    let mut balances = handle.watch_balances();
    let mut tx_events = handle.subscribe(Topic::Transaction);
    let mut last_daily: Option<String> = None;
    let mut last_stake: Option<String> = None;

    // 3. Report until interrupted
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted");
                break;
            }
            Ok(()) = connection.changed() => {
                let snapshot = connection.borrow_and_update().clone();
                match snapshot.status {
                    ConnectionStatus::Connected => tracing::info!(
                        address = ?snapshot.address,
                        chain_id = ?snapshot.chain_id,
                        "Wallet connected"
                    ),
                    status => tracing::info!(?status, "Wallet connection changed"),
                }
            }
            Ok(()) = balances.changed() => {
                let balance = balances.borrow_and_update().clone();
                tracing::info!(token = %balance.token, native = %balance.native, "Balances");
            }
            Ok(()) = daily_status.changed() => {
                let summary = daily_status.borrow_and_update().status.as_ref().map(|s| {
                    s.claim_blocker().unwrap_or_else(|| "available".to_string())
                });
                if summary.is_some() && summary != last_daily {
                    tracing::info!("Daily claim: {}", summary.as_deref().unwrap_or_default());
                }
                last_daily = summary;
            }
            Ok(()) = staking_status.changed() => {
                let summary = staking_status
                    .borrow_and_update()
                    .status
                    .as_ref()
                    .filter(|s| s.is_active())
                    .map(|s| s.remaining_display());
                if summary.is_some() && summary != last_stake {
                    tracing::info!("Stake locked for {}", summary.as_deref().unwrap_or_default());
                }
                last_stake = summary;
            }
            event = tx_events.recv() => match event {
                Ok(event) => tracing::info!(?event, "Transaction"),
                Err(RecvError::Lagged(n)) => tracing::warn!("Missed {} transaction events", n),
                Err(RecvError::Closed) => break,
            },
        }
    }

    watcher.abort();
    setup.runtime.shutdown().await?;
    tracing::info!("Client shutdown complete");
    Ok(())
}

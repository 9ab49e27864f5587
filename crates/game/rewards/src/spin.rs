//! Daily prize wheel.

use std::sync::Arc;

use async_trait::async_trait;
use client_blockchain_core::{TxError, U256};
use client_blockchain_evm::contracts::IDailySpin;
use runtime::{
    Clock, Cooldown, CooldownStyle, HistoryLog, PeriodicStatus, RuntimeHandle, StatusSource,
    StatusView,
};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{info, warn};

use crate::error::ScreenError;
use crate::screen::{Screen, TxOptions, read, status_signer, to_u64};

pub const SPIN_COOLDOWN_SECS: u64 = 86_400;
pub const SPIN_GAS: u64 = 300_000;
pub const SPIN_CLAIM_GAS: u64 = 100_000;
pub const SPIN_HISTORY: &str = "spinHistory";

/// Wheel segments, indexed by `getPrize`.
pub const WHEEL: [&str; 8] = [
    "Try Again",
    "0.002 GIPIE",
    "0.005 GIPIE",
    "0.01 GIPIE",
    "0.02 GIPIE",
    "0.03 GIPIE",
    "0.05 GIPIE",
    "0.1 GIPIE",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpinEntry {
    pub prize: String,
    /// Unix milliseconds
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpinStatus {
    pub last_spin: u64,
    pub pending_rewards: U256,
    pub now: u64,
    pub history: Vec<SpinEntry>,
}

impl SpinStatus {
    pub fn cooldown(&self) -> Cooldown {
        Cooldown::from_last_action(self.last_spin, SPIN_COOLDOWN_SECS, self.now)
    }
}

pub fn wheel_label(index: u64) -> Option<&'static str> {
    usize::try_from(index).ok().and_then(|i| WHEEL.get(i).copied())
}

struct SpinSource {
    handle: RuntimeHandle,
    history: HistoryLog<SpinEntry>,
}

#[async_trait]
impl StatusSource for SpinSource {
    type Status = SpinStatus;

    async fn fetch(&self) -> Result<SpinStatus, TxError> {
        let signer = status_signer(&self.handle)?;
        let user = signer.address();
        let info = read(
            &signer,
            self.handle.contracts().daily_spin,
            IDailySpin::getUserSpinInfoCall { user },
        )
        .await?;

        let history = self.history.load(user).unwrap_or_else(|e| {
            warn!("Failed to read spin history: {}", e);
            Vec::new()
        });

        Ok(SpinStatus {
            last_spin: to_u64(info.lastSpinTimestamp),
            pending_rewards: info.pendingRewards,
            now: self.handle.clock().now_secs(),
            history,
        })
    }

    fn cooldown(&self, status: &SpinStatus) -> Cooldown {
        status.cooldown()
    }
}

pub struct SpinScreen {
    screen: Screen,
    history: HistoryLog<SpinEntry>,
    status: PeriodicStatus<SpinSource>,
}

impl SpinScreen {
    pub fn new(handle: RuntimeHandle) -> Self {
        let history = HistoryLog::new(Arc::clone(handle.store()), SPIN_HISTORY);
        let source = Arc::new(SpinSource {
            handle: handle.clone(),
            history: history.clone(),
        });
        let status = PeriodicStatus::follow(source, handle.watch_connection());
        Self {
            screen: Screen::new(handle),
            history,
            status,
        }
    }

    pub fn status(&self) -> watch::Receiver<StatusView<SpinStatus>> {
        self.status.subscribe()
    }

    pub async fn refresh(&self) -> Option<SpinStatus> {
        self.status.refresh().await
    }

    pub fn is_busy(&self) -> bool {
        self.screen.is_busy()
    }

    /// Spin once and record the landed segment.
    pub async fn spin(&self) -> Result<SpinEntry, ScreenError> {
        let _busy = self.screen.begin()?;
        let signer = self.screen.signer()?;
        let view = self.status.current();
        if view.status.is_none() {
            return Err(ScreenError::not_ready("Status is still loading."));
        }
        if !view.cooldown.is_ready() {
            return Err(ScreenError::not_ready(format!(
                "Next spin in {}",
                view.cooldown.display(CooldownStyle::Compact)
            )));
        }

        let wheel = self.screen.handle().contracts().daily_spin;
        self.screen
            .send(
                &signer,
                wheel,
                IDailySpin::spinCall {},
                TxOptions::new("Spin", "Spin failed.").gas(SPIN_GAS),
            )
            .await?;

        let user = signer.address();
        let prize = match read(&signer, wheel, IDailySpin::getPrizeCall { user }).await {
            Ok(ret) => {
                let index = to_u64(ret._0);
                wheel_label(index).ok_or_else(|| {
                    ScreenError::Read(TxError::Unknown(format!("wheel index {index} out of range")))
                })
            }
            Err(e) => Err(ScreenError::Read(e)),
        };
        let prize = match prize {
            Ok(prize) => prize,
            Err(e) => {
                // The spin is mined either way; show the new cooldown.
                self.status.refresh().await;
                return Err(e);
            }
        };

        let entry = SpinEntry {
            prize: prize.to_string(),
            timestamp: self.screen.handle().clock().now_millis(),
        };
        info!(prize, "Wheel landed");
        if let Err(e) = self.history.push(user, entry.clone()) {
            warn!("Failed to save spin history: {}", e);
        }
        self.status.refresh().await;
        Ok(entry)
    }

    pub async fn claim(&self) -> Result<(), ScreenError> {
        let _busy = self.screen.begin()?;
        let signer = self.screen.signer()?;
        let pending = self
            .status
            .current()
            .status
            .map(|s| s.pending_rewards)
            .unwrap_or_default();
        if pending.is_zero() {
            return Err(ScreenError::not_ready("No rewards to claim."));
        }

        let result = self
            .screen
            .send(
                &signer,
                self.screen.handle().contracts().daily_spin,
                IDailySpin::claimCall {},
                TxOptions::new("Claim spin rewards", "Claim failed.").gas(SPIN_CLAIM_GAS),
            )
            .await;
        self.status.refresh().await;
        result?;
        Ok(())
    }
}

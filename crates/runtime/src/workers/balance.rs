//! Balance polling worker.
//!
//! While connected, reads the platform token and native balances of the
//! connected address immediately and then on a fixed interval. While
//! disconnected it idles without touching the network; the connection
//! manager pins balances to zero.

use client_blockchain_core::{Address, ChainReader, U256, WalletProvider};
use client_blockchain_evm::contracts::IGipieToken;
use tokio::time::{self, Duration, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::connection::{BalanceSnapshot, ConnectionManager};
use crate::contract::call_view;

/// Default refresh period.
pub const BALANCE_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Background worker keeping [`BalanceSnapshot`]s fresh.
pub struct BalancePoller {
    manager: ConnectionManager,

    /// Platform token contract
    token: Address,

    poll_interval: Duration,
}

impl BalancePoller {
    pub fn new(manager: ConnectionManager, token: Address) -> Self {
        Self {
            manager,
            token,
            poll_interval: BALANCE_POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Main worker loop. Returns when the connection manager is dropped.
    pub async fn run(self) {
        let mut snapshots = self.manager.subscribe();

        loop {
            let (identity, signer) = {
                let snapshot = snapshots.borrow_and_update();
                (snapshot.identity(), snapshot.signer.clone())
            };

            let (Some((address, chain_id)), Some(signer)) = (identity, signer) else {
                if snapshots.changed().await.is_err() {
                    return;
                }
                continue;
            };

            info!(address = %address, chain_id, "Balance polling started");
            let mut ticker = time::interval(self.poll_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let balances = fetch_balances(signer.provider().as_ref(), self.token, address).await;
                        self.manager.publish_balances(address, balances).await;
                    }
                    changed = snapshots.changed() => {
                        if changed.is_err() {
                            return;
                        }
                        if snapshots.borrow_and_update().identity() != identity {
                            debug!(address = %address, "Connection changed, restarting balance polling");
                            break;
                        }
                    }
                }
            }
        }
    }
}

/// Read both balances. Each read fails independently and degrades to zero.
pub async fn fetch_balances(
    provider: &dyn WalletProvider,
    token: Address,
    owner: Address,
) -> BalanceSnapshot {
    let (token_balance, native_balance) = tokio::join!(
        call_view(provider, token, IGipieToken::balanceOfCall { account: owner }),
        provider.balance(owner),
    );

    let token_wei = match token_balance {
        Ok(ret) => ret._0,
        Err(e) => {
            warn!(owner = %owner, "Token balance read failed: {}", e);
            U256::ZERO
        }
    };
    let native_wei = match native_balance {
        Ok(wei) => wei,
        Err(e) => {
            warn!(owner = %owner, "Native balance read failed: {}", e);
            U256::ZERO
        }
    };

    BalanceSnapshot::from_wei(token_wei, native_wei)
}

//! Daily dig: three digs per period on a 5x5 field.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use client_blockchain_core::{DEFAULT_DECIMALS, TxError, U256, format_units};
use client_blockchain_evm::contracts::{IDailyDig, IGipieToken};
use runtime::{Cooldown, CooldownStyle, PeriodicStatus, RuntimeHandle, StatusSource, StatusView};
use tokio::sync::{Mutex, watch};
use tracing::{info, warn};

use crate::error::ScreenError;
use crate::screen::{
    IdentityReset, Screen, TxOptions, decode_event, player_event_filter, read, status_signer,
    to_u64,
};

pub const DIG_GRID_SIZE: u8 = 5;
pub const MAX_DIGS: u64 = 3;
pub const DIG_GAS: u64 = 200_000;

/// Possible treasure amounts, in thousandths of a token.
pub const DIG_PRIZES_MILLI: [u64; 8] = [5, 10, 25, 50, 100, 250, 500, 1_000];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigStatus {
    pub digs_left: u64,
    pub time_until_reset: u64,
    pub pending_rewards: U256,
    pub token_balance: U256,
}

impl DigStatus {
    pub fn cooldown(&self) -> Cooldown {
        if self.digs_left == 0 {
            Cooldown::from_remaining(self.time_until_reset)
        } else {
            Cooldown::READY
        }
    }

    pub fn can_claim(&self) -> bool {
        !self.pending_rewards.is_zero()
    }

    /// Out of digs with a reset pending: the field from the last period is
    /// stale.
    pub fn period_over(&self) -> bool {
        self.digs_left == 0 && self.time_until_reset > 0
    }
}

/// What a dug cell turned up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigOutcome {
    Treasure(U256),
    Empty,
    /// Mined, but no `DigPerformed` event was found
    Unconfirmed,
}

impl DigOutcome {
    pub fn message(&self) -> String {
        match self {
            DigOutcome::Treasure(amount) => format!(
                "You found {} GIPIE!",
                format_units(*amount, DEFAULT_DECIMALS)
            ),
            DigOutcome::Empty => "Nothing here. Try another spot!".to_string(),
            DigOutcome::Unconfirmed => {
                "Dig successful, but event not received. Refresh to see the result.".to_string()
            }
        }
    }
}

/// Dug cells keyed by `(row, col)`.
pub type Grid = HashMap<(u8, u8), DigOutcome>;

struct DigSource {
    handle: RuntimeHandle,
    grid: Arc<Mutex<Grid>>,
}

#[async_trait]
impl StatusSource for DigSource {
    type Status = DigStatus;

    async fn fetch(&self) -> Result<DigStatus, TxError> {
        let signer = status_signer(&self.handle)?;
        let player = signer.address();
        let contracts = self.handle.contracts();

        let (period, balance) = tokio::join!(
            read(&signer, contracts.daily_dig, IDailyDig::getPlayerPeriodStatusCall { player }),
            read(&signer, contracts.token, IGipieToken::balanceOfCall { account: player }),
        );
        let period = period?;
        let token_balance = match balance {
            Ok(ret) => ret._0,
            Err(e) => {
                warn!("Token balance read failed: {}", e);
                U256::ZERO
            }
        };

        let status = DigStatus {
            digs_left: to_u64(period.digsLeft),
            time_until_reset: to_u64(period.timeUntilNextReset),
            pending_rewards: period.pendingRewards,
            token_balance,
        };
        if status.period_over() {
            self.grid.lock().await.clear();
        }
        Ok(status)
    }

    fn cooldown(&self, status: &DigStatus) -> Cooldown {
        status.cooldown()
    }
}

pub struct DigScreen {
    screen: Screen,
    status: PeriodicStatus<DigSource>,
    /// Cells dug this period
    grid: Arc<Mutex<Grid>>,
    _reset: IdentityReset,
}

impl DigScreen {
    pub fn new(handle: RuntimeHandle) -> Self {
        let grid = Arc::new(Mutex::new(Grid::new()));
        let source = Arc::new(DigSource {
            handle: handle.clone(),
            grid: Arc::clone(&grid),
        });
        let status = PeriodicStatus::follow(source, handle.watch_connection());
        let reset = IdentityReset::spawn(Arc::clone(&grid), handle.watch_connection());
        Self {
            screen: Screen::new(handle),
            status,
            grid,
            _reset: reset,
        }
    }

    pub fn status(&self) -> watch::Receiver<StatusView<DigStatus>> {
        self.status.subscribe()
    }

    pub async fn refresh(&self) -> Option<DigStatus> {
        self.status.refresh().await
    }

    pub async fn revealed(&self) -> Grid {
        self.grid.lock().await.clone()
    }

    pub fn is_busy(&self) -> bool {
        self.screen.is_busy()
    }

    pub async fn dig(&self, row: u8, col: u8) -> Result<DigOutcome, ScreenError> {
        let _busy = self.screen.begin()?;
        let signer = self.screen.signer()?;
        if row >= DIG_GRID_SIZE || col >= DIG_GRID_SIZE {
            return Err(ScreenError::not_ready("Invalid dig position."));
        }
        let view = self.status.current();
        let Some(status) = view.status else {
            return Err(ScreenError::not_ready("Status is still loading."));
        };
        if status.digs_left == 0 {
            return Err(ScreenError::not_ready(format!(
                "No digs left! Wait {} for next period.",
                view.cooldown.display(CooldownStyle::MinSec)
            )));
        }
        if self.grid.lock().await.contains_key(&(row, col)) {
            return Err(ScreenError::not_ready("You already dug here!"));
        }

        let dig = self.screen.handle().contracts().daily_dig;
        let receipt = self
            .screen
            .send(
                &signer,
                dig,
                IDailyDig::digCall {
                    row: U256::from(row),
                    col: U256::from(col),
                },
                TxOptions::new("Dig", "Dig failed.").gas(DIG_GAS),
            )
            .await?;

        let player = signer.address();
        let filter = player_event_filter::<IDailyDig::DigPerformed>(dig, &receipt, player);
        let (row_u, col_u) = (U256::from(row), U256::from(col));
        let event = self
            .screen
            .handle()
            .correlator()
            .find(signer.provider().as_ref(), &filter, |log| {
                decode_event::<IDailyDig::DigPerformed>(log)
                    .filter(|e| e.row == row_u && e.col == col_u)
            })
            .await;

        let outcome = match event {
            Some(e) if e.foundPrize => DigOutcome::Treasure(e.prizeAmount),
            Some(_) => DigOutcome::Empty,
            None => {
                warn!(row, col, "DigPerformed event not found");
                DigOutcome::Unconfirmed
            }
        };
        info!(row, col, outcome = ?outcome, "Dig confirmed");

        self.grid.lock().await.insert((row, col), outcome);
        self.status.refresh().await;
        Ok(outcome)
    }

    /// Claim pending treasure and clear the field.
    pub async fn claim_rewards(&self) -> Result<U256, ScreenError> {
        let _busy = self.screen.begin()?;
        let signer = self.screen.signer()?;
        let pending = self
            .status
            .current()
            .status
            .map(|s| s.pending_rewards)
            .unwrap_or_default();
        if pending.is_zero() {
            return Err(ScreenError::not_ready("No rewards available to claim."));
        }

        let result = self
            .screen
            .send(
                &signer,
                self.screen.handle().contracts().daily_dig,
                IDailyDig::claimRewardsCall {},
                TxOptions::new("Claim dig rewards", "Claim failed.").gas(DIG_GAS),
            )
            .await;
        if result.is_ok() {
            self.grid.lock().await.clear();
        }
        self.status.refresh().await;
        result?;

        info!(amount = %format_units(pending, DEFAULT_DECIMALS), "Dig rewards claimed");
        Ok(pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{connected, event_log, rets};
    use alloy_sol_types::SolCall;
    use client_blockchain_core::{MockWallet, tokens};
    use client_blockchain_evm::ContractAddresses;

    fn script(wallet: &MockWallet, digs_left: u64, pending: U256) {
        wallet.on_call(
            ContractAddresses::default().daily_dig,
            IDailyDig::getPlayerPeriodStatusCall::SELECTOR,
            rets((U256::from(digs_left), U256::from(1_500u64), pending)),
        );
    }

    #[test]
    fn cooldown_only_when_out_of_digs() {
        let mut status = DigStatus {
            digs_left: 2,
            time_until_reset: 900,
            pending_rewards: U256::ZERO,
            token_balance: U256::ZERO,
        };
        assert!(status.cooldown().is_ready());
        status.digs_left = 0;
        assert_eq!(status.cooldown().secs(), 900);
    }

    #[tokio::test(start_paused = true)]
    async fn dig_reveals_treasure_from_event() {
        let fixture = connected(|wallet, _| script(wallet, MAX_DIGS, U256::ZERO)).await;
        let screen = DigScreen::new(fixture.handle());
        let status = screen.refresh().await.expect("status");
        assert_eq!(status.token_balance, U256::ZERO);

        let prize = U256::from(DIG_PRIZES_MILLI[4]) * U256::from(10u8).pow(U256::from(15u8));
        let event = IDailyDig::DigPerformed {
            player: fixture.user,
            row: U256::from(2u8),
            col: U256::from(3u8),
            foundPrize: true,
            prizeAmount: prize,
        };
        fixture
            .wallet
            .emit_log_on_next_tx(event_log(ContractAddresses::default().daily_dig, &event), 0);

        let outcome = screen.dig(2, 3).await.expect("dig succeeds");
        assert_eq!(outcome, DigOutcome::Treasure(prize));
        assert_eq!(outcome.message(), "You found 0.1 GIPIE!");
        assert_eq!(fixture.wallet.sent_transactions()[0].gas_limit, Some(DIG_GAS));

        assert_eq!(
            screen.dig(2, 3).await,
            Err(ScreenError::not_ready("You already dug here!"))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn out_of_digs_waits_for_next_period() {
        let fixture = connected(|wallet, _| script(wallet, 0, U256::ZERO)).await;
        let screen = DigScreen::new(fixture.handle());
        screen.refresh().await;

        assert_eq!(
            screen.dig(0, 0).await,
            Err(ScreenError::not_ready("No digs left! Wait 25m 0s for next period."))
        );
        assert_eq!(
            screen.claim_rewards().await,
            Err(ScreenError::not_ready("No rewards available to claim."))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn new_period_starts_with_a_fresh_field() {
        let fixture = connected(|wallet, _| script(wallet, MAX_DIGS, U256::ZERO)).await;
        let screen = DigScreen::new(fixture.handle());
        screen.refresh().await;
        screen.dig(0, 0).await.expect("dig");

        script(&fixture.wallet, 0, U256::ZERO);
        let status = screen.refresh().await.expect("status");
        assert!(status.period_over());
        assert!(screen.revealed().await.is_empty());

        script(&fixture.wallet, MAX_DIGS, U256::ZERO);
        screen.refresh().await;
        screen.dig(0, 0).await.expect("same cell in the next period");
    }

    #[tokio::test(start_paused = true)]
    async fn disconnect_clears_the_field() {
        let fixture = connected(|wallet, _| script(wallet, MAX_DIGS, U256::ZERO)).await;
        let screen = DigScreen::new(fixture.handle());
        screen.refresh().await;
        screen.dig(1, 1).await.expect("dig");
        assert_eq!(screen.revealed().await.len(), 1);

        fixture.handle().disconnect().await;
        tokio::time::sleep(std::time::Duration::from_millis(1)).await;
        assert!(screen.revealed().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn claim_clears_the_field() {
        let fixture = connected(|wallet, _| script(wallet, MAX_DIGS, tokens(1))).await;
        let screen = DigScreen::new(fixture.handle());
        screen.refresh().await;

        screen.dig(0, 0).await.expect("dig");
        assert_eq!(screen.revealed().await.len(), 1);

        assert_eq!(screen.claim_rewards().await, Ok(tokens(1)));
        assert!(screen.revealed().await.is_empty());
    }
}

//! Fixed-term staking with an early withdrawal penalty.

use std::sync::Arc;

use async_trait::async_trait;
use client_blockchain_core::{DEFAULT_DECIMALS, TxError, U256, format_units};
use client_blockchain_evm::contracts::{IGipieToken, IStaking};
use runtime::{
    Clock, Cooldown, CooldownStyle, PeriodicStatus, RuntimeHandle, StatusSource, StatusView,
};
use tokio::sync::watch;
use tracing::info;

use crate::error::ScreenError;
use crate::screen::{Screen, TxOptions, read, status_signer, to_u64};

const SECONDS_PER_DAY: u64 = 86_400;
const BPS: u64 = 10_000;

/// Lock durations in days and their APY in basis points.
pub const APY_TABLE: [(u64, u64); 5] = [
    (15, 500),
    (30, 1_000),
    (60, 1_500),
    (180, 2_500),
    (360, 4_000),
];

/// Early withdrawal penalty in basis points (2.5%).
pub const EARLY_WITHDRAW_PENALTY_BPS: u64 = 250;

pub fn apy_bps(days: u64) -> Option<u64> {
    APY_TABLE
        .iter()
        .find_map(|&(d, bps)| (d == days).then_some(bps))
}

/// `amount * apy * days / 365`, or `None` for a duration not on offer.
pub fn estimated_reward(amount: U256, days: u64) -> Option<U256> {
    let bps = apy_bps(days)?;
    Some(amount * U256::from(bps) * U256::from(days) / U256::from(BPS * 365))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StakingStatus {
    pub staked: U256,
    pub start_time: u64,
    pub end_time: u64,
    /// Tokens the staking contract may pull
    pub allowance: U256,
    pub token_balance: U256,
    pub now: u64,
}

impl StakingStatus {
    pub fn is_active(&self) -> bool {
        !self.staked.is_zero()
    }

    pub fn lock_days(&self) -> u64 {
        self.end_time.saturating_sub(self.start_time) / SECONDS_PER_DAY
    }

    pub fn remaining_lock(&self) -> Cooldown {
        if !self.is_active() {
            return Cooldown::READY;
        }
        Cooldown::from_remaining(self.end_time.saturating_sub(self.now))
    }

    /// Remaining lock time as `"Xd Yh Zm"`, zero included.
    pub fn remaining_display(&self) -> String {
        let remaining = self.remaining_lock();
        if remaining.is_ready() {
            return "0d 0h 0m".to_string();
        }
        remaining.display(CooldownStyle::DayHourMin)
    }

    pub fn is_early(&self) -> bool {
        self.is_active() && self.end_time > self.now
    }

    /// Amount forfeited if withdrawn now.
    pub fn penalty(&self) -> U256 {
        if !self.is_early() {
            return U256::ZERO;
        }
        self.staked * U256::from(EARLY_WITHDRAW_PENALTY_BPS) / U256::from(BPS)
    }

    pub fn expected_reward(&self) -> U256 {
        estimated_reward(self.staked, self.lock_days()).unwrap_or_default()
    }

    pub fn needs_approval(&self, amount: U256) -> bool {
        self.allowance < amount
    }

    pub fn validate_stake(&self, amount: U256, days: u64) -> Result<(), ScreenError> {
        if amount.is_zero() {
            return Err(ScreenError::not_ready("Enter an amount to stake."));
        }
        if amount > self.token_balance {
            return Err(ScreenError::not_ready(format!(
                "Insufficient balance: {} GIPIE available.",
                format_units(self.token_balance, DEFAULT_DECIMALS)
            )));
        }
        if apy_bps(days).is_none() {
            return Err(ScreenError::not_ready(format!(
                "{days} days is not a supported staking period."
            )));
        }
        Ok(())
    }
}

struct StakingSource {
    handle: RuntimeHandle,
}

#[async_trait]
impl StatusSource for StakingSource {
    type Status = StakingStatus;

    async fn fetch(&self) -> Result<StakingStatus, TxError> {
        let signer = status_signer(&self.handle)?;
        let user = signer.address();
        let contracts = self.handle.contracts();

        let (allowance, stake, balance) = tokio::try_join!(
            read(
                &signer,
                contracts.token,
                IGipieToken::allowanceCall {
                    owner: user,
                    spender: contracts.staking,
                }
            ),
            read(&signer, contracts.staking, IStaking::stakesCall { user }),
            read(&signer, contracts.token, IGipieToken::balanceOfCall { account: user }),
        )?;

        Ok(StakingStatus {
            staked: stake.amount,
            start_time: to_u64(stake.startTime),
            end_time: to_u64(stake.endTime),
            allowance: allowance._0,
            token_balance: balance._0,
            now: self.handle.clock().now_secs(),
        })
    }

    fn cooldown(&self, status: &StakingStatus) -> Cooldown {
        status.remaining_lock()
    }
}

pub struct StakingScreen {
    screen: Screen,
    status: PeriodicStatus<StakingSource>,
}

impl StakingScreen {
    pub fn new(handle: RuntimeHandle) -> Self {
        let source = Arc::new(StakingSource {
            handle: handle.clone(),
        });
        let status = PeriodicStatus::follow(source, handle.watch_connection());
        Self {
            screen: Screen::new(handle),
            status,
        }
    }

    pub fn status(&self) -> watch::Receiver<StatusView<StakingStatus>> {
        self.status.subscribe()
    }

    pub async fn refresh(&self) -> Option<StakingStatus> {
        self.status.refresh().await
    }

    pub fn is_busy(&self) -> bool {
        self.screen.is_busy()
    }

    /// Stake `amount` for `days`, approving the staking contract first when
    /// the current allowance does not cover it.
    pub async fn stake(&self, amount: U256, days: u64) -> Result<(), ScreenError> {
        let _busy = self.screen.begin()?;
        let signer = self.screen.signer()?;
        let status = self
            .status
            .refresh()
            .await
            .ok_or_else(|| ScreenError::not_ready("Could not load staking status."))?;
        status.validate_stake(amount, days)?;

        let contracts = self.screen.handle().contracts();
        if status.needs_approval(amount) {
            self.screen
                .send(
                    &signer,
                    contracts.token,
                    IGipieToken::approveCall {
                        spender: contracts.staking,
                        amount,
                    },
                    TxOptions::new("Approve", "Approval failed."),
                )
                .await?;
            info!(amount = %format_units(amount, DEFAULT_DECIMALS), "Approval successful!");
        }

        let result = self
            .screen
            .send(
                &signer,
                contracts.staking,
                IStaking::stakeCall {
                    amount,
                    durationDays: U256::from(days),
                },
                TxOptions::new("Stake", "Staking failed."),
            )
            .await;
        self.status.refresh().await;
        result?;

        info!(days, "Staking successful!");
        Ok(())
    }

    pub async fn withdraw(&self) -> Result<U256, ScreenError> {
        let _busy = self.screen.begin()?;
        let signer = self.screen.signer()?;
        let status = self
            .status
            .current()
            .status
            .ok_or_else(|| ScreenError::not_ready("Status is still loading."))?;
        if !status.is_active() {
            return Err(ScreenError::not_ready("You have no active stake."));
        }

        let result = self
            .screen
            .send(
                &signer,
                self.screen.handle().contracts().staking,
                IStaking::withdrawCall {},
                TxOptions::new("Withdraw", "Withdrawal failed."),
            )
            .await;
        self.status.refresh().await;
        result?;

        let penalty = status.penalty();
        info!(penalty = %format_units(penalty, DEFAULT_DECIMALS), "Withdrawal successful!");
        Ok(penalty)
    }
}

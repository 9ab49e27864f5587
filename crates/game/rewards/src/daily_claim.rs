//! Tiered daily token claim on the token contract itself.

use std::sync::Arc;

use async_trait::async_trait;
use client_blockchain_core::{ChainReader, DEFAULT_DECIMALS, TxError, U256, format_units};
use client_blockchain_evm::contracts::IGipieToken;
use runtime::{
    Cooldown, CooldownStyle, PeriodicStatus, RuntimeHandle, StatusSource, StatusView,
};
use tokio::sync::watch;
use tracing::{debug, info};

use crate::error::ScreenError;
use crate::screen::{Screen, TxOptions, read, status_signer, to_u64};

/// 0.5 token; holders below it cannot claim.
pub const MIN_CLAIM_BALANCE: U256 = U256::from_limbs([500_000_000_000_000_000, 0, 0, 0]);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierConfig {
    pub tier: u64,
    pub daily_reward: U256,
    /// Native currency paid to reach this tier
    pub upgrade_cost: U256,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyClaimStatus {
    pub locked: bool,
    pub total_supply: U256,
    pub tier: TierConfig,
    pub next_tier: Option<TierConfig>,
    /// Seconds until the next claim, as reported by the contract
    pub remaining_cooldown: u64,
    pub token_balance: U256,
    pub native_balance: U256,
}

impl DailyClaimStatus {
    pub fn cooldown(&self) -> Cooldown {
        Cooldown::from_remaining(self.remaining_cooldown)
    }

    /// First failed claim precondition, if any.
    pub fn claim_blocker(&self) -> Option<String> {
        if self.locked {
            return Some("Claiming is currently locked.".to_string());
        }
        if self.remaining_cooldown > 0 {
            return Some(format!(
                "Next claim in {}",
                self.cooldown().display(CooldownStyle::HourMinSec)
            ));
        }
        if self.token_balance < MIN_CLAIM_BALANCE {
            return Some(format!(
                "You need at least {} GIPIE to claim.",
                format_units(MIN_CLAIM_BALANCE, DEFAULT_DECIMALS)
            ));
        }
        None
    }

    pub fn can_claim(&self) -> bool {
        self.claim_blocker().is_none()
    }

    pub fn can_upgrade(&self) -> bool {
        self.next_tier
            .is_some_and(|next| self.native_balance >= next.upgrade_cost)
    }
}

struct DailyClaimSource {
    handle: RuntimeHandle,
}

#[async_trait]
impl StatusSource for DailyClaimSource {
    type Status = DailyClaimStatus;

    async fn fetch(&self) -> Result<DailyClaimStatus, TxError> {
        let signer = status_signer(&self.handle)?;
        let user = signer.address();
        let token = self.handle.contracts().token;

        let (locked, supply, tier, remaining, balance, native) = tokio::try_join!(
            read(&signer, token, IGipieToken::getLockStatusCall {}),
            read(&signer, token, IGipieToken::totalSupplyCall {}),
            read(&signer, token, IGipieToken::getUserClaimTierCall { user }),
            read(&signer, token, IGipieToken::getRemainingCooldownCall { user }),
            read(&signer, token, IGipieToken::balanceOfCall { account: user }),
            async { signer.provider().balance(user).await.map_err(TxError::from) },
        )?;

        let tier = tier._0;
        let current = read(&signer, token, IGipieToken::getClaimTierConfigCall { tier }).await?;
        let next_index = tier.saturating_add(U256::from(1u8));
        let next_tier = match read(
            &signer,
            token,
            IGipieToken::getClaimTierConfigCall { tier: next_index },
        )
        .await
        {
            Ok(next) if !next.dailyReward.is_zero() => Some(TierConfig {
                tier: to_u64(next_index),
                daily_reward: next.dailyReward,
                upgrade_cost: next.upgradeCost,
            }),
            Ok(_) => None,
            Err(e) => {
                debug!("No tier above {}: {}", tier, e);
                None
            }
        };

        Ok(DailyClaimStatus {
            locked: locked._0,
            total_supply: supply._0,
            tier: TierConfig {
                tier: to_u64(tier),
                daily_reward: current.dailyReward,
                upgrade_cost: current.upgradeCost,
            },
            next_tier,
            remaining_cooldown: to_u64(remaining._0),
            token_balance: balance._0,
            native_balance: native,
        })
    }

    fn cooldown(&self, status: &DailyClaimStatus) -> Cooldown {
        status.cooldown()
    }
}

pub struct DailyClaimScreen {
    screen: Screen,
    status: PeriodicStatus<DailyClaimSource>,
}

impl DailyClaimScreen {
    pub fn new(handle: RuntimeHandle) -> Self {
        let source = Arc::new(DailyClaimSource {
            handle: handle.clone(),
        });
        let status = PeriodicStatus::follow(source, handle.watch_connection());
        Self {
            screen: Screen::new(handle),
            status,
        }
    }

    pub fn status(&self) -> watch::Receiver<StatusView<DailyClaimStatus>> {
        self.status.subscribe()
    }

    pub async fn refresh(&self) -> Option<DailyClaimStatus> {
        self.status.refresh().await
    }

    pub fn is_busy(&self) -> bool {
        self.screen.is_busy()
    }

    pub async fn claim(&self) -> Result<(), ScreenError> {
        let _busy = self.screen.begin()?;
        let signer = self.screen.signer()?;
        let status = self
            .status
            .current()
            .status
            .ok_or_else(|| ScreenError::not_ready("Status is still loading."))?;
        if let Some(reason) = status.claim_blocker() {
            return Err(ScreenError::NotReady(reason));
        }

        let result = self
            .screen
            .send(
                &signer,
                self.screen.handle().contracts().token,
                IGipieToken::claimDailyCall {},
                TxOptions::new("Daily claim", "Failed to claim daily reward."),
            )
            .await;
        self.status.refresh().await;
        result?;

        info!(tier = status.tier.tier, "Daily reward claimed successfully!");
        Ok(())
    }

    /// Pay the next tier's upgrade cost in native currency.
    pub async fn upgrade(&self) -> Result<TierConfig, ScreenError> {
        let _busy = self.screen.begin()?;
        let signer = self.screen.signer()?;
        let status = self
            .status
            .current()
            .status
            .ok_or_else(|| ScreenError::not_ready("Status is still loading."))?;
        let Some(next) = status.next_tier else {
            return Err(ScreenError::not_ready("You are already at the highest tier."));
        };
        if status.native_balance < next.upgrade_cost {
            return Err(ScreenError::not_ready(format!(
                "Upgrading costs {} BNB.",
                format_units(next.upgrade_cost, DEFAULT_DECIMALS)
            )));
        }

        let result = self
            .screen
            .send(
                &signer,
                self.screen.handle().contracts().token,
                IGipieToken::upgradeClaimCall {
                    tier: U256::from(next.tier),
                },
                TxOptions::new("Tier upgrade", "Upgrade failed.").value(next.upgrade_cost),
            )
            .await;
        self.status.refresh().await;
        result?;

        info!(tier = next.tier, "Claim tier upgraded");
        Ok(next)
    }
}

//! Hourly freeroll and the once-a-day bonus wheel.

use std::sync::Arc;

use async_trait::async_trait;
use client_blockchain_core::{DEFAULT_DECIMALS, TxError, U256, format_units};
use client_blockchain_evm::contracts::{IBonusWheel, IFreeroll};
use runtime::{
    Clock, Cooldown, CooldownStyle, HistoryLog, PeriodicStatus, RuntimeHandle, StatusSource,
    StatusView,
};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, watch};
use tracing::{info, warn};

use crate::error::ScreenError;
use crate::screen::{Screen, TxOptions, read, status_signer, to_u64};

pub const ROLL_COOLDOWN_SECS: u64 = 3_600;
pub const SECONDS_PER_DAY: u64 = 86_400;
pub const BONUS_SPIN_GAS: u64 = 300_000;
pub const ROLL_HISTORY: &str = "rollHistory";

pub const RESET_HINT: &str = "Roll once to reset your daily progress and start a new bonus round!";

/// Bonus wheel segments, indexed by the contract's prize index.
pub const BONUS_PRIZES: [&str; 12] = [
    "0.01 GIPIE",
    "$0.1 USDC",
    "0.5 GIPIE",
    "$0.25 USDC",
    "1 GIPIE",
    "$5 USDC",
    "NOT LUCKY",
    "0.05 GIPIE",
    "$1 USDC",
    "0.1 GIPIE",
    "NOT LUCKY",
    "$10 USDC",
];

const NO_PRIZE: &str = "NOT LUCKY";

/// One roll, as kept in the local history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollEntry {
    pub roll: u64,
    /// Decimal token amount
    pub payout: String,
    /// Unix milliseconds
    pub timestamp: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BonusPrize {
    pub index: usize,
    pub label: &'static str,
}

impl BonusPrize {
    pub fn from_index(index: u64) -> Option<Self> {
        let index = usize::try_from(index).ok()?;
        BONUS_PRIZES
            .get(index)
            .map(|&label| BonusPrize { index, label })
    }

    pub fn is_win(&self) -> bool {
        self.label != NO_PRIZE
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FreerollStatus {
    pub last_claimed: u64,
    /// Latest roll; `None` before the first one
    pub last_roll: Option<u64>,
    pub payout: U256,
    pub daily_rolls: u64,
    pub last_roll_timestamp: u64,
    pub bonus_eligible: bool,
    pub last_bonus_spin_day: u64,
    /// Unix seconds at fetch time
    pub now: u64,
    pub history: Vec<RollEntry>,
}

impl FreerollStatus {
    pub fn cooldown(&self) -> Cooldown {
        Cooldown::from_last_action(self.last_claimed, ROLL_COOLDOWN_SECS, self.now)
    }

    pub fn today(&self) -> u64 {
        self.now / SECONDS_PER_DAY
    }

    /// The bonus round stays visible until the wheel was spun today.
    pub fn show_bonus_game(&self) -> bool {
        self.last_bonus_spin_day != self.today()
    }

    pub fn reset_hint(&self) -> Option<&'static str> {
        let last_roll_day = self.last_roll_timestamp / SECONDS_PER_DAY;
        (self.show_bonus_game() && self.today() > last_roll_day && self.daily_rolls > 0)
            .then_some(RESET_HINT)
    }

    pub fn payout_display(&self) -> String {
        match self.last_roll {
            Some(_) => format_units(self.payout, DEFAULT_DECIMALS),
            None => format_units(U256::ZERO, DEFAULT_DECIMALS),
        }
    }

    pub fn can_claim(&self) -> bool {
        self.last_roll.is_some() && !self.payout.is_zero()
    }
}

struct FreerollSource {
    handle: RuntimeHandle,
    history: HistoryLog<RollEntry>,
}

#[async_trait]
impl StatusSource for FreerollSource {
    type Status = FreerollStatus;

    async fn fetch(&self) -> Result<FreerollStatus, TxError> {
        let signer = status_signer(&self.handle)?;
        let user = signer.address();
        let contracts = self.handle.contracts();

        let (last_claimed, info, daily_rolls, last_roll, eligible, bonus_day) = tokio::try_join!(
            read(&signer, contracts.freeroll, IFreeroll::lastClaimedCall { user }),
            read(&signer, contracts.freeroll, IFreeroll::getUserRollInfoCall { user }),
            read(&signer, contracts.freeroll, IFreeroll::dailyRollCountCall { user }),
            read(&signer, contracts.freeroll, IFreeroll::lastRollTimestampCall { user }),
            read(&signer, contracts.freeroll, IFreeroll::isEligibleForBonusCall { user }),
            read(&signer, contracts.bonus_wheel, IBonusWheel::lastBonusSpinDayCall { user }),
        )?;

        let history = self.history.load(user).unwrap_or_else(|e| {
            warn!("Failed to read roll history: {}", e);
            Vec::new()
        });

        let roll = to_u64(info.roll);
        Ok(FreerollStatus {
            last_claimed: to_u64(last_claimed._0),
            last_roll: (roll > 0).then_some(roll),
            payout: info.payout,
            daily_rolls: to_u64(daily_rolls._0),
            last_roll_timestamp: to_u64(last_roll._0),
            bonus_eligible: eligible._0,
            last_bonus_spin_day: to_u64(bonus_day._0),
            now: self.handle.clock().now_secs(),
            history,
        })
    }

    fn cooldown(&self, status: &FreerollStatus) -> Cooldown {
        status.cooldown()
    }
}

/// Freeroll screen service. Must be created inside a Tokio runtime.
pub struct FreerollScreen {
    screen: Screen,
    history: HistoryLog<RollEntry>,
    status: PeriodicStatus<FreerollSource>,
    bonus_prize: Mutex<Option<BonusPrize>>,
}

impl FreerollScreen {
    pub fn new(handle: RuntimeHandle) -> Self {
        let history = HistoryLog::new(Arc::clone(handle.store()), ROLL_HISTORY);
        let source = Arc::new(FreerollSource {
            handle: handle.clone(),
            history: history.clone(),
        });
        let status = PeriodicStatus::follow(source, handle.watch_connection());
        Self {
            screen: Screen::new(handle),
            history,
            status,
            bonus_prize: Mutex::new(None),
        }
    }

    pub fn status(&self) -> watch::Receiver<StatusView<FreerollStatus>> {
        self.status.subscribe()
    }

    pub async fn refresh(&self) -> Option<FreerollStatus> {
        self.status.refresh().await
    }

    /// Prize won on the bonus wheel and not yet claimed.
    pub async fn bonus_prize(&self) -> Option<BonusPrize> {
        *self.bonus_prize.lock().await
    }

    pub fn is_busy(&self) -> bool {
        self.screen.is_busy()
    }

    pub async fn roll(&self) -> Result<RollEntry, ScreenError> {
        let _busy = self.screen.begin()?;
        let signer = self.screen.signer()?;
        let view = self.status.current();
        if view.status.is_none() {
            return Err(ScreenError::not_ready("Status is still loading."));
        }
        if !view.cooldown.is_ready() {
            return Err(ScreenError::not_ready(format!(
                "Next roll in {}",
                view.cooldown.display(CooldownStyle::HourMinSec)
            )));
        }

        let freeroll = self.screen.handle().contracts().freeroll;
        self.screen
            .send(
                &signer,
                freeroll,
                IFreeroll::rollCall {},
                TxOptions::new("Roll", "Roll Failed."),
            )
            .await?;

        let user = signer.address();
        let info = read(&signer, freeroll, IFreeroll::getUserRollInfoCall { user }).await?;
        let entry = RollEntry {
            roll: to_u64(info.roll),
            payout: format_units(info.payout, DEFAULT_DECIMALS),
            timestamp: self.screen.handle().clock().now_millis(),
        };
        info!(roll = entry.roll, payout = %entry.payout, "Roll confirmed");

        if let Err(e) = self.history.push(user, entry.clone()) {
            warn!("Failed to save roll history: {}", e);
        }
        self.status.refresh().await;
        Ok(entry)
    }

    pub async fn claim_reward(&self) -> Result<(), ScreenError> {
        let _busy = self.screen.begin()?;
        let signer = self.screen.signer()?;
        let claimable = self
            .status
            .current()
            .status
            .is_some_and(|s| s.can_claim());
        if !claimable {
            return Err(ScreenError::not_ready("No reward to claim."));
        }

        let result = self
            .screen
            .send(
                &signer,
                self.screen.handle().contracts().freeroll,
                IFreeroll::claimRewardCall {},
                TxOptions::new("Claim reward", "Claim Failed."),
            )
            .await;
        self.status.refresh().await;
        result?;
        Ok(())
    }

    /// Spin the bonus wheel. Eligibility is re-read first.
    pub async fn spin_bonus(&self) -> Result<BonusPrize, ScreenError> {
        let _busy = self.screen.begin()?;
        let signer = self.screen.signer()?;
        if self.bonus_prize.lock().await.is_some() {
            return Err(ScreenError::not_ready("Claim your bonus prize first."));
        }

        let status = self
            .status
            .refresh()
            .await
            .ok_or_else(|| ScreenError::not_ready("Could not load bonus status."))?;
        if !status.bonus_eligible {
            return Err(ScreenError::not_ready("You are not eligible for a bonus spin."));
        }
        if !status.show_bonus_game() {
            return Err(ScreenError::not_ready("The bonus wheel was already spun today."));
        }

        let wheel = self.screen.handle().contracts().bonus_wheel;
        self.screen
            .send(
                &signer,
                wheel,
                IBonusWheel::spinCall {},
                TxOptions::new("Bonus spin", "Bonus Spin Failed.").gas(BONUS_SPIN_GAS),
            )
            .await?;

        let user = signer.address();
        let pending = read(&signer, wheel, IBonusWheel::getPendingPrizeCall { user }).await?;
        let index = to_u64(pending.prizeIndex);
        let prize = BonusPrize::from_index(index).ok_or_else(|| {
            ScreenError::Read(TxError::Unknown(format!("prize index {index} out of range")))
        })?;

        info!(prize = prize.label, "Bonus wheel landed");
        *self.bonus_prize.lock().await = Some(prize);
        self.status.refresh().await;
        Ok(prize)
    }

    pub async fn claim_bonus(&self) -> Result<(), ScreenError> {
        let _busy = self.screen.begin()?;
        let signer = self.screen.signer()?;
        let Some(prize) = self.bonus_prize.lock().await.take() else {
            return Err(ScreenError::not_ready("No bonus reward to claim!"));
        };

        self.screen
            .send(
                &signer,
                self.screen.handle().contracts().bonus_wheel,
                IBonusWheel::claimCall {},
                TxOptions::new("Bonus claim", "Bonus Claim Failed."),
            )
            .await?;

        info!(prize = prize.label, "Bonus prize claimed");
        self.status.refresh().await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{NOW, connected, ret, rets};
    use alloy_sol_types::SolCall;
    use client_blockchain_core::{MockWallet, tokens};
    use client_blockchain_evm::ContractAddresses;

    fn status(now: u64) -> FreerollStatus {
        FreerollStatus {
            last_claimed: 0,
            last_roll: None,
            payout: U256::ZERO,
            daily_rolls: 0,
            last_roll_timestamp: 0,
            bonus_eligible: false,
            last_bonus_spin_day: 0,
            now,
            history: Vec::new(),
        }
    }

    #[test]
    fn cooldown_runs_an_hour_from_last_claim() {
        let mut s = status(NOW);
        assert!(s.cooldown().is_ready());

        s.last_claimed = NOW - 600;
        assert_eq!(s.cooldown().secs(), 3_000);

        s.last_claimed = NOW - 7_200;
        assert!(s.cooldown().is_ready());
    }

    #[test]
    fn reset_hint_needs_rolls_from_an_earlier_day() {
        let today = NOW / SECONDS_PER_DAY;
        let mut s = status(NOW);
        s.last_bonus_spin_day = today - 1;
        s.daily_rolls = 4;
        s.last_roll_timestamp = NOW - SECONDS_PER_DAY;
        assert_eq!(s.reset_hint(), Some(RESET_HINT));

        s.last_roll_timestamp = NOW;
        assert_eq!(s.reset_hint(), None);

        s.last_roll_timestamp = NOW - SECONDS_PER_DAY;
        s.last_bonus_spin_day = today;
        assert!(!s.show_bonus_game());
        assert_eq!(s.reset_hint(), None);
    }

    #[test]
    fn payout_hidden_before_first_roll() {
        let mut s = status(NOW);
        s.payout = tokens(1);
        assert_eq!(s.payout_display(), "0.0");
        assert!(!s.can_claim());

        s.last_roll = Some(9_001);
        assert_eq!(s.payout_display(), "1.0");
        assert!(s.can_claim());
    }

    #[test]
    fn bonus_index_must_be_on_the_wheel() {
        assert_eq!(BonusPrize::from_index(11).map(|p| p.label), Some("$10 USDC"));
        assert!(!BonusPrize::from_index(6).unwrap().is_win());
        assert!(BonusPrize::from_index(12).is_none());
    }

    fn script(wallet: &MockWallet, last_claimed: u64) {
        let addrs = ContractAddresses::default();
        let freeroll = addrs.freeroll;
        wallet.on_call(
            freeroll,
            IFreeroll::lastClaimedCall::SELECTOR,
            ret(U256::from(last_claimed)),
        );
        wallet.on_call(
            freeroll,
            IFreeroll::getUserRollInfoCall::SELECTOR,
            rets((U256::from(4_242u64), tokens(2))),
        );
        wallet.on_call(
            freeroll,
            IFreeroll::dailyRollCountCall::SELECTOR,
            ret(U256::from(1u8)),
        );
        wallet.on_call(
            freeroll,
            IFreeroll::lastRollTimestampCall::SELECTOR,
            ret(U256::from(NOW - 60)),
        );
        wallet.on_call(
            freeroll,
            IFreeroll::isEligibleForBonusCall::SELECTOR,
            ret(false),
        );
        wallet.on_call(
            addrs.bonus_wheel,
            IBonusWheel::lastBonusSpinDayCall::SELECTOR,
            ret(U256::ZERO),
        );
    }

    #[tokio::test(start_paused = true)]
    async fn roll_records_history() {
        let fixture = connected(|wallet, _| script(wallet, 0)).await;
        let screen = FreerollScreen::new(fixture.handle());
        assert!(screen.refresh().await.is_some());

        let entry = screen.roll().await.expect("roll succeeds");
        assert_eq!(entry.roll, 4_242);
        assert_eq!(entry.payout, "2.0");

        let sent = fixture.wallet.sent_transactions();
        assert_eq!(sent.len(), 1);
        assert_eq!(&sent[0].data[..4], &IFreeroll::rollCall::SELECTOR);

        let status = screen.refresh().await.expect("status");
        assert_eq!(status.history, vec![entry]);
    }

    #[tokio::test(start_paused = true)]
    async fn roll_refused_during_cooldown() {
        let fixture = connected(|wallet, _| script(wallet, NOW - 60)).await;
        let screen = FreerollScreen::new(fixture.handle());
        screen.refresh().await;

        let err = screen.roll().await.unwrap_err();
        assert!(matches!(err, ScreenError::NotReady(ref m) if m.starts_with("Next roll in")));
        assert!(fixture.wallet.sent_transactions().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn bonus_spin_requires_eligibility() {
        let fixture = connected(|wallet, _| script(wallet, 0)).await;
        let screen = FreerollScreen::new(fixture.handle());

        let err = screen.spin_bonus().await.unwrap_err();
        assert_eq!(
            err,
            ScreenError::not_ready("You are not eligible for a bonus spin.")
        );
        assert_eq!(
            screen.claim_bonus().await.unwrap_err(),
            ScreenError::not_ready("No bonus reward to claim!")
        );
    }
}

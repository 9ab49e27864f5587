//! Reward screen services for the Gipie platform.
//!
//! Each screen owns a [`runtime::PeriodicStatus`] that follows the wallet
//! connection, derives what the player may do from on-chain state, and
//! exposes the screen's transactions as async actions. Only one action per
//! screen runs at a time.
//!
//! Screens must be created inside a Tokio runtime:
//!
//! ```ignore
//! let freeroll = FreerollScreen::new(runtime.handle());
//! let mut status = freeroll.status();
//! status.changed().await?;
//! let entry = freeroll.roll().await?;
//! ```

pub mod card_flip;
pub mod daily_claim;
pub mod dig;
pub mod freeroll;
pub mod spin;
pub mod staking;

mod error;
mod screen;

#[cfg(test)]
mod testing;

pub use card_flip::{CardFlipScreen, CardFlipStatus, FlipOutcome, Symbol};
pub use daily_claim::{DailyClaimScreen, DailyClaimStatus, TierConfig};
pub use dig::{DigOutcome, DigScreen, DigStatus};
pub use error::ScreenError;
pub use freeroll::{BonusPrize, FreerollScreen, FreerollStatus, RollEntry};
pub use screen::{Screen, TxOptions};
pub use spin::{SpinEntry, SpinScreen, SpinStatus};
pub use staking::{StakingScreen, StakingStatus};

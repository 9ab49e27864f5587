//! Worker tasks that back the runtime orchestration.

mod balance;

pub use balance::{BALANCE_POLL_INTERVAL, BalancePoller, fetch_balances};

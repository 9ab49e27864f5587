//! Per-screen status plumbing: cooldown math and the periodic status loop.

mod cooldown;
mod periodic;

pub use cooldown::{Cooldown, CooldownStyle, READY};
pub use periodic::{PeriodicStatus, STATUS_TICK, StatusSource, StatusView};

//! Cooldown arithmetic and display.

use std::fmt;

/// Text shown for an elapsed cooldown.
pub const READY: &str = "Ready!";

/// Seconds until a repeatable action is allowed again. Never negative.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Cooldown(u64);

/// Rendering styles used by the different screens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CooldownStyle {
    /// `"12m 5s"`
    MinSec,
    /// `"1h 0m 5s"`
    HourMinSec,
    /// `"1d 2h 3m 4s"` when at least a day remains, else `"2h 3m 4s"`
    Compact,
    /// `"3d 4h 5m"`
    DayHourMin,
}

impl Cooldown {
    pub const READY: Cooldown = Cooldown(0);

    /// `last_action + period - now`, floored at zero. A zero `last_action`
    /// means the action was never taken and is ready.
    pub fn from_last_action(last_action: u64, period: u64, now: u64) -> Self {
        if last_action == 0 {
            return Self::READY;
        }
        Cooldown(last_action.saturating_add(period).saturating_sub(now))
    }

    /// Remaining seconds reported directly by a contract.
    pub fn from_remaining(secs: u64) -> Self {
        Cooldown(secs)
    }

    pub fn secs(&self) -> u64 {
        self.0
    }

    pub fn is_ready(&self) -> bool {
        self.0 == 0
    }

    /// One second less, stopping at zero.
    pub fn tick(self) -> Self {
        Cooldown(self.0.saturating_sub(1))
    }

    pub fn display(&self, style: CooldownStyle) -> String {
        if self.is_ready() {
            return READY.to_string();
        }
        let total = self.0;
        let days = total / 86_400;
        let hours = (total % 86_400) / 3_600;
        let minutes = (total % 3_600) / 60;
        let seconds = total % 60;

        match style {
            CooldownStyle::MinSec => format!("{}m {}s", total / 60, seconds),
            CooldownStyle::HourMinSec => format!("{}h {}m {}s", total / 3_600, minutes, seconds),
            CooldownStyle::Compact if days > 0 => {
                format!("{days}d {hours}h {minutes}m {seconds}s")
            }
            CooldownStyle::Compact => format!("{hours}h {minutes}m {seconds}s"),
            CooldownStyle::DayHourMin => format!("{days}d {hours}h {minutes}m"),
        }
    }
}

impl fmt::Display for Cooldown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display(CooldownStyle::HourMinSec))
    }
}

//! Deployed contract addresses.
//!
//! Defaults are the BNB Smart Chain mainnet deployments. Each address can be
//! overridden through the environment (or a `.env` file):
//! - `GIPIE_TOKEN_ADDRESS`
//! - `GIPIE_FREEROLL_ADDRESS`
//! - `GIPIE_BONUS_WHEEL_ADDRESS`
//! - `GIPIE_SPIN_ADDRESS`
//! - `GIPIE_CARD_GAME_ADDRESS`
//! - `GIPIE_DIG_ADDRESS`
//! - `GIPIE_STAKING_ADDRESS`

use std::env;

use alloy_primitives::{Address, address};

use crate::core::EvmError;

/// Addresses of every contract the client talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContractAddresses {
    /// Platform token (ERC-20 plus the daily-claim tiers)
    pub token: Address,
    pub freeroll: Address,
    pub bonus_wheel: Address,
    pub daily_spin: Address,
    pub card_game: Address,
    pub daily_dig: Address,
    pub staking: Address,
}

impl Default for ContractAddresses {
    fn default() -> Self {
        Self::bsc_mainnet()
    }
}

impl ContractAddresses {
    pub const fn bsc_mainnet() -> Self {
        Self {
            token: address!("03285a2F201AC1c00E51b77b0A55F139f3A7D591"),
            freeroll: address!("6FEE10F6277FB77a2BE5d450a28aC9785EC128b0"),
            bonus_wheel: address!("e1ED961c3Ab7D1E9c45ece28A3780Db889F6567E"),
            daily_spin: address!("7AC32180d38BcBfBDEe742d2923eeE48653fa72a"),
            card_game: address!("efB1767EdcabD3A6381FB6D79094c7490093827d"),
            daily_dig: address!("3DB8a1Cf9ace7aeA2e9B11D9B055143b5Eb102A4"),
            staking: address!("f80f23326eb01856373e7678906f7d2d994f5cd2"),
        }
    }

    /// Mainnet defaults with environment overrides applied.
    pub fn from_env() -> Result<Self, EvmError> {
        let defaults = Self::bsc_mainnet();
        Ok(Self {
            token: read_address("GIPIE_TOKEN_ADDRESS", defaults.token)?,
            freeroll: read_address("GIPIE_FREEROLL_ADDRESS", defaults.freeroll)?,
            bonus_wheel: read_address("GIPIE_BONUS_WHEEL_ADDRESS", defaults.bonus_wheel)?,
            daily_spin: read_address("GIPIE_SPIN_ADDRESS", defaults.daily_spin)?,
            card_game: read_address("GIPIE_CARD_GAME_ADDRESS", defaults.card_game)?,
            daily_dig: read_address("GIPIE_DIG_ADDRESS", defaults.daily_dig)?,
            staking: read_address("GIPIE_STAKING_ADDRESS", defaults.staking)?,
        })
    }
}

fn read_address(key: &str, default: Address) -> Result<Address, EvmError> {
    match env::var(key) {
        Ok(value) if !value.trim().is_empty() => value
            .trim()
            .parse::<Address>()
            .map_err(|e| EvmError::InvalidConfig(format!("{key}: {e}"))),
        _ => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mainnet_addresses_are_distinct() {
        let addrs = ContractAddresses::bsc_mainnet();
        let all = [
            addrs.token,
            addrs.freeroll,
            addrs.bonus_wheel,
            addrs.daily_spin,
            addrs.card_game,
            addrs.daily_dig,
            addrs.staking,
        ];
        for (i, a) in all.iter().enumerate() {
            assert!(!a.is_zero());
            assert!(all[i + 1..].iter().all(|b| b != a));
        }
    }

    #[test]
    fn rejects_malformed_override() {
        assert!(read_address("GIPIE_TEST_UNSET_ADDRESS", Address::ZERO).is_ok());
        // SAFETY: test-local variable name, not read concurrently elsewhere.
        unsafe { env::set_var("GIPIE_TEST_BAD_ADDRESS", "0x1234") };
        assert!(read_address("GIPIE_TEST_BAD_ADDRESS", Address::ZERO).is_err());
    }
}

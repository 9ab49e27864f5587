//! Solidity interfaces of the deployed platform contracts.
//!
//! These are the wire protocol of the client: selectors, argument order and
//! event layouts must match the deployed bytecode exactly.

pub mod card_game;
pub mod dig;
pub mod freeroll;
pub mod spin;
pub mod staking;
pub mod token;

pub use card_game::ICryptoCardGame;
pub use dig::IDailyDig;
pub use freeroll::{IBonusWheel, IFreeroll};
pub use spin::IDailySpin;
pub use staking::IStaking;
pub use token::IGipieToken;

//! Crypto card flip: a 4x4 memory game played against on-chain commitments.
//!
//! The player shuffles a deck locally and commits the symbol hashes. Each
//! flip is its own transaction; the contract scores the second card of a
//! pair and reports the result only through a `CardFlipped` event.

mod board;
mod service;

pub use board::{
    Board, CARD_COUNT, DECK, FLIP_COOLDOWN_SECS, GRID_SIZE, MAX_FLIPS, PlayState, Position,
    RoundState, Symbol, shuffled_deck,
};
pub use service::{CardFlipScreen, CardFlipStatus, FlipOutcome};

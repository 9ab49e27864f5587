//! Board model: symbols, the deck, positions and the reshuffle rule.

use std::collections::HashSet;

use alloy_primitives::{B256, U256, keccak256};
use rand::Rng;
use rand::seq::SliceRandom;
use runtime::Cooldown;

pub const GRID_SIZE: usize = 4;
pub const CARD_COUNT: usize = GRID_SIZE * GRID_SIZE;
pub const MAX_FLIPS: u64 = 6;
pub const FLIP_COOLDOWN_SECS: u64 = 1_800;

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
    strum::EnumIter,
)]
#[strum(serialize_all = "UPPERCASE")]
pub enum Symbol {
    Btc,
    Eth,
    Bnb,
    Sol,
    /// Matching both jokers wins the jackpot
    Joker,
}

impl Symbol {
    /// On-chain commitment for this symbol.
    pub fn hash(&self) -> B256 {
        keccak256(self.as_ref().as_bytes())
    }

    pub fn from_hash(hash: &B256) -> Option<Self> {
        <Symbol as strum::IntoEnumIterator>::iter().find(|s| s.hash() == *hash)
    }

    /// Reward for a matched pair.
    pub fn prize(&self) -> U256 {
        let thousandths: u64 = match self {
            Symbol::Btc => 15,
            Symbol::Eth => 30,
            Symbol::Bnb => 50,
            Symbol::Sol => 75,
            Symbol::Joker => 100,
        };
        U256::from(thousandths) * U256::from(10u8).pow(U256::from(15u8))
    }

    pub fn is_jackpot(&self) -> bool {
        matches!(self, Symbol::Joker)
    }
}

/// Cards dealt on every shuffle.
pub const DECK: [Symbol; CARD_COUNT] = [
    Symbol::Btc,
    Symbol::Btc,
    Symbol::Btc,
    Symbol::Btc,
    Symbol::Eth,
    Symbol::Eth,
    Symbol::Eth,
    Symbol::Eth,
    Symbol::Bnb,
    Symbol::Bnb,
    Symbol::Bnb,
    Symbol::Bnb,
    Symbol::Sol,
    Symbol::Sol,
    Symbol::Joker,
    Symbol::Joker,
];

pub fn shuffled_deck<R: Rng + ?Sized>(rng: &mut R) -> [Symbol; CARD_COUNT] {
    let mut deck = DECK;
    deck.shuffle(rng);
    deck
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position {
    pub row: u8,
    pub col: u8,
}

impl Position {
    pub fn new(row: u8, col: u8) -> Option<Self> {
        let in_range = (row as usize) < GRID_SIZE && (col as usize) < GRID_SIZE;
        in_range.then_some(Position { row, col })
    }

    pub fn index(&self) -> usize {
        self.row as usize * GRID_SIZE + self.col as usize
    }

    pub fn all() -> impl Iterator<Item = Position> {
        (0..GRID_SIZE as u8)
            .flat_map(|row| (0..GRID_SIZE as u8).map(move |col| Position { row, col }))
    }
}

/// Symbols as committed on chain, row-major.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Board {
    cells: [Symbol; CARD_COUNT],
}

impl Board {
    pub fn new(cells: [Symbol; CARD_COUNT]) -> Self {
        Self { cells }
    }

    /// `None` while any slot is unset (zero) or holds an unknown commitment.
    pub fn from_hashes(hashes: &[B256]) -> Option<Self> {
        if hashes.len() != CARD_COUNT {
            return None;
        }
        let mut cells = DECK;
        for (cell, hash) in cells.iter_mut().zip(hashes) {
            *cell = Symbol::from_hash(hash)?;
        }
        Some(Self { cells })
    }

    pub fn symbol_at(&self, pos: Position) -> Symbol {
        self.cells[pos.index()]
    }

    pub fn hashes(&self) -> Vec<B256> {
        self.cells.iter().map(Symbol::hash).collect()
    }
}

/// Whether a new board is due and how long until flips are allowed again.
///
/// The contract exposes no explicit "round over" flag, so it is inferred
/// from the flips used and the time since the last one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RoundState {
    pub needs_shuffle: bool,
    pub cooldown: Cooldown,
}

impl RoundState {
    /// `last_flip == 0` counts as long ago.
    pub fn derive(flips_used: u64, last_flip: u64, now: u64) -> Self {
        let elapsed = if last_flip == 0 {
            FLIP_COOLDOWN_SECS + 1
        } else {
            now.saturating_sub(last_flip)
        };

        if flips_used < MAX_FLIPS {
            return Self {
                needs_shuffle: false,
                cooldown: Cooldown::READY,
            };
        }
        if elapsed >= FLIP_COOLDOWN_SECS {
            Self {
                needs_shuffle: true,
                cooldown: Cooldown::READY,
            }
        } else {
            Self {
                needs_shuffle: false,
                cooldown: Cooldown::from_remaining(FLIP_COOLDOWN_SECS - elapsed),
            }
        }
    }
}

/// Cards face up or matched during the current round.
#[derive(Clone, Debug, Default)]
pub struct PlayState {
    pub first: Option<Position>,
    pub open: HashSet<Position>,
    pub matched: HashSet<Position>,
}

impl PlayState {
    /// Seed from the contract's matched list, forgetting open cards.
    pub fn reset(&mut self, matched: impl IntoIterator<Item = Position>) {
        self.first = None;
        self.open.clear();
        self.matched = matched.into_iter().collect();
    }

    /// Turn both open cards face down.
    pub fn close_pair(&mut self) {
        self.first = None;
        self.open.clear();
    }
}

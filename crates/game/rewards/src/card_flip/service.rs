use std::sync::Arc;

use alloy_primitives::B256;
use async_trait::async_trait;
use client_blockchain_core::{TxError, U256};
use client_blockchain_evm::contracts::{ICryptoCardGame, IGipieToken};
use futures::future::try_join_all;
use runtime::{Clock, Cooldown, PeriodicStatus, RuntimeHandle, Signer, StatusSource, StatusView};
use tokio::sync::{Mutex, watch};
use tracing::{info, warn};

use super::board::{
    Board, MAX_FLIPS, PlayState, Position, RoundState, Symbol, shuffled_deck,
};
use crate::error::ScreenError;
use crate::screen::{
    IdentityReset, Screen, TxOptions, decode_event, player_event_filter, read, status_signer,
    to_u64,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardFlipStatus {
    pub token_balance: U256,
    pub pending_rewards: U256,
    pub flips_remaining: u64,
    pub flips_used: u64,
    pub last_flip: u64,
    pub matched: Vec<Position>,
    /// `None` until a board has been shuffled in
    pub board: Option<Board>,
    pub now: u64,
}

impl CardFlipStatus {
    pub fn round(&self) -> RoundState {
        RoundState::derive(self.flips_used, self.last_flip, self.now)
    }

    pub fn needs_shuffle(&self) -> bool {
        self.round().needs_shuffle
    }

    pub fn cooldown(&self) -> Cooldown {
        self.round().cooldown
    }

    /// A round is in progress: some flips used, none left on cooldown.
    pub fn mid_round(&self) -> bool {
        self.flips_used < MAX_FLIPS && self.last_flip != 0 && self.cooldown().is_ready()
    }

    pub fn board_message(&self) -> Option<&'static str> {
        self.board
            .is_none()
            .then_some("Board not set. Shuffle to start!")
    }
}

/// Result of one flip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlipOutcome {
    /// First card of a pair turned over
    Opened(Symbol),
    Matched {
        symbol: Symbol,
        reward: U256,
        jackpot: bool,
    },
    NoMatch,
    /// The flip was mined but its event never showed up
    Unconfirmed,
}

impl FlipOutcome {
    pub fn message(&self) -> String {
        match self {
            FlipOutcome::Opened(symbol) => format!("You flipped {symbol}."),
            FlipOutcome::Matched { jackpot: true, .. } => "JACKPOT! You matched the jokers!".into(),
            FlipOutcome::Matched { symbol, .. } => format!("Match! You found a pair of {symbol}."),
            FlipOutcome::NoMatch => "No match. Try again!".into(),
            FlipOutcome::Unconfirmed => {
                "Flip successful, but event not received. Refresh to see the result.".into()
            }
        }
    }
}

struct CardFlipSource {
    handle: RuntimeHandle,
}

impl CardFlipSource {
    async fn read_board(&self, signer: &Signer) -> Result<Option<Board>, TxError> {
        let game = self.handle.contracts().card_game;
        let player = signer.address();
        let reads = Position::all().map(|pos| {
            read(
                signer,
                game,
                ICryptoCardGame::getSymbolHashCall {
                    player,
                    row: U256::from(pos.row),
                    col: U256::from(pos.col),
                },
            )
        });
        let hashes: Vec<B256> = try_join_all(reads)
            .await?
            .into_iter()
            .map(|ret| ret._0)
            .collect();
        Ok(Board::from_hashes(&hashes))
    }
}

#[async_trait]
impl StatusSource for CardFlipSource {
    type Status = CardFlipStatus;

    async fn fetch(&self) -> Result<CardFlipStatus, TxError> {
        let signer = status_signer(&self.handle)?;
        let player = signer.address();
        let contracts = self.handle.contracts();
        let game = contracts.card_game;

        let (balance, pending, remaining, used, last, matched, board) = tokio::try_join!(
            read(&signer, contracts.token, IGipieToken::balanceOfCall { account: player }),
            read(&signer, game, ICryptoCardGame::getPendingRewardsCall { player }),
            read(&signer, game, ICryptoCardGame::getFlipsRemainingCall { player }),
            read(&signer, game, ICryptoCardGame::getFlipsUsedCall { player }),
            read(&signer, game, ICryptoCardGame::getLastFlipCall { player }),
            read(&signer, game, ICryptoCardGame::getMatchedCardsCall { player }),
            self.read_board(&signer),
        )?;

        let matched = matched
            .rows
            .iter()
            .zip(&matched.cols)
            .filter_map(|(row, col)| Position::new(u8::try_from(*row).ok()?, u8::try_from(*col).ok()?))
            .collect();

        Ok(CardFlipStatus {
            token_balance: balance._0,
            pending_rewards: pending._0,
            flips_remaining: to_u64(remaining._0),
            flips_used: to_u64(used._0),
            last_flip: to_u64(last._0),
            matched,
            board,
            now: self.handle.clock().now_secs(),
        })
    }

    fn cooldown(&self, status: &CardFlipStatus) -> Cooldown {
        status.cooldown()
    }
}

pub struct CardFlipScreen {
    screen: Screen,
    status: PeriodicStatus<CardFlipSource>,
    play: Arc<Mutex<PlayState>>,
    _reset: IdentityReset,
}

impl CardFlipScreen {
    pub fn new(handle: RuntimeHandle) -> Self {
        let source = Arc::new(CardFlipSource {
            handle: handle.clone(),
        });
        let status = PeriodicStatus::follow(source, handle.watch_connection());
        let play = Arc::new(Mutex::new(PlayState::default()));
        let reset = IdentityReset::spawn(Arc::clone(&play), handle.watch_connection());
        Self {
            screen: Screen::new(handle),
            status,
            play,
            _reset: reset,
        }
    }

    pub fn status(&self) -> watch::Receiver<StatusView<CardFlipStatus>> {
        self.status.subscribe()
    }

    /// Refetch and resync the local board with the contract's matched cards.
    pub async fn refresh(&self) -> Option<CardFlipStatus> {
        let status = self.status.refresh().await?;
        self.play.lock().await.reset(status.matched.iter().copied());
        Some(status)
    }

    pub async fn play_state(&self) -> PlayState {
        self.play.lock().await.clone()
    }

    pub fn is_busy(&self) -> bool {
        self.screen.is_busy()
    }

    /// Commit a freshly shuffled deck. Resets the round to six flips.
    pub async fn shuffle_board(&self) -> Result<(), ScreenError> {
        let _busy = self.screen.begin()?;
        let signer = self.screen.signer()?;
        let view = self.status.current();
        if !view.cooldown.is_ready() {
            return Err(ScreenError::not_ready("Wait for the cooldown to end before shuffling."));
        }
        if view.status.as_ref().is_some_and(CardFlipStatus::mid_round) {
            return Err(ScreenError::not_ready("Finish your current flips before shuffling."));
        }

        let deck = shuffled_deck(&mut rand::thread_rng());
        let board = Board::new(deck);
        self.screen
            .send(
                &signer,
                self.screen.handle().contracts().card_game,
                ICryptoCardGame::shuffleBoardCall {
                    symbolHashes: board.hashes(),
                },
                TxOptions::new("Shuffle", "Shuffle failed."),
            )
            .await?;

        info!("Board shuffled successfully! You now have {} flips.", MAX_FLIPS);
        self.refresh().await;
        Ok(())
    }

    pub async fn flip(&self, row: u8, col: u8) -> Result<FlipOutcome, ScreenError> {
        let _busy = self.screen.begin()?;
        let signer = self.screen.signer()?;
        let pos = Position::new(row, col)
            .ok_or_else(|| ScreenError::not_ready("Invalid card position."))?;
        let status = self
            .status
            .current()
            .status
            .ok_or_else(|| ScreenError::not_ready("Status is still loading."))?;

        if status.flips_remaining == 0 {
            return Err(ScreenError::not_ready("No flips left! Shuffle to reset."));
        }
        if status.needs_shuffle() {
            return Err(ScreenError::not_ready("Shuffle to start!"));
        }
        let Some(board) = status.board.as_ref() else {
            return Err(ScreenError::not_ready("Board not loaded. Shuffle to start!"));
        };
        let first = {
            let play = self.play.lock().await;
            if play.matched.contains(&pos) || status.matched.contains(&pos) {
                return Err(ScreenError::not_ready("Card already matched!"));
            }
            if play.open.contains(&pos) {
                return Err(ScreenError::not_ready("Card already open!"));
            }
            play.first
        };

        let symbol = board.symbol_at(pos);
        let game = self.screen.handle().contracts().card_game;
        let receipt = self
            .screen
            .send(
                &signer,
                game,
                ICryptoCardGame::flipCardCall {
                    row: U256::from(row),
                    col: U256::from(col),
                    symbol: symbol.to_string(),
                },
                TxOptions::new("Flip card", "Flip failed."),
            )
            .await?;

        let Some(first) = first else {
            let mut play = self.play.lock().await;
            play.first = Some(pos);
            play.open.insert(pos);
            drop(play);
            self.status.refresh().await;
            return Ok(FlipOutcome::Opened(symbol));
        };

        let player = signer.address();
        let filter = player_event_filter::<ICryptoCardGame::CardFlipped>(game, &receipt, player);
        let row_u = U256::from(row);
        let col_u = U256::from(col);
        let event = self
            .screen
            .handle()
            .correlator()
            .find(signer.provider().as_ref(), &filter, |log| {
                decode_event::<ICryptoCardGame::CardFlipped>(log)
                    .filter(|e| e.player == player && e.row == row_u && e.col == col_u)
            })
            .await;

        let outcome = {
            let mut play = self.play.lock().await;
            let outcome = match event {
                Some(e) if e.isMatch => {
                    play.matched.insert(first);
                    play.matched.insert(pos);
                    FlipOutcome::Matched {
                        symbol,
                        reward: e.reward,
                        jackpot: symbol.is_jackpot(),
                    }
                }
                Some(_) => FlipOutcome::NoMatch,
                None => {
                    warn!(row, col, "CardFlipped event not found");
                    FlipOutcome::Unconfirmed
                }
            };
            play.close_pair();
            outcome
        };

        info!(row, col, outcome = ?outcome, "Second card flipped");
        self.status.refresh().await;
        Ok(outcome)
    }

    pub async fn claim_rewards(&self) -> Result<(), ScreenError> {
        let _busy = self.screen.begin()?;
        let signer = self.screen.signer()?;
        let pending = self
            .status
            .current()
            .status
            .map(|s| s.pending_rewards)
            .unwrap_or_default();
        if pending.is_zero() {
            return Err(ScreenError::not_ready("No rewards available to claim."));
        }

        let result = self
            .screen
            .send(
                &signer,
                self.screen.handle().contracts().card_game,
                ICryptoCardGame::claimRewardsCall {},
                TxOptions::new("Claim rewards", "Claim failed."),
            )
            .await;
        self.status.refresh().await;
        result?;
        Ok(())
    }
}

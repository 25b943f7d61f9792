//! Coup rule engine - cards, players and the per-room state machine.
//!
//! This module provides the whole game without any I/O:
//! - Cards, the court deck and players
//! - The action catalogue and its claims, costs and blocks
//! - A state machine that validates every command before it touches the game
//! - Narrative text and per-viewer status views

pub mod actions;
pub mod constants;
pub mod entities;
mod resolution;
pub mod state_machine;

pub use actions::{ActionKind, UnknownAction};
pub use entities::{Card, Coins, Deck, DeckError, Player, PlayerError, Role, UnknownRole, Username};
pub use state_machine::{
    GameSettings, GameState, InvalidMove, Narrative, PendingAction, RoomId, Status,
};

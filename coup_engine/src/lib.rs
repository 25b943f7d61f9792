//! # Coup Engine
//!
//! A rule engine for the card game Coup, built as a per-room state machine.
//!
//! The engine tracks the court deck, every player's hand and coins, whose turn
//! it is, and where the current action stands in its resolution. Every
//! command is validated before it touches the game, so a rejected command
//! leaves the game exactly as it was.
//!
//! ## Statuses
//!
//! An action moves through a small set of statuses:
//!
//! - **Ready**: nothing pending, the next player may act
//! - **Acted**: an action was announced and may be challenged or blocked
//! - **Challenged / ChallengeLost / ChallengeLossResolved**: the action's claim
//!   was called and is being settled
//! - **Blocked / BlockChallenged / BlockChallengeWon / BlockChallengeLost /
//!   BlockChallengeLossResolved**: the same, for a block
//! - **CardsTaken**: an exchange drew its cards and waits for a choice
//!
//! ## Core Modules
//!
//! - [`game`]: Cards, players, actions and the state machine
//! - [`room`]: One async actor per room, and a manager keyed by room id
//!
//! ## Example
//!
//! ```
//! use coup_engine::{ActionKind, GameSettings, GameState, Status, Username};
//!
//! let players = [Username::new("alice"), Username::new("bob")];
//! let mut game = GameState::create("general", &players, GameSettings::default()).unwrap();
//! game.take_action(&players[0], ActionKind::Income, None).unwrap();
//! assert_eq!(game.status(), Status::Ready);
//! assert_eq!(game.next_player().username, players[1]);
//! ```

/// Core game logic, entities, and state machine.
pub mod game;
pub use game::{
    ActionKind, Card, Coins, Deck, GameSettings, GameState, InvalidMove, Narrative, Player, Role,
    RoomId, Status, Username,
    constants::{self, MAX_PLAYERS, TOTAL_CARDS},
};

/// Async room actors and the room store.
pub mod room;
pub use room::{RoomCommand, RoomConfig, RoomManager, RoomResponse};

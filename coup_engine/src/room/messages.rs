//! Room actor message types.

use thiserror::Error;
use tokio::sync::oneshot;

use crate::game::{ActionKind, Role, RoomId, Username};

/// Everything a player can ask of a room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomCommand {
    /// Deal a new game for these players, first one acts first
    Deal(Vec<Username>),

    /// Throw away the current game, if any, and deal a new one
    Restart(Vec<Username>),

    /// Throw away the current game
    Cancel,

    /// Show the table to the whole room
    Status,

    /// Show the table to the requester only
    View,

    /// Show the requester their own hand
    Hand,

    /// Take a turn
    Action {
        action: ActionKind,
        target: Option<Username>,
    },

    Challenge,

    /// Show a card after being challenged
    Reveal(Role),

    /// Flip a card after losing a challenge
    Flip(Role),

    Block(Role),

    /// Draw the exchange cards
    TakeCards,

    /// Choose which cards to keep after an exchange
    Keep(Vec<Role>),

    /// Give up a card to an assassination or coup
    LoseCard(Role),
}

/// Messages that can be sent to a RoomActor
#[derive(Debug)]
pub enum RoomMessage {
    /// Run a player command
    Command {
        username: Username,
        command: RoomCommand,
        response: oneshot::Sender<RoomResponse>,
    },

    /// Stop the actor
    Close { response: oneshot::Sender<()> },

    /// Stop the actor only if no game is loaded. Replies whether it stopped.
    CloseIfIdle { response: oneshot::Sender<bool> },
}

/// Reply to a command, addressed either to the room or to the requester.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomResponse {
    /// Shown to everyone in the room
    Broadcast(String),

    /// Shown only to the player who sent the command
    Private(String),
}

impl RoomResponse {
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            RoomResponse::Broadcast(text) | RoomResponse::Private(text) => text,
        }
    }

    #[must_use]
    pub fn is_broadcast(&self) -> bool {
        matches!(self, RoomResponse::Broadcast(_))
    }
}

/// Failures talking to a room, as opposed to failures inside the game.
#[derive(Debug, Clone, Eq, Error, PartialEq)]
pub enum RoomError {
    #[error("room {0} is closed")]
    Closed(RoomId),
    #[error("room {0} dropped the reply")]
    NoReply(RoomId),
}

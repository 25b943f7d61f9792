//! Room actor implementation with async message handling.

use super::{
    config::RoomConfig,
    messages::{RoomCommand, RoomError, RoomMessage, RoomResponse},
};
use crate::game::{GameState, InvalidMove, Narrative, RoomId, Username};
use tokio::sync::{mpsc, oneshot};

pub(super) const NO_GAME: &str =
    "There's no game running in this room. To start a new game, `deal [usernames]`.";
const NOT_PLAYING: &str = "You're not in this game! To start a new game, `deal [usernames]`.";
const ALREADY_RUNNING: &str = "There's already a game running in this room! \
    To cancel it and start a new one, `restart [usernames]`.";
const CANCELLED: &str = "Game over, everyone loses. To start a new game, `deal [usernames]`.";

/// Room actor handle for sending messages
#[derive(Clone, Debug)]
pub struct RoomHandle {
    sender: mpsc::Sender<RoomMessage>,
    room_id: RoomId,
}

impl RoomHandle {
    pub fn new(sender: mpsc::Sender<RoomMessage>, room_id: RoomId) -> Self {
        Self { sender, room_id }
    }

    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    /// Whether the actor has stopped taking messages
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Send a message to the room
    pub async fn send(&self, message: RoomMessage) -> Result<(), RoomError> {
        self.sender
            .send(message)
            .await
            .map_err(|_| RoomError::Closed(self.room_id.clone()))
    }

    /// Run a command and wait for the room's reply.
    pub async fn execute(
        &self,
        username: Username,
        command: RoomCommand,
    ) -> Result<RoomResponse, RoomError> {
        let (tx, rx) = oneshot::channel();
        self.send(RoomMessage::Command {
            username,
            command,
            response: tx,
        })
        .await?;
        rx.await.map_err(|_| RoomError::NoReply(self.room_id.clone()))
    }

    /// Ask the actor to stop and wait until it has.
    pub async fn close(&self) -> Result<(), RoomError> {
        let (tx, rx) = oneshot::channel();
        self.send(RoomMessage::Close { response: tx }).await?;
        rx.await.map_err(|_| RoomError::NoReply(self.room_id.clone()))
    }

    /// Stop the actor if it holds no game. Returns whether it stopped.
    pub async fn close_if_idle(&self) -> Result<bool, RoomError> {
        let (tx, rx) = oneshot::channel();
        self.send(RoomMessage::CloseIfIdle { response: tx }).await?;
        rx.await.map_err(|_| RoomError::NoReply(self.room_id.clone()))
    }
}

/// Room actor owning the game of a single room
pub struct RoomActor {
    id: RoomId,

    config: RoomConfig,

    /// None until someone deals, and again after a cancel
    game: Option<GameState>,

    inbox: mpsc::Receiver<RoomMessage>,
}

impl RoomActor {
    /// Create a new room actor and the handle used to reach it
    pub fn new(id: RoomId, config: RoomConfig) -> (Self, RoomHandle) {
        let (sender, inbox) = mpsc::channel(config.inbox_capacity.max(1));
        let handle = RoomHandle::new(sender, id.clone());
        let actor = Self {
            id,
            config,
            game: None,
            inbox,
        };
        (actor, handle)
    }

    /// Run the room actor event loop
    pub async fn run(mut self) {
        log::info!("Room {} starting", self.id);

        while let Some(message) = self.inbox.recv().await {
            match message {
                RoomMessage::Command {
                    username,
                    command,
                    response,
                } => {
                    let reply = self.handle_command(&username, command);
                    let _ = response.send(reply);
                }
                RoomMessage::Close { response } => {
                    // Refuse anything sent after the close before confirming it.
                    self.inbox.close();
                    let _ = response.send(());
                    break;
                }
                RoomMessage::CloseIfIdle { response } => {
                    let idle = self.game.is_none();
                    if idle {
                        self.inbox.close();
                    }
                    let _ = response.send(idle);
                    if idle {
                        break;
                    }
                }
            }
        }

        log::info!("Room {} closed", self.id);
    }

    /// Handle one command. Game commands run against a draft copy of the game
    /// that only replaces the real one if the command succeeds.
    fn handle_command(&mut self, username: &Username, command: RoomCommand) -> RoomResponse {
        // These don't need an existing game or a player.
        match command {
            RoomCommand::Deal(usernames) => {
                if self.game.is_some() {
                    return RoomResponse::Private(ALREADY_RUNNING.to_string());
                }
                return self.deal(&usernames);
            }
            RoomCommand::Restart(usernames) => {
                if self.game.is_some() {
                    log::info!("Room {}: {username} restarted the game", self.id);
                }
                return self.deal(&usernames);
            }
            _ => {}
        }

        // These need a game, but not a player.
        let Some(game) = &self.game else {
            return RoomResponse::Private(NO_GAME.to_string());
        };
        match command {
            RoomCommand::Cancel => {
                log::info!("Room {}: {username} cancelled the game", self.id);
                self.game = None;
                return RoomResponse::Broadcast(CANCELLED.to_string());
            }
            RoomCommand::Status => return RoomResponse::Broadcast(game.status_view(None)),
            _ => {}
        }

        // These need a game and a player.
        if game.get_player(username).is_none() {
            return RoomResponse::Private(NOT_PLAYING.to_string());
        }
        match command {
            RoomCommand::View => return RoomResponse::Private(game.status_view(Some(username))),
            RoomCommand::Hand => {
                return match game.player_view(username) {
                    Ok(view) => RoomResponse::Private(view),
                    Err(e) => RoomResponse::Private(e.to_string()),
                };
            }
            _ => {}
        }

        let mut draft = game.clone();
        match Self::apply(&mut draft, username, command) {
            Ok(narrative) => {
                self.game = Some(draft);
                RoomResponse::Broadcast(narrative.to_string())
            }
            Err(e) => {
                log::debug!("Room {}: rejected move from {username}: {e}", self.id);
                RoomResponse::Private(e.to_string())
            }
        }
    }

    fn deal(&mut self, usernames: &[Username]) -> RoomResponse {
        match GameState::create(self.id.clone(), usernames, self.config.settings.clone()) {
            Ok(game) => {
                let mentions = usernames
                    .iter()
                    .map(Username::mention)
                    .collect::<Vec<_>>()
                    .join(" ");
                let first = game.next_player().username.mention();
                self.game = Some(game);
                RoomResponse::Broadcast(format!(
                    "{mentions}, get ready for a game of Coup! Use `cards` to view your cards, \
                     and `action <action>` to take an action. {first}, it's your turn."
                ))
            }
            Err(e) => RoomResponse::Private(e.to_string()),
        }
    }

    fn apply(
        game: &mut GameState,
        username: &Username,
        command: RoomCommand,
    ) -> Result<Narrative, InvalidMove> {
        match command {
            RoomCommand::Action { action, target } => {
                game.take_action(username, action, target.as_ref())
            }
            RoomCommand::Challenge => game.pose_challenge(username),
            RoomCommand::Reveal(role) => game.resolve_challenge(username, role),
            RoomCommand::Flip(role) => game.lose_challenge(username, role),
            RoomCommand::Block(role) => game.pose_block(username, role),
            RoomCommand::TakeCards => game.take_cards(username),
            RoomCommand::Keep(roles) => game.keep_cards(username, &roles),
            RoomCommand::LoseCard(role) => game.lose_card(username, role),
            RoomCommand::Deal(_)
            | RoomCommand::Restart(_)
            | RoomCommand::Cancel
            | RoomCommand::Status
            | RoomCommand::View
            | RoomCommand::Hand => Ok(Narrative::new()),
        }
    }
}

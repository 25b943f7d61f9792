//! Room manager for spawning and tracking room actors.

use super::{
    actor::{NO_GAME, RoomActor, RoomHandle},
    config::RoomConfig,
    messages::{RoomCommand, RoomError, RoomResponse},
};
use crate::game::{RoomId, Username};
use std::{collections::HashMap, sync::Arc};
use tokio::sync::RwLock;

/// Store of live rooms, keyed by room id
#[derive(Clone)]
pub struct RoomManager {
    /// Configuration every new room starts with
    config: RoomConfig,

    /// Active room handles
    rooms: Arc<RwLock<HashMap<RoomId, RoomHandle>>>,
}

impl RoomManager {
    pub fn new(config: RoomConfig) -> Self {
        Self {
            config,
            rooms: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn config(&self) -> &RoomConfig {
        &self.config
    }

    pub async fn get_room(&self, room_id: &str) -> Option<RoomHandle> {
        let rooms = self.rooms.read().await;
        rooms.get(room_id).cloned()
    }

    /// Get the room's handle, spawning its actor the first time the room is
    /// mentioned.
    pub async fn get_or_spawn(&self, room_id: &str) -> RoomHandle {
        if let Some(handle) = self.get_room(room_id).await {
            return handle;
        }

        let mut rooms = self.rooms.write().await;
        // Someone may have spawned it between the two locks.
        if let Some(handle) = rooms.get(room_id) {
            return handle.clone();
        }
        let (actor, handle) = RoomActor::new(room_id.to_string(), self.config.clone());
        tokio::spawn(async move {
            actor.run().await;
        });
        rooms.insert(room_id.to_string(), handle.clone());
        log::info!("Spawned room {}", room_id);
        handle
    }

    /// Run a command in a room and return its reply.
    ///
    /// Only `Deal` and `Restart` bring a room to life. A room left without a
    /// game afterwards, by a cancel or a failed deal, is shut down.
    pub async fn execute(
        &self,
        room_id: &str,
        username: Username,
        command: RoomCommand,
    ) -> Result<RoomResponse, RoomError> {
        let spawns = matches!(command, RoomCommand::Deal(_) | RoomCommand::Restart(_));
        let may_idle = spawns || matches!(command, RoomCommand::Cancel);

        let reply = match self.try_execute(room_id, &username, &command, spawns).await {
            // The room shut down before reading the command; try a fresh one.
            Err(RoomError::Closed(_) | RoomError::NoReply(_)) => {
                self.forget_if_closed(room_id).await;
                self.try_execute(room_id, &username, &command, spawns).await?
            }
            reply => reply?,
        };

        if may_idle {
            self.close_if_idle(room_id).await;
        }
        Ok(reply)
    }

    async fn try_execute(
        &self,
        room_id: &str,
        username: &Username,
        command: &RoomCommand,
        spawns: bool,
    ) -> Result<RoomResponse, RoomError> {
        let handle = if spawns {
            self.get_or_spawn(room_id).await
        } else {
            match self.get_room(room_id).await {
                Some(handle) => handle,
                None => return Ok(RoomResponse::Private(NO_GAME.to_string())),
            }
        };
        handle.execute(username.clone(), command.clone()).await
    }

    async fn forget_if_closed(&self, room_id: &str) {
        let mut rooms = self.rooms.write().await;
        if rooms.get(room_id).is_some_and(RoomHandle::is_closed) {
            rooms.remove(room_id);
        }
    }

    /// Shut the room down and forget it if it holds no game.
    async fn close_if_idle(&self, room_id: &str) {
        // Held across the round trip so nobody picks up the handle meanwhile.
        let mut rooms = self.rooms.write().await;
        let Some(handle) = rooms.get(room_id).cloned() else {
            return;
        };
        match handle.close_if_idle().await {
            Ok(false) => {}
            Ok(true) => {
                rooms.remove(room_id);
                log::info!("Closed idle room {}", room_id);
            }
            Err(e) => {
                rooms.remove(room_id);
                log::warn!("Dropped unreachable room {}: {}", room_id, e);
            }
        }
    }

    /// Stop a room's actor and forget it. Its game goes with it.
    pub async fn close_room(&self, room_id: &str) -> Result<(), RoomError> {
        let handle = {
            let mut rooms = self.rooms.write().await;
            rooms.remove(room_id)
        };
        if let Some(handle) = handle {
            handle.close().await?;
            log::info!("Closed room {}", room_id);
        }
        Ok(())
    }

    /// Stop every room. Used on shutdown.
    pub async fn close_all(&self) {
        let handles: Vec<RoomHandle> = {
            let mut rooms = self.rooms.write().await;
            rooms.drain().map(|(_, handle)| handle).collect()
        };
        for handle in handles {
            if let Err(e) = handle.close().await {
                log::warn!("Failed to close room {}: {}", handle.room_id(), e);
            }
        }
    }

    pub async fn active_room_count(&self) -> usize {
        let rooms = self.rooms.read().await;
        rooms.len()
    }
}

//! Room module: one async actor per game room.
//!
//! This module implements:
//! - RoomActor: owns the game of a single room and applies one command at a time
//! - RoomManager: store of room handles keyed by room id; a deal spawns the actor
//!   and a room left without a game is shut down
//! - Message types for talking to a room over tokio channels
//!
//! ## Architecture
//!
//! Each room runs in its own Tokio task with an mpsc inbox. Every command
//! carries a oneshot sender for its reply, so commands for one room never
//! interleave while different rooms make progress independently.
//!
//! ## Example
//!
//! ```no_run
//! use coup_engine::room::{RoomCommand, RoomConfig, RoomManager};
//! use coup_engine::game::Username;
//!
//! #[tokio::main]
//! async fn main() {
//!     let manager = RoomManager::new(RoomConfig::default());
//!     let names = vec![Username::new("alice"), Username::new("bob")];
//!     let reply = manager
//!         .execute("general", Username::new("alice"), RoomCommand::Deal(names))
//!         .await
//!         .unwrap();
//!     println!("{}", reply.text());
//! }
//! ```

pub mod actor;
pub mod config;
pub mod manager;
pub mod messages;

pub use actor::{RoomActor, RoomHandle};
pub use config::RoomConfig;
pub use manager::RoomManager;
pub use messages::{RoomCommand, RoomError, RoomMessage, RoomResponse};

//! Server configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use coup_engine::{
    GameSettings, RoomConfig,
    constants::{
        DEFAULT_FORCED_COUP_AT, DEFAULT_MIN_PLAYERS, DEFAULT_STARTING_MONEY, MAX_PLAYERS,
    },
    game::Coins,
    room::config::DEFAULT_INBOX_CAPACITY,
};

/// Complete server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Smallest table a deal accepts
    pub min_players: usize,
    /// Largest table a deal accepts
    pub max_players: usize,
    /// Coins each player starts with
    pub starting_money: Coins,
    /// Players holding at least this much must coup
    pub forced_coup_at: Coins,
    /// Commands that may queue up for a single room
    pub room_inbox: usize,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Arguments
    ///
    /// * `max_players_override` - Optional max players override (from CLI args)
    /// * `starting_money_override` - Optional starting money override (from CLI args)
    pub fn from_env(
        max_players_override: Option<usize>,
        starting_money_override: Option<Coins>,
    ) -> Self {
        let max_players =
            max_players_override.unwrap_or_else(|| parse_env_or("COUP_MAX_PLAYERS", MAX_PLAYERS));
        let starting_money = starting_money_override
            .unwrap_or_else(|| parse_env_or("COUP_STARTING_MONEY", DEFAULT_STARTING_MONEY));

        ServerConfig {
            min_players: parse_env_or("COUP_MIN_PLAYERS", DEFAULT_MIN_PLAYERS),
            max_players,
            starting_money,
            forced_coup_at: parse_env_or("COUP_FORCED_COUP_AT", DEFAULT_FORCED_COUP_AT),
            room_inbox: parse_env_or("COUP_ROOM_INBOX", DEFAULT_INBOX_CAPACITY),
        }
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_players < DEFAULT_MIN_PLAYERS {
            return Err(ConfigError::Invalid {
                var: "COUP_MIN_PLAYERS".to_string(),
                reason: format!("Must be at least {DEFAULT_MIN_PLAYERS}"),
            });
        }

        if self.max_players > MAX_PLAYERS {
            return Err(ConfigError::Invalid {
                var: "COUP_MAX_PLAYERS".to_string(),
                reason: format!("Must be at most {MAX_PLAYERS} (the deck runs out otherwise)"),
            });
        }

        if self.max_players < self.min_players {
            return Err(ConfigError::Invalid {
                var: "COUP_MAX_PLAYERS".to_string(),
                reason: format!("Must be at least min players ({})", self.min_players),
            });
        }

        if self.room_inbox == 0 {
            return Err(ConfigError::Invalid {
                var: "COUP_ROOM_INBOX".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        self.room_config()
            .validate()
            .map_err(|reason| ConfigError::Invalid {
                var: "COUP_FORCED_COUP_AT".to_string(),
                reason,
            })
    }

    /// The configuration every room is spawned with.
    pub fn room_config(&self) -> RoomConfig {
        RoomConfig {
            settings: GameSettings::new(
                self.starting_money,
                self.forced_coup_at,
                self.min_players,
                self.max_players,
            ),
            inbox_capacity: self.room_inbox,
        }
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

/// Helper to parse environment variable with default fallback
fn parse_env_or<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

//! Room configuration.

use serde::{Deserialize, Serialize};

use crate::game::GameSettings;

/// Default size of a room's command inbox.
pub const DEFAULT_INBOX_CAPACITY: usize = 100;

/// Everything a room needs to know before it deals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomConfig {
    /// Rules for every game dealt in the room
    pub settings: GameSettings,

    /// Commands that may queue up before senders wait
    pub inbox_capacity: usize,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            settings: GameSettings::default(),
            inbox_capacity: DEFAULT_INBOX_CAPACITY,
        }
    }
}

impl RoomConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        self.settings.validate()?;
        if self.inbox_capacity == 0 {
            return Err("Room inbox capacity must be at least 1".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(RoomConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_inbox_is_rejected() {
        let config = RoomConfig {
            inbox_capacity: 0,
            ..RoomConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bad_settings_are_rejected() {
        let config = RoomConfig {
            settings: GameSettings::new(2, 10, 5, 3),
            ..RoomConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err("Min players can't exceed max players".to_string())
        );
    }

    #[test]
    fn test_config_json_round_trip() {
        let config = RoomConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"forced_coup_at\":10"));
        let parsed: RoomConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }
}

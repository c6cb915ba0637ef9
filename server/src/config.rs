//! Gameplay rules and transport settings.
//!
//! `ArenaConfig::default()` reproduces the constants in `shared`, which the
//! presentation layer uses too. Overriding them on the command line is meant
//! for testing and tuning, not for serving stock clients.

use shared::{
    ARENA_HEIGHT, ARENA_WIDTH, DEFAULT_ROOM_CAPACITY, HOOK_MAX_LENGTH, HOOK_SPEED, HOOK_TICK_MS,
    MAX_ROOM_CAPACITY, PLAYER_SIZE, RESET_DELAY_MS, RESPAWN_DELAY_MS, WIN_SCORE,
};
use std::time::Duration;

use crate::error::ConfigError;

/// Rules of a match, shared by every room of one arena.
#[derive(Debug, Clone, PartialEq)]
pub struct ArenaConfig {
    pub arena_width: f32,
    pub arena_height: f32,
    pub player_size: f32,
    /// Members needed to start a match; also the hard cap per room.
    pub room_capacity: usize,
    pub hook_max_length: f32,
    /// Hook travel speed in units per second.
    pub hook_speed: f32,
    pub hook_tick: Duration,
    pub respawn_delay: Duration,
    pub reset_delay: Duration,
    pub win_score: u32,
    /// Fixed seed for spawn points. `None` seeds from entropy.
    pub rng_seed: Option<u64>,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            arena_width: ARENA_WIDTH,
            arena_height: ARENA_HEIGHT,
            player_size: PLAYER_SIZE,
            room_capacity: DEFAULT_ROOM_CAPACITY,
            hook_max_length: HOOK_MAX_LENGTH,
            hook_speed: HOOK_SPEED,
            hook_tick: Duration::from_millis(HOOK_TICK_MS),
            respawn_delay: Duration::from_millis(RESPAWN_DELAY_MS),
            reset_delay: Duration::from_millis(RESET_DELAY_MS),
            win_score: WIN_SCORE,
            rng_seed: None,
        }
    }
}

impl ArenaConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(2..=MAX_ROOM_CAPACITY).contains(&self.room_capacity) {
            return Err(ConfigError::RoomCapacity(self.room_capacity));
        }
        if self.win_score == 0 {
            return Err(ConfigError::WinScore);
        }
        if !(self.hook_max_length > 0.0 && self.hook_speed > 0.0) {
            return Err(ConfigError::HookParameters);
        }
        if self.hook_tick.is_zero() || self.respawn_delay.is_zero() || self.reset_delay.is_zero() {
            return Err(ConfigError::ZeroDuration);
        }

        // Smallest band produced by the partition must still hold a player.
        let (columns, rows) = if self.room_capacity == 4 {
            (2.0, 2.0)
        } else {
            (1.0, self.room_capacity as f32)
        };
        if self.player_size <= 0.0
            || self.arena_width / columns < self.player_size
            || self.arena_height / rows < self.player_size
        {
            return Err(ConfigError::ArenaTooSmall);
        }
        Ok(())
    }

    /// Distance the hook tip advances per tick.
    pub fn hook_step(&self) -> f32 {
        self.hook_speed * self.hook_tick.as_secs_f32()
    }

    pub fn half_size(&self) -> f32 {
        self.player_size / 2.0
    }
}

/// Transport settings for the UDP front end.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub max_clients: usize,
    pub client_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:3000".to_string(),
            max_clients: 64,
            client_timeout: Duration::from_secs(5),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_default_config_is_valid() {
        let config = ArenaConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.room_capacity, 2);
        assert_approx_eq!(config.hook_step(), 18.75, 1e-4);
        assert_eq!(config.half_size(), 16.0);
    }

    #[test]
    fn test_capacity_range() {
        for capacity in [0, 1, 5] {
            let config = ArenaConfig {
                room_capacity: capacity,
                ..ArenaConfig::default()
            };
            assert_eq!(config.validate(), Err(ConfigError::RoomCapacity(capacity)));
        }
        for capacity in 2..=4 {
            let config = ArenaConfig {
                room_capacity: capacity,
                ..ArenaConfig::default()
            };
            assert!(config.validate().is_ok());
        }
    }

    #[test]
    fn test_rejects_degenerate_rules() {
        let zero_score = ArenaConfig {
            win_score: 0,
            ..ArenaConfig::default()
        };
        assert_eq!(zero_score.validate(), Err(ConfigError::WinScore));

        let zero_tick = ArenaConfig {
            hook_tick: Duration::ZERO,
            ..ArenaConfig::default()
        };
        assert_eq!(zero_tick.validate(), Err(ConfigError::ZeroDuration));

        let no_speed = ArenaConfig {
            hook_speed: 0.0,
            ..ArenaConfig::default()
        };
        assert_eq!(no_speed.validate(), Err(ConfigError::HookParameters));

        let cramped = ArenaConfig {
            arena_height: 40.0,
            ..ArenaConfig::default()
        };
        assert_eq!(cramped.validate(), Err(ConfigError::ArenaTooSmall));
    }
}

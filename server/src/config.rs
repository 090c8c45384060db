//! Gameplay and board constants for a session
//!
//! Every value has the documented default from `snake_shared`. The binary
//! overrides a subset of them from command-line flags and validates the
//! result once at startup, so the session can assume a consistent board.

use crate::error::ConfigError;
use snake_shared::{
    Packet, BOARD_SIZE, ENTITY_SIZE, GROWTH_PER_FOOD, INITIAL_LENGTH, MAX_DATAGRAM_SIZE,
    MAX_PLAYERS, MOVEMENT_STEP, TICK_MILLIS, WIN_SCORE,
};
use std::time::Duration;

/// Importance of a session message, lower is more important
///
/// Messages at or below the configured visibility level are shown to viewers;
/// every message goes to the server log regardless.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MessageLevel {
    Important = 0,
    Info = 1,
    Debug = 2,
    Verbose = 3,
}

#[derive(Debug, Clone)]
pub struct GameConfig {
    /// Width and height of the square board
    pub board_size: i32,
    /// Side length of snake segments and food
    pub entity_size: i32,
    /// Distance a head travels per tick
    pub movement_step: i32,
    pub tick_period: Duration,
    pub max_players: usize,
    pub win_score: u32,
    pub initial_length: usize,
    pub growth_per_food: usize,
    /// Highest message level that is pushed to subscribers
    pub message_level: MessageLevel,
    /// Per-subscriber queue depth before updates are dropped
    pub subscriber_buffer: usize,
    /// Fixed RNG seed; entropy is used when absent
    pub seed: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            board_size: BOARD_SIZE,
            entity_size: ENTITY_SIZE,
            movement_step: MOVEMENT_STEP,
            tick_period: Duration::from_millis(TICK_MILLIS),
            max_players: MAX_PLAYERS,
            win_score: WIN_SCORE,
            initial_length: INITIAL_LENGTH,
            growth_per_food: GROWTH_PER_FOOD,
            message_level: MessageLevel::Info,
            subscriber_buffer: 64,
            seed: None,
        }
    }
}

impl GameConfig {
    /// Largest coordinate a head may occupy without touching the wall.
    pub fn max_coordinate(&self) -> i32 {
        self.board_size - self.entity_size
    }

    /// Number of segments directly behind the head that are never tested
    /// for self collision. They overlap the head geometrically while moving
    /// straight or turning, so testing them would always report a hit.
    pub fn self_check_skip(&self) -> usize {
        let steps_per_cell = (self.entity_size + self.movement_step - 1) / self.movement_step;
        steps_per_cell as usize + 1
    }

    /// Most cells a snake can occupy in any pushed snapshot. The game ends
    /// on the tick the winning food is eaten, before that growth shows up.
    pub fn max_body_length(&self) -> usize {
        let meals = self.win_score.saturating_sub(1) as usize;
        self.initial_length
            .saturating_add(self.growth_per_food.saturating_mul(meals))
    }

    /// Encoded size of the largest possible player-locations update.
    pub fn max_players_update_len(&self) -> usize {
        Packet::players_update_len(self.max_players, self.max_body_length())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.entity_size <= 0 {
            return Err(ConfigError::EntitySize(self.entity_size));
        }
        // Spawns are drawn from [entity_size, board_size - entity_size).
        if self.board_size <= self.entity_size * 3 {
            return Err(ConfigError::BoardTooSmall {
                board_size: self.board_size,
                entity_size: self.entity_size,
            });
        }
        if self.movement_step <= 0 || self.movement_step > self.entity_size {
            return Err(ConfigError::MovementStep {
                step: self.movement_step,
                entity_size: self.entity_size,
            });
        }
        if self.tick_period.is_zero() {
            return Err(ConfigError::TickPeriod);
        }
        if self.max_players == 0 {
            return Err(ConfigError::MaxPlayers);
        }
        if self.win_score == 0 {
            return Err(ConfigError::WinScore);
        }
        if self.initial_length == 0 {
            return Err(ConfigError::InitialLength);
        }
        if self.subscriber_buffer == 0 {
            return Err(ConfigError::SubscriberBuffer);
        }
        // Every player-locations update must fit in one datagram.
        let bytes = self.max_players_update_len();
        if bytes > MAX_DATAGRAM_SIZE {
            return Err(ConfigError::PacketTooLarge {
                players: self.max_players,
                cells: self.max_body_length(),
                bytes,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_matches_documented_constants() {
        let config = GameConfig::default();
        assert_eq!(config.board_size, 500);
        assert_eq!(config.entity_size, 10);
        assert_eq!(config.movement_step, 5);
        assert_eq!(config.tick_period, Duration::from_millis(20));
        assert_eq!(config.max_players, 8);
        assert_eq!(config.win_score, 30);
        assert_eq!(config.initial_length, 5);
        assert_eq!(config.growth_per_food, 10);
        assert_eq!(config.message_level, MessageLevel::Info);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_max_coordinate() {
        assert_eq!(GameConfig::default().max_coordinate(), 490);
    }

    #[test]
    fn test_self_check_skip() {
        assert_eq!(GameConfig::default().self_check_skip(), 3);

        let config = GameConfig {
            movement_step: 10,
            ..GameConfig::default()
        };
        assert_eq!(config.self_check_skip(), 2);

        let config = GameConfig {
            movement_step: 3,
            ..GameConfig::default()
        };
        assert_eq!(config.self_check_skip(), 5);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let too_small = GameConfig {
            board_size: 20,
            ..GameConfig::default()
        };
        assert!(matches!(
            too_small.validate(),
            Err(ConfigError::BoardTooSmall { .. })
        ));

        let big_step = GameConfig {
            movement_step: 11,
            ..GameConfig::default()
        };
        assert!(matches!(
            big_step.validate(),
            Err(ConfigError::MovementStep { .. })
        ));

        let zero_tick = GameConfig {
            tick_period: Duration::ZERO,
            ..GameConfig::default()
        };
        assert!(matches!(zero_tick.validate(), Err(ConfigError::TickPeriod)));

        let no_players = GameConfig {
            max_players: 0,
            ..GameConfig::default()
        };
        assert!(matches!(no_players.validate(), Err(ConfigError::MaxPlayers)));
    }

    #[test]
    fn test_max_body_length() {
        assert_eq!(GameConfig::default().max_body_length(), 295);

        let config = GameConfig {
            win_score: 1,
            ..GameConfig::default()
        };
        assert_eq!(config.max_body_length(), 5);
    }

    #[test]
    fn test_validate_rejects_oversized_player_updates() {
        assert_eq!(GameConfig::default().max_players_update_len(), 37_868);

        let many_players = GameConfig {
            max_players: 16,
            ..GameConfig::default()
        };
        assert_eq!(
            many_players.validate(),
            Err(ConfigError::PacketTooLarge {
                players: 16,
                cells: 295,
                bytes: 75_724,
            })
        );

        let long_game = GameConfig {
            win_score: 55,
            ..GameConfig::default()
        };
        assert!(matches!(
            long_game.validate(),
            Err(ConfigError::PacketTooLarge { cells: 545, .. })
        ));

        let huge = GameConfig {
            win_score: u32::MAX,
            max_players: usize::MAX,
            ..GameConfig::default()
        };
        assert!(matches!(
            huge.validate(),
            Err(ConfigError::PacketTooLarge { .. })
        ));

        // Fewer players leave room for longer games.
        let duel = GameConfig {
            max_players: 2,
            win_score: 100,
            ..GameConfig::default()
        };
        assert!(duel.validate().is_ok());
    }

    #[test]
    fn test_message_level_ordering() {
        assert!(MessageLevel::Important < MessageLevel::Info);
        assert!(MessageLevel::Info < MessageLevel::Debug);
        assert!(MessageLevel::Debug < MessageLevel::Verbose);
    }
}

//! Runtime configuration with environment overrides.
//!
//! Every field has a compiled-in default and can be overridden by a
//! `STRAFE_*` environment variable. Unparseable values fall back to the
//! default rather than failing startup.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    pub screen_width: u32,
    pub screen_height: u32,

    pub player_speed: f64,
    pub enemy_speed: f64,
    pub bullet_speed: f64,

    /// Enemies destroyed before the boss spawns.
    pub boss_threshold: u32,
    /// Seconds between enemy spawns.
    pub enemy_spawn_interval: f64,
    pub power_up_spawn_chance: f64,

    pub max_event_queue_size: usize,
    pub max_state_queue_size: usize,

    /// RNG seed for the spawn director. Same seed = same spawn sequence.
    pub seed: u64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            screen_width: 640,
            screen_height: 928,
            player_speed: 5.0,
            enemy_speed: 2.0,
            bullet_speed: 10.0,
            boss_threshold: 50,
            enemy_spawn_interval: 2.0,
            power_up_spawn_chance: 0.1,
            max_event_queue_size: 100,
            max_state_queue_size: 10,
            seed: 42,
        }
    }
}

impl GameConfig {
    /// Defaults overlaid with any `STRAFE_*` environment overrides.
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            screen_width: env_parse("STRAFE_SCREEN_WIDTH", d.screen_width),
            screen_height: env_parse("STRAFE_SCREEN_HEIGHT", d.screen_height),
            player_speed: env_parse("STRAFE_PLAYER_SPEED", d.player_speed),
            enemy_speed: env_parse("STRAFE_ENEMY_SPEED", d.enemy_speed),
            bullet_speed: env_parse("STRAFE_BULLET_SPEED", d.bullet_speed),
            boss_threshold: env_parse("STRAFE_BOSS_THRESHOLD", d.boss_threshold),
            enemy_spawn_interval: env_parse("STRAFE_ENEMY_SPAWN_INTERVAL", d.enemy_spawn_interval),
            power_up_spawn_chance: env_parse(
                "STRAFE_POWER_UP_SPAWN_CHANCE",
                d.power_up_spawn_chance,
            ),
            max_event_queue_size: env_parse("STRAFE_MAX_EVENT_QUEUE_SIZE", d.max_event_queue_size),
            max_state_queue_size: env_parse("STRAFE_MAX_STATE_QUEUE_SIZE", d.max_state_queue_size),
            seed: env_parse("STRAFE_SEED", d.seed),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => raw.parse().unwrap_or(default),
        Err(_) => default,
    }
}

//! On-demand diagnostic snapshot of the running game.

use serde::{Deserialize, Serialize};

use strafe_core::enums::GameState;

/// Point-in-time summary, assembled by [`crate::game::Game::snapshot`].
/// Counts are approximate under concurrency (each list is read separately).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub state: GameState,
    pub score: i64,
    pub high_score: i64,
    pub level: i32,
    pub difficulty: f64,
    pub bullets: usize,
    pub enemies: usize,
    pub formations: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_serializes_round_trip() {
        let snapshot = GameSnapshot {
            state: GameState::Playing,
            score: 1200,
            high_score: 4500,
            level: 3,
            difficulty: 1.2,
            bullets: 7,
            enemies: 4,
            formations: 1,
        };
        let json = serde_json::to_string(&snapshot).unwrap();
        let back: GameSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snapshot);
    }
}

//! Enumeration types used throughout the runtime.

use serde::{Deserialize, Serialize};

/// Top-level game state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameState {
    #[default]
    MainMenu,
    Playing,
    Paused,
    GameOver,
}

/// Concrete entity category, used in place of runtime type discrimination.
///
/// Collision eligibility is a pure function of the two kinds involved; see
/// [`EntityKind::can_collide_with`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Player,
    Enemy,
    Boss,
    FriendlyBullet,
    EnemyBullet,
    /// Aggregate of enemies. Participates in entity lifecycle but never in
    /// collision (eligible with nothing).
    Formation,
}

impl EntityKind {
    /// Collision eligibility table, symmetric by construction:
    /// - Player <-> Enemy, Player <-> Boss: always
    /// - Player <-> EnemyBullet, Enemy/Boss <-> FriendlyBullet: faction match
    /// - Enemy <-> Enemy, bullet <-> bullet: never
    pub fn can_collide_with(self, other: EntityKind) -> bool {
        use EntityKind::*;
        match (self, other) {
            (Player, Enemy) | (Enemy, Player) => true,
            (Player, Boss) | (Boss, Player) => true,
            (Player, EnemyBullet) | (EnemyBullet, Player) => true,
            (Enemy, FriendlyBullet) | (FriendlyBullet, Enemy) => true,
            (Boss, FriendlyBullet) | (FriendlyBullet, Boss) => true,
            _ => false,
        }
    }

    /// True for either bullet faction.
    pub fn is_bullet(self) -> bool {
        matches!(self, EntityKind::FriendlyBullet | EntityKind::EnemyBullet)
    }
}

/// Formation shape.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FormationKind {
    #[default]
    Line,
    Column,
    V,
    Circle,
}

/// High-level input action published on the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InputAction {
    Shoot,
    Up,
    Down,
    Left,
    Right,
}

impl InputAction {
    /// Short wire tag, kept for log/diagnostic compatibility.
    pub fn tag(self) -> &'static str {
        match self {
            InputAction::Shoot => "shoot",
            InputAction::Up => "up",
            InputAction::Down => "down",
            InputAction::Left => "left",
            InputAction::Right => "right",
        }
    }
}

/// The closed set of keys the input subsystem scans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    Space,
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
}

impl Key {
    /// Every scanned key, in a stable order.
    pub const ALL: [Key; 5] = [
        Key::Space,
        Key::ArrowUp,
        Key::ArrowDown,
        Key::ArrowLeft,
        Key::ArrowRight,
    ];

    /// The action a just-pressed transition of this key publishes.
    pub fn action(self) -> InputAction {
        match self {
            Key::Space => InputAction::Shoot,
            Key::ArrowUp => InputAction::Up,
            Key::ArrowDown => InputAction::Down,
            Key::ArrowLeft => InputAction::Left,
            Key::ArrowRight => InputAction::Right,
        }
    }
}

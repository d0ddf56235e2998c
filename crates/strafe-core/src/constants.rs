//! Runtime constants and tuning parameters.

/// Simulation tick rate (Hz).
pub const TICK_RATE: u32 = 60;

/// Seconds per fixed tick.
pub const FIXED_DT: f64 = 1.0 / TICK_RATE as f64;

/// Largest raw frame delta fed to the accumulator. Frames longer than this
/// (debugger stalls, window drags) are clamped to avoid a catch-up spiral.
pub const MAX_FRAME_DT: f64 = 1.0 / 10.0;

/// Cooldown comparison tolerance for the auto-fire state machines.
pub const EPSILON: f64 = 1e-9;

/// Slack on the accumulator-vs-step comparison. A frame reported as "16ms"
/// sits just under 1/60s; without the slack it would produce zero ticks and
/// the next frame two. Must stay well under [`FIXED_DT`].
pub const TICK_TOLERANCE: f64 = 2e-3;

// --- Event bus ---

/// Capacity of the bus's global inbound queue.
pub const INBOUND_QUEUE_CAPACITY: usize = 5000;

/// Capacity of each subscriber's outbound queue.
pub const SUBSCRIBER_QUEUE_CAPACITY: usize = 1000;

/// Maximum events drained per subscription per `update` call.
pub const DRAIN_BATCH: usize = 100;

// --- Player ---

pub const PLAYER_WIDTH: f64 = 32.0;
pub const PLAYER_HEIGHT: f64 = 32.0;
pub const PLAYER_HEALTH: i32 = 100;
pub const PLAYER_SHOOT_COOLDOWN: f64 = 0.2;

// --- Enemy ---

pub const ENEMY_WIDTH: f64 = 32.0;
pub const ENEMY_HEIGHT: f64 = 32.0;
pub const ENEMY_HEALTH: i32 = 20;
pub const ENEMY_MAX_COOLDOWN: f64 = 1.0;

// --- Boss ---

pub const BOSS_WIDTH: f64 = 64.0;
pub const BOSS_HEIGHT: f64 = 64.0;
pub const BOSS_HEALTH: i32 = 1000;
pub const BOSS_SPEED: f64 = 1.0;
pub const BOSS_MAX_COOLDOWN: f64 = 0.2;
/// A boss spawned above the screen descends until it holds this line.
pub const BOSS_HOLD_Y: f64 = 60.0;

/// Health at or below which the boss enters phase 2.
pub const BOSS_PHASE2_HEALTH: i32 = 500;

// --- Bullet ---

pub const BULLET_WIDTH: f64 = 8.0;
pub const BULLET_HEIGHT: f64 = 8.0;
pub const BULLET_HEALTH: i32 = 1;

// --- Collision damage ---

/// Damage a collision deals to the struck entity, per victim kind.
pub const PLAYER_COLLISION_DAMAGE: i32 = 10;
pub const ENEMY_COLLISION_DAMAGE: i32 = 10;
pub const BOSS_COLLISION_DAMAGE: i32 = 10;

// --- Scoring ---

/// Score awarded per enemy destroyed.
pub const ENEMY_SCORE: i64 = 100;

/// Score awarded for defeating the boss.
pub const BOSS_SCORE: i64 = 1000;

/// Bonus score rolled on a kill with `power_up_spawn_chance` probability.
pub const POWER_UP_SCORE: i64 = 50;

// --- Progression ---

/// Difficulty gained per level advanced.
pub const DIFFICULTY_STEP: f64 = 0.1;

/// Chance that a spawn wave is a formation rather than a lone enemy.
pub const FORMATION_SPAWN_CHANCE: f64 = 0.25;

// --- Formations ---

/// Member spacing within a formation (pixels).
pub const FORMATION_SPACING: f64 = 48.0;

/// Downward drift speed of a formation anchor (pixels/s).
pub const FORMATION_DRIFT_SPEED: f64 = 30.0;

/// Enemies per spawned formation.
pub const FORMATION_SIZE: usize = 5;

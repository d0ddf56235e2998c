//! Spawn director.
//!
//! The only randomness source in the engine: a seeded `ChaCha8Rng` drives
//! spawn positions, formation kinds and bonus rolls, so a fixed seed gives
//! a fixed spawn sequence. The director turns shot events into bullets,
//! counts kills toward the boss, and feeds score and level progression.

use std::sync::{Arc, Mutex};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use strafe_core::config::GameConfig;
use strafe_core::constants::{
    BOSS_HEIGHT, BOSS_SCORE, BOSS_SPEED, BOSS_WIDTH, ENEMY_HEIGHT, ENEMY_SCORE, ENEMY_WIDTH,
    FIXED_DT, FORMATION_SIZE, FORMATION_SPACING, FORMATION_SPAWN_CHANCE, POWER_UP_SCORE,
};
use strafe_core::entity::EntityHandle;
use strafe_core::enums::{FormationKind, GameState};
use strafe_core::error::EngineError;
use strafe_core::events::{EntityInfo, EventPayload, EventType};
use strafe_core::types::Vec2;

use crate::bus::{EventBus, Subscription};
use crate::entity::{pattern_for, Boss, Bullet, Enemy, Formation};
use crate::shutdown::ShutdownSignal;
use crate::state::StateManager;
use crate::subsystem::{check_cancelled, drain, Subsystem};

struct DirectorState {
    rng: ChaCha8Rng,
    spawn_timer: f64,
    kills: u32,
    boss_active: bool,
}

struct DirectorInner {
    bus: EventBus,
    config: GameConfig,
    states: StateManager,
    state: Mutex<DirectorState>,
    subscriptions: Mutex<Vec<Subscription>>,
    signal: Mutex<Option<ShutdownSignal>>,
}

#[derive(Clone)]
pub struct SpawnDirector {
    inner: Arc<DirectorInner>,
}

impl SpawnDirector {
    pub fn new(bus: EventBus, config: GameConfig, states: StateManager) -> Self {
        let rng = ChaCha8Rng::seed_from_u64(config.seed);
        Self {
            inner: Arc::new(DirectorInner {
                bus,
                config,
                states,
                state: Mutex::new(DirectorState {
                    rng,
                    spawn_timer: 0.0,
                    kills: 0,
                    boss_active: false,
                }),
                subscriptions: Mutex::new(Vec::new()),
                signal: Mutex::new(None),
            }),
        }
    }

    pub fn kills(&self) -> u32 {
        self.inner
            .state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .kills
    }

    fn publish_bullet(&self, shooter: &EntityInfo, is_enemy: bool) {
        let origin = Vec2::new(
            shooter.position.x,
            if is_enemy {
                shooter.position.y + ENEMY_HEIGHT
            } else {
                shooter.position.y - 1.0
            },
        );
        let bullet = Bullet::new(
            origin,
            is_enemy,
            self.inner.config.bullet_speed,
            (
                f64::from(self.inner.config.screen_width),
                f64::from(self.inner.config.screen_height),
            ),
            self.inner.bus.clone(),
        );
        let handle: EntityHandle = Arc::new(Mutex::new(bullet));
        let _ = self
            .inner
            .bus
            .publish(EventType::BulletCreated, EventPayload::Entity(handle));
    }

    fn spawn_enemy(&self, position: Vec2) {
        let enemy = Enemy::new(position, self.inner.config.enemy_speed, self.inner.bus.clone());
        let handle: EntityHandle = Arc::new(Mutex::new(enemy));
        let _ = self
            .inner
            .bus
            .publish(EventType::EnemyCreated, EventPayload::Entity(handle));
    }

    fn spawn_formation(&self, state: &mut DirectorState) {
        let kind = match state.rng.gen_range(0..4) {
            0 => FormationKind::Line,
            1 => FormationKind::Column,
            2 => FormationKind::V,
            _ => FormationKind::Circle,
        };
        let span = FORMATION_SPACING * FORMATION_SIZE as f64;
        let max_x = (f64::from(self.inner.config.screen_width) - span).max(0.0);
        let anchor = Vec2::new(state.rng.gen_range(0.0..=max_x), -ENEMY_HEIGHT);

        let mut formation =
            Formation::new(kind, pattern_for(kind), anchor, self.inner.bus.clone());
        for slot in 0..FORMATION_SIZE {
            let position = anchor + Vec2::new(FORMATION_SPACING * slot as f64, 0.0);
            let enemy =
                Enemy::new(position, self.inner.config.enemy_speed, self.inner.bus.clone());
            let handle: EntityHandle = Arc::new(Mutex::new(enemy));
            formation.add_member(handle.clone());
            let _ = self
                .inner
                .bus
                .publish(EventType::EnemyCreated, EventPayload::Entity(handle));
        }
        let handle: EntityHandle = Arc::new(Mutex::new(formation));
        let _ = self
            .inner
            .bus
            .publish(EventType::FormationCreated, EventPayload::Entity(handle));
    }

    fn spawn_wave(&self, state: &mut DirectorState) {
        if state.rng.gen_bool(FORMATION_SPAWN_CHANCE) {
            self.spawn_formation(state);
        } else {
            let max_x = f64::from(self.inner.config.screen_width) - ENEMY_WIDTH;
            let position = Vec2::new(state.rng.gen_range(0.0..=max_x), -ENEMY_HEIGHT);
            self.spawn_enemy(position);
        }
    }

    fn spawn_boss(&self, state: &mut DirectorState) {
        state.boss_active = true;
        state.kills = 0;
        let position = Vec2::new(
            (f64::from(self.inner.config.screen_width) - BOSS_WIDTH) / 2.0,
            -BOSS_HEIGHT,
        );
        let boss = Boss::new(position, BOSS_SPEED, self.inner.bus.clone());
        let handle: EntityHandle = Arc::new(Mutex::new(boss));
        let _ = self
            .inner
            .bus
            .publish(EventType::EnemyCreated, EventPayload::Entity(handle));
    }

    fn on_enemy_destroyed(&self, state: &mut DirectorState) {
        state.kills += 1;
        let _ = self
            .inner
            .bus
            .publish(EventType::ScoreEvent, EventPayload::ScoreDelta(ENEMY_SCORE));
        if state
            .rng
            .gen_bool(self.inner.config.power_up_spawn_chance.clamp(0.0, 1.0))
        {
            let _ = self.inner.bus.publish(
                EventType::ScoreEvent,
                EventPayload::ScoreDelta(POWER_UP_SCORE),
            );
        }
        if !state.boss_active && state.kills >= self.inner.config.boss_threshold {
            self.spawn_boss(state);
        }
    }

    fn on_boss_defeated(&self, state: &mut DirectorState) {
        state.boss_active = false;
        let _ = self
            .inner
            .bus
            .publish(EventType::ScoreEvent, EventPayload::ScoreDelta(BOSS_SCORE));
        let _ = self
            .inner
            .bus
            .publish(EventType::LevelEvent, EventPayload::LevelDelta(1));
    }

    fn handle_events(&self, state: &mut DirectorState) {
        let subs = self
            .inner
            .subscriptions
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        for sub in subs.iter() {
            for event in drain(sub) {
                match (event.event_type, event.payload) {
                    (EventType::PlayerShot, EventPayload::Info(info)) => {
                        self.publish_bullet(&info, false);
                    }
                    (EventType::EnemyShot | EventType::BossShot, EventPayload::Info(info)) => {
                        self.publish_bullet(&info, true);
                    }
                    (EventType::EnemyDestroyed, EventPayload::Info(_)) => {
                        self.on_enemy_destroyed(state);
                    }
                    (EventType::BossDefeated, EventPayload::Info(_)) => {
                        self.on_boss_defeated(state);
                    }
                    _ => {}
                }
            }
        }
    }
}

impl Subsystem for SpawnDirector {
    fn name(&self) -> &'static str {
        "director"
    }

    fn initialize(&mut self, signal: ShutdownSignal) -> Result<(), EngineError> {
        let mut subs = self
            .inner
            .subscriptions
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        for event_type in [
            EventType::PlayerShot,
            EventType::EnemyShot,
            EventType::BossShot,
            EventType::EnemyDestroyed,
            EventType::BossDefeated,
        ] {
            subs.push(self.inner.bus.subscribe(event_type).map_err(|e| {
                EngineError::Init {
                    subsystem: "director",
                    reason: e.to_string(),
                }
            })?);
        }
        *self.inner.signal.lock().unwrap_or_else(|e| e.into_inner()) = Some(signal);
        Ok(())
    }

    fn update(&mut self, dt: f64) -> Result<(), EngineError> {
        check_cancelled(&self.inner.signal.lock().unwrap_or_else(|e| e.into_inner()))?;
        if self.inner.states.state() != GameState::Playing {
            return Ok(());
        }
        let mut state = self.inner.state.lock().unwrap_or_else(|e| e.into_inner());
        self.handle_events(&mut state);

        // A zero or negative interval would never drain the timer; one
        // spawn per tick is the floor.
        let interval = self.inner.config.enemy_spawn_interval.max(FIXED_DT);
        state.spawn_timer += dt.max(0.0);
        while state.spawn_timer >= interval {
            state.spawn_timer -= interval;
            self.spawn_wave(&mut state);
        }
        Ok(())
    }

    fn shutdown(&mut self) {
        let mut subs = self
            .inner
            .subscriptions
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        for sub in subs.drain(..) {
            self.inner.bus.unsubscribe(&sub);
        }
    }
}

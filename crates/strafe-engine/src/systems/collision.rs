//! Collision subsystem.
//!
//! Maintains the collidable set from lifecycle events and, on its own
//! fixed-step cadence, tests all unordered pairs against the kind
//! eligibility table plus AABB overlap.

use std::sync::{Arc, Mutex};

use strafe_core::constants::{FIXED_DT, TICK_TOLERANCE};
use strafe_core::entity::EntityHandle;
use strafe_core::enums::EntityKind;
use strafe_core::error::EngineError;
use strafe_core::events::{EventPayload, EventType};
use strafe_core::types::Aabb;

use crate::bus::{EventBus, Subscription};
use crate::manager::remove_first;
use crate::shutdown::ShutdownSignal;
use crate::subsystem::{check_cancelled, drain, Subsystem};

struct CollisionInner {
    bus: EventBus,
    collidables: Mutex<Vec<EntityHandle>>,
    subscriptions: Mutex<Vec<Subscription>>,
    accumulator: Mutex<f64>,
    signal: Mutex<Option<ShutdownSignal>>,
}

#[derive(Clone)]
pub struct CollisionSystem {
    inner: Arc<CollisionInner>,
}

struct PairSnapshot {
    handle: EntityHandle,
    kind: EntityKind,
    hit_box: Aabb,
    alive: bool,
}

impl CollisionSystem {
    pub fn new(bus: EventBus) -> Self {
        Self {
            inner: Arc::new(CollisionInner {
                bus,
                collidables: Mutex::new(Vec::new()),
                subscriptions: Mutex::new(Vec::new()),
                accumulator: Mutex::new(0.0),
                signal: Mutex::new(None),
            }),
        }
    }

    /// Register an entity that has no `*Created` event (the player).
    pub fn add_collidable(&self, handle: EntityHandle) {
        self.inner
            .collidables
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(handle);
    }

    pub fn collidable_count(&self) -> usize {
        self.inner
            .collidables
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    fn handle_events(&self) {
        let subs = self
            .inner
            .subscriptions
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        for sub in subs.iter() {
            for event in drain(sub) {
                match (event.event_type, event.payload) {
                    (
                        EventType::BulletCreated | EventType::EnemyCreated,
                        EventPayload::Entity(handle),
                    ) => {
                        self.add_collidable(handle);
                    }
                    (
                        EventType::BulletDestroyed
                        | EventType::EnemyDestroyed
                        | EventType::BossDefeated
                        | EventType::PlayerDestroyed,
                        EventPayload::Info(info),
                    ) => {
                        let mut collidables = self
                            .inner
                            .collidables
                            .lock()
                            .unwrap_or_else(|e| e.into_inner());
                        remove_first(&mut collidables, info.id);
                    }
                    _ => {}
                }
            }
        }
    }

    /// One full pairwise pass. Boxes and kinds are snapshotted up front so
    /// no entity lock is held across a callback into another entity.
    pub fn check_collisions(&self) {
        let snapshots: Vec<PairSnapshot> = {
            let collidables = self
                .inner
                .collidables
                .lock()
                .unwrap_or_else(|e| e.into_inner());
            collidables
                .iter()
                .map(|handle| {
                    let guard = handle.lock().unwrap_or_else(|e| e.into_inner());
                    PairSnapshot {
                        handle: handle.clone(),
                        kind: guard.kind(),
                        hit_box: guard.collision_box(),
                        alive: guard.is_alive(),
                    }
                })
                .collect()
        };

        for i in 0..snapshots.len() {
            for j in (i + 1)..snapshots.len() {
                let (a, b) = (&snapshots[i], &snapshots[j]);
                if !a.alive || !b.alive {
                    continue;
                }
                if !a.kind.can_collide_with(b.kind) {
                    continue;
                }
                if !a.hit_box.intersects(&b.hit_box) {
                    continue;
                }
                a.handle
                    .lock()
                    .unwrap_or_else(|e| e.into_inner())
                    .on_collision();
                b.handle
                    .lock()
                    .unwrap_or_else(|e| e.into_inner())
                    .on_collision();
            }
        }
    }
}

impl Subsystem for CollisionSystem {
    fn name(&self) -> &'static str {
        "collision"
    }

    fn initialize(&mut self, signal: ShutdownSignal) -> Result<(), EngineError> {
        let mut subs = self
            .inner
            .subscriptions
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        for event_type in [
            EventType::BulletCreated,
            EventType::BulletDestroyed,
            EventType::EnemyCreated,
            EventType::EnemyDestroyed,
            EventType::BossDefeated,
            EventType::PlayerDestroyed,
        ] {
            subs.push(self.inner.bus.subscribe(event_type).map_err(|e| {
                EngineError::Init {
                    subsystem: "collision",
                    reason: e.to_string(),
                }
            })?);
        }
        *self.inner.signal.lock().unwrap_or_else(|e| e.into_inner()) = Some(signal);
        Ok(())
    }

    fn update(&mut self, dt: f64) -> Result<(), EngineError> {
        check_cancelled(&self.inner.signal.lock().unwrap_or_else(|e| e.into_inner()))?;
        self.handle_events();

        let mut accumulator = self
            .inner
            .accumulator
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        *accumulator += dt.max(0.0);
        while *accumulator >= FIXED_DT - TICK_TOLERANCE {
            *accumulator -= FIXED_DT;
            self.check_collisions();
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
        self.inner
            .collidables
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }
}

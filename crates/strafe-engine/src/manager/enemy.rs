//! Enemy manager: owns every live enemy (including the boss) and every
//! formation.

use std::sync::{Arc, Mutex, RwLock};

use strafe_core::entity::EntityHandle;
use strafe_core::error::EngineError;
use strafe_core::events::{EventPayload, EventType};

use crate::bus::{EventBus, Subscription};
use crate::shutdown::ShutdownSignal;
use crate::subsystem::{check_cancelled, drain, Subsystem};
use crate::systems::render::{Canvas, Drawable};

struct EnemyInner {
    bus: EventBus,
    enemies: RwLock<Vec<EntityHandle>>,
    formations: RwLock<Vec<EntityHandle>>,
    subscriptions: Mutex<Vec<Subscription>>,
    signal: Mutex<Option<ShutdownSignal>>,
}

#[derive(Clone)]
pub struct EnemyManager {
    inner: Arc<EnemyInner>,
}

impl EnemyManager {
    pub fn new(bus: EventBus) -> Self {
        Self {
            inner: Arc::new(EnemyInner {
                bus,
                enemies: RwLock::new(Vec::new()),
                formations: RwLock::new(Vec::new()),
                subscriptions: Mutex::new(Vec::new()),
                signal: Mutex::new(None),
            }),
        }
    }

    pub fn enemy_count(&self) -> usize {
        self.inner
            .enemies
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    pub fn formation_count(&self) -> usize {
        self.inner
            .formations
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    pub fn add_enemy(&self, enemy: EntityHandle) {
        self.inner
            .enemies
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(enemy);
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
                    (EventType::EnemyCreated, EventPayload::Entity(handle)) => {
                        self.add_enemy(handle);
                    }
                    (EventType::EnemyDestroyed, EventPayload::Info(info)) => {
                        let mut enemies = self
                            .inner
                            .enemies
                            .write()
                            .unwrap_or_else(|e| e.into_inner());
                        super::remove_first(&mut enemies, info.id);
                    }
                    (EventType::FormationCreated, EventPayload::Entity(handle)) => {
                        self.inner
                            .formations
                            .write()
                            .unwrap_or_else(|e| e.into_inner())
                            .push(handle);
                    }
                    (EventType::FormationDestroyed, EventPayload::Info(info)) => {
                        let mut formations = self
                            .inner
                            .formations
                            .write()
                            .unwrap_or_else(|e| e.into_inner());
                        super::remove_first(&mut formations, info.id);
                    }
                    _ => {}
                }
            }
        }
    }

    fn update_entities(&self, dt: f64) -> Result<(), EngineError> {
        // Step every enemy, then drop the ones the tick killed.
        let mut enemies = self
            .inner
            .enemies
            .write()
            .unwrap_or_else(|e| e.into_inner());
        for enemy in enemies.iter() {
            enemy.lock().unwrap_or_else(|e| e.into_inner()).update(dt)?;
        }
        enemies.retain(|enemy| enemy.lock().unwrap_or_else(|e| e.into_inner()).is_alive());
        drop(enemies);

        let formations = self
            .inner
            .formations
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        for formation in formations {
            formation
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .update(dt)?;
        }
        Ok(())
    }
}

impl Subsystem for EnemyManager {
    fn name(&self) -> &'static str {
        "enemy-manager"
    }

    fn initialize(&mut self, signal: ShutdownSignal) -> Result<(), EngineError> {
        let mut subs = self
            .inner
            .subscriptions
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        for event_type in [
            EventType::EnemyCreated,
            EventType::EnemyDestroyed,
            EventType::FormationCreated,
            EventType::FormationDestroyed,
        ] {
            subs.push(self.inner.bus.subscribe(event_type).map_err(|e| {
                EngineError::Init {
                    subsystem: "enemy-manager",
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
        self.update_entities(dt)
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
            .enemies
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
        self.inner
            .formations
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }
}

impl Drawable for EnemyManager {
    fn draw(&self, canvas: &mut dyn Canvas) {
        let enemies = self
            .inner
            .enemies
            .read()
            .unwrap_or_else(|e| e.into_inner());
        for enemy in enemies.iter() {
            let guard = enemy.lock().unwrap_or_else(|e| e.into_inner());
            if guard.is_alive() {
                canvas.fill_rect(guard.collision_box(), guard.color());
            }
        }
    }
}

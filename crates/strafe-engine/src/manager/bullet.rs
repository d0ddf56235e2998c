//! Bullet manager: owns every live bullet.

use std::sync::{Arc, Mutex, RwLock};

use strafe_core::entity::EntityHandle;
use strafe_core::error::EngineError;
use strafe_core::events::{EventPayload, EventType};
use strafe_core::types::{Aabb, Color};

use crate::bus::{EventBus, Subscription};
use crate::shutdown::ShutdownSignal;
use crate::subsystem::{check_cancelled, drain, Subsystem};
use crate::systems::render::{Canvas, Drawable};

struct BulletInner {
    bus: EventBus,
    bullets: RwLock<Vec<EntityHandle>>,
    subscriptions: Mutex<Vec<Subscription>>,
    signal: Mutex<Option<ShutdownSignal>>,
}

#[derive(Clone)]
pub struct BulletManager {
    inner: Arc<BulletInner>,
}

impl BulletManager {
    pub fn new(bus: EventBus) -> Self {
        Self {
            inner: Arc::new(BulletInner {
                bus,
                bullets: RwLock::new(Vec::new()),
                subscriptions: Mutex::new(Vec::new()),
                signal: Mutex::new(None),
            }),
        }
    }

    pub fn bullet_count(&self) -> usize {
        self.inner
            .bullets
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    pub fn add_bullet(&self, bullet: EntityHandle) {
        self.inner
            .bullets
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(bullet);
    }

    fn handle_events(&self) {
        let subs = self
            .inner
            .subscriptions
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        let mut bullets = self
            .inner
            .bullets
            .write()
            .unwrap_or_else(|e| e.into_inner());
        for sub in subs.iter() {
            for event in drain(sub) {
                match (event.event_type, event.payload) {
                    (EventType::BulletCreated, EventPayload::Entity(handle)) => {
                        bullets.push(handle);
                    }
                    (EventType::BulletDestroyed, EventPayload::Info(info)) => {
                        super::remove_first(&mut bullets, info.id);
                    }
                    _ => {}
                }
            }
        }
    }
}

impl Subsystem for BulletManager {
    fn name(&self) -> &'static str {
        "bullet-manager"
    }

    fn initialize(&mut self, signal: ShutdownSignal) -> Result<(), EngineError> {
        let mut subs = self
            .inner
            .subscriptions
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        for event_type in [EventType::BulletCreated, EventType::BulletDestroyed] {
            subs.push(self.inner.bus.subscribe(event_type).map_err(|e| {
                EngineError::Init {
                    subsystem: "bullet-manager",
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
        // Bullets self-publish their destruction; no liveness filter here.
        let bullets = self
            .inner
            .bullets
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        for bullet in bullets {
            bullet
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .update(dt)?;
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
            .bullets
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }
}

impl Drawable for BulletManager {
    fn draw(&self, canvas: &mut dyn Canvas) {
        let bullets = self
            .inner
            .bullets
            .read()
            .unwrap_or_else(|e| e.into_inner());
        for bullet in bullets.iter() {
            let guard = bullet.lock().unwrap_or_else(|e| e.into_inner());
            if guard.is_alive() {
                let rect: Aabb = guard.collision_box();
                let color: Color = guard.color();
                canvas.fill_rect(rect, color);
            }
        }
    }
}

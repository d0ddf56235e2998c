//! Render subsystem.
//!
//! The engine draws onto an abstract [`Canvas`]; the binary decides what a
//! canvas actually is (terminal, window, test buffer). Registration is
//! one-way: drawables are added at setup and live for the session.

use std::sync::{Arc, Mutex, RwLock};

use strafe_core::error::EngineError;
use strafe_core::types::{Aabb, Color};

use crate::shutdown::ShutdownSignal;
use crate::subsystem::{check_cancelled, Subsystem};

/// Drawing surface abstraction.
pub trait Canvas {
    fn fill_rect(&mut self, rect: Aabb, color: Color);
}

/// Anything the render pass can draw.
pub trait Drawable: Send + Sync {
    fn draw(&self, canvas: &mut dyn Canvas);
}

impl Drawable for strafe_core::entity::EntityHandle {
    fn draw(&self, canvas: &mut dyn Canvas) {
        let guard = self.lock().unwrap_or_else(|e| e.into_inner());
        if guard.is_alive() {
            canvas.fill_rect(guard.collision_box(), guard.color());
        }
    }
}

struct RenderInner {
    drawables: RwLock<Vec<Box<dyn Drawable>>>,
    signal: Mutex<Option<ShutdownSignal>>,
}

#[derive(Clone)]
pub struct RenderSystem {
    inner: Arc<RenderInner>,
}

impl Default for RenderSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderSystem {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RenderInner {
                drawables: RwLock::new(Vec::new()),
                signal: Mutex::new(None),
            }),
        }
    }

    pub fn register(&self, drawable: Box<dyn Drawable>) {
        self.inner
            .drawables
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(drawable);
    }

    /// Draw every registered drawable, in registration order.
    pub fn render(&self, canvas: &mut dyn Canvas) {
        let drawables = self
            .inner
            .drawables
            .read()
            .unwrap_or_else(|e| e.into_inner());
        for drawable in drawables.iter() {
            drawable.draw(canvas);
        }
    }
}

impl Subsystem for RenderSystem {
    fn name(&self) -> &'static str {
        "render"
    }

    fn initialize(&mut self, signal: ShutdownSignal) -> Result<(), EngineError> {
        *self.inner.signal.lock().unwrap_or_else(|e| e.into_inner()) = Some(signal);
        Ok(())
    }

    // Rendering happens from the frame loop, not the fixed tick; the tick
    // worker only keeps the cancellation contract.
    fn update(&mut self, _dt: f64) -> Result<(), EngineError> {
        check_cancelled(&self.inner.signal.lock().unwrap_or_else(|e| e.into_inner()))
    }

    fn shutdown(&mut self) {
        self.inner
            .drawables
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }
}

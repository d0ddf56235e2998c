//! The simulation driver.
//!
//! Owns the bus, every subsystem and the fixed-timestep accumulator. Wall
//! clock time arrives as raw frame deltas; the driver clamps them, converts
//! them into zero-or-more ticks of exactly [`FIXED_DT`], and broadcasts each
//! tick to one worker thread per subsystem. The first non-cancellation error
//! from any worker cancels the root.

use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use crossbeam_channel::{bounded, select, Receiver, Sender};
use log::{error, info, warn};

use strafe_core::config::GameConfig;
use strafe_core::constants::{FIXED_DT, MAX_FRAME_DT, TICK_TOLERANCE};
use strafe_core::entity::EntityHandle;
use strafe_core::enums::GameState;
use strafe_core::error::EngineError;
use strafe_core::types::Vec2;

use crate::bus::{EventBus, EventBusSystem};
use crate::entity::Player;
use crate::manager::{BulletManager, EnemyManager, LevelManager, ScoreManager};
use crate::shutdown::{shutdown_channel, ShutdownController, ShutdownSignal};
use crate::snapshot::GameSnapshot;
use crate::state::StateManager;
use crate::subsystem::Subsystem;
use crate::systems::{
    Canvas, CollisionSystem, InputSystem, KeySource, PlayerController, RenderSystem, SpawnDirector,
};

struct Worker {
    name: &'static str,
    tick_tx: Sender<f64>,
    handle: JoinHandle<()>,
}

pub struct Game {
    bus: EventBus,
    controller: ShutdownController,
    signal: ShutdownSignal,

    states: StateManager,
    bullets: BulletManager,
    enemies: EnemyManager,
    scores: ScoreManager,
    levels: LevelManager,
    renderer: RenderSystem,
    player: Arc<Mutex<Player>>,

    // Initialized subsystems, waiting for `start` to hand each to a worker.
    pending: Vec<Box<dyn Subsystem>>,
    workers: Vec<Worker>,

    err_tx: Sender<EngineError>,
    err_rx: Receiver<EngineError>,

    accumulator: f64,
    last_frame: Option<Instant>,
    finished: bool,
}

impl Game {
    /// Build and initialize the full subsystem stack. Nothing ticks until
    /// [`Game::start`].
    pub fn new(config: GameConfig, key_source: Box<dyn KeySource>) -> Result<Self, EngineError> {
        let bus = EventBus::new();
        let (controller, signal) = shutdown_channel();
        let (err_tx, err_rx) = bounded(1);

        let states = StateManager::new(bus.clone(), config.max_state_queue_size);
        let bullets = BulletManager::new(bus.clone());
        let enemies = EnemyManager::new(bus.clone());
        let scores = ScoreManager::new(bus.clone());
        let levels = LevelManager::new(bus.clone());
        let collision = CollisionSystem::new(bus.clone());
        let renderer = RenderSystem::new();
        let input = InputSystem::new(bus.clone(), key_source);
        let director = SpawnDirector::new(bus.clone(), config.clone(), states.clone());

        let player = Arc::new(Mutex::new(Player::new(
            Vec2::new(
                f64::from(config.screen_width) / 2.0,
                f64::from(config.screen_height) * 0.8,
            ),
            config.player_speed,
            bus.clone(),
        )));
        let player_controller = PlayerController::new(
            bus.clone(),
            config.clone(),
            states.clone(),
            Arc::clone(&player),
        );

        // The player has no Created event; register it by hand.
        collision.add_collidable(Arc::clone(&player) as EntityHandle);
        renderer.register(Box::new(Arc::clone(&player) as EntityHandle));
        renderer.register(Box::new(enemies.clone()));
        renderer.register(Box::new(bullets.clone()));

        // Bus first so every later subscription has a live pump behind it.
        let mut pending: Vec<Box<dyn Subsystem>> = vec![
            Box::new(EventBusSystem::new(bus.clone())),
            Box::new(states.clone()),
            Box::new(renderer.clone()),
            Box::new(collision),
            Box::new(input),
            Box::new(enemies.clone()),
            Box::new(bullets.clone()),
            Box::new(scores.clone()),
            Box::new(levels.clone()),
            Box::new(director),
            Box::new(player_controller),
        ];
        for subsystem in pending.iter_mut() {
            subsystem.initialize(signal.clone())?;
            info!("initialized {}", subsystem.name());
        }

        Ok(Self {
            bus,
            controller,
            signal,
            states,
            bullets,
            enemies,
            scores,
            levels,
            renderer,
            player,
            pending,
            workers: Vec::new(),
            err_tx,
            err_rx,
            accumulator: 0.0,
            last_frame: None,
            finished: false,
        })
    }

    /// Spawn one worker per subsystem. Each worker parks on its private
    /// tick channel, runs `update`, and reports the first fatal error.
    pub fn start(&mut self) -> Result<(), EngineError> {
        for mut subsystem in self.pending.drain(..) {
            let name = subsystem.name();
            let (tick_tx, tick_rx) = bounded::<f64>(1);
            let signal = self.signal.clone();
            let err_tx = self.err_tx.clone();
            let controller = self.controller.clone();

            let handle = thread::Builder::new()
                .name(format!("strafe-{name}"))
                .spawn(move || {
                    loop {
                        let dt = select! {
                            recv(signal.done()) -> _ => break,
                            recv(tick_rx) -> msg => match msg {
                                Ok(dt) => dt,
                                Err(_) => break,
                            },
                        };
                        if let Err(e) = subsystem.update(dt) {
                            if e.is_cancelled() {
                                break;
                            }
                            error!("{name}: {e}");
                            if err_tx.try_send(e).is_err() {
                                warn!("{name}: error channel full, error dropped");
                            }
                            controller.cancel();
                            break;
                        }
                    }
                    subsystem.shutdown();
                })
                .map_err(|e| EngineError::Init {
                    subsystem: name,
                    reason: format!("failed to spawn worker: {e}"),
                })?;
            self.workers.push(Worker {
                name,
                tick_tx,
                handle,
            });
        }
        info!("started {} workers", self.workers.len());
        Ok(())
    }

    /// Feed one raw frame delta to the accumulator and broadcast the
    /// resulting fixed ticks. Returns how many ticks were emitted.
    pub fn advance(&mut self, raw_dt: f64) -> Result<u32, EngineError> {
        if let Ok(e) = self.err_rx.try_recv() {
            return Err(e);
        }
        self.signal.check()?;

        self.accumulator += raw_dt.max(0.0).min(MAX_FRAME_DT);
        let mut ticks = 0;
        while self.accumulator >= FIXED_DT - TICK_TOLERANCE {
            self.accumulator -= FIXED_DT;
            self.broadcast(FIXED_DT)?;
            ticks += 1;
        }
        Ok(ticks)
    }

    /// Wall-clock frame entry point: measures the delta since the previous
    /// call and advances.
    pub fn frame(&mut self) -> Result<u32, EngineError> {
        let now = Instant::now();
        let raw_dt = match self.last_frame.replace(now) {
            Some(prev) => now.duration_since(prev).as_secs_f64(),
            None => 0.0,
        };
        self.advance(raw_dt)
    }

    fn broadcast(&self, dt: f64) -> Result<(), EngineError> {
        for worker in &self.workers {
            select! {
                send(worker.tick_tx, dt) -> sent => {
                    if sent.is_err() {
                        warn!("{}: tick channel closed", worker.name);
                        return Err(EngineError::Cancelled);
                    }
                }
                recv(self.signal.done()) -> _ => return Err(EngineError::Cancelled),
            }
        }
        Ok(())
    }

    /// Draw the world once. Independent of the simulation tick rate.
    pub fn render(&self, canvas: &mut dyn Canvas) {
        self.renderer.render(canvas);
    }

    /// Cancel, join every worker, close the bus. Idempotent.
    pub fn shutdown(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;
        info!("shutting down");
        self.controller.cancel();
        for worker in self.workers.drain(..) {
            if worker.handle.join().is_err() {
                warn!("{}: worker panicked during shutdown", worker.name);
            }
        }
        // Subsystems that never reached a worker still need their teardown.
        for mut subsystem in self.pending.drain(..) {
            subsystem.shutdown();
        }
        self.bus.shutdown();
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn state(&self) -> GameState {
        self.states.state()
    }

    pub fn request_state_change(&self, state: GameState) {
        self.states.request_state_change(state);
    }

    pub fn score(&self) -> i64 {
        self.scores.score()
    }

    pub fn player(&self) -> Arc<Mutex<Player>> {
        Arc::clone(&self.player)
    }

    pub fn is_finished(&self) -> bool {
        self.finished || self.controller.is_cancelled()
    }

    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            state: self.states.state(),
            score: self.scores.score(),
            high_score: self.scores.high_score(),
            level: self.levels.level(),
            difficulty: self.levels.difficulty(),
            bullets: self.bullets.bullet_count(),
            enemies: self.enemies.enemy_count(),
            formations: self.enemies.formation_count(),
        }
    }
}

impl Drop for Game {
    fn drop(&mut self) {
        self.shutdown();
    }
}

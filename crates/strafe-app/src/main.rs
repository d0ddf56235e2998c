//! Headless runner: config from the environment, frame loop at roughly
//! display rate, SIGINT/SIGTERM mapped to a clean shutdown.

use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use log::{error, info};

use strafe_core::config::GameConfig;
use strafe_core::error::EngineError;
use strafe_engine::game::Game;
use strafe_engine::systems::{Canvas, NullKeySource};

const FRAME_INTERVAL: Duration = Duration::from_millis(16);
const SNAPSHOT_INTERVAL: Duration = Duration::from_secs(5);

/// Headless drawing surface: the world is simulated, nothing is displayed.
struct NullCanvas;

impl Canvas for NullCanvas {
    fn fill_rect(&mut self, _rect: strafe_core::types::Aabb, _color: strafe_core::types::Color) {}
}

fn run() -> Result<(), EngineError> {
    let config = GameConfig::from_env();
    info!("config: {}", serde_json::to_string(&config).unwrap_or_default());

    let mut game = Game::new(config, Box::new(NullKeySource))?;
    game.start()?;

    let interrupted = Arc::new(AtomicBool::new(false));
    {
        let interrupted = Arc::clone(&interrupted);
        ctrlc::set_handler(move || {
            interrupted.store(true, Ordering::SeqCst);
        })
        .map_err(|e| EngineError::Init {
            subsystem: "signals",
            reason: e.to_string(),
        })?;
    }

    let mut canvas = NullCanvas;
    let mut last_snapshot = Instant::now();
    let result = loop {
        if interrupted.load(Ordering::SeqCst) {
            info!("interrupt received");
            break Ok(());
        }
        let frame_start = Instant::now();
        match game.frame() {
            Ok(_ticks) => {}
            Err(e) => break Err(e),
        }
        game.render(&mut canvas);

        if last_snapshot.elapsed() >= SNAPSHOT_INTERVAL {
            last_snapshot = Instant::now();
            if let Ok(json) = serde_json::to_string(&game.snapshot()) {
                info!("snapshot: {json}");
            }
        }

        if let Some(remaining) = FRAME_INTERVAL.checked_sub(frame_start.elapsed()) {
            thread::sleep(remaining);
        }
    };
    game.shutdown();
    result
}

fn main() -> ExitCode {
    env_logger::init();
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        // Cancellation is the normal way out.
        Err(e) if e.is_cancelled() => ExitCode::SUCCESS,
        Err(e) => {
            error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

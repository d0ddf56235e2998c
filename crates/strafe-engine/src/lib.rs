//! STRAFE runtime engine.
//!
//! Everything here is headless and deterministic given a seed and a fixed
//! sequence of frame deltas: the event bus, the subsystem protocol, the
//! fixed-timestep driver, the entities and the manager subsystems. The app
//! crate supplies the display loop, key source and signal handling.

pub mod bus;
pub mod entity;
pub mod game;
pub mod manager;
pub mod shutdown;
pub mod snapshot;
pub mod state;
pub mod subsystem;
pub mod systems;

#[cfg(test)]
mod tests;

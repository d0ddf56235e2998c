//! Core subsystems: collision, input, rendering, spawn direction and the
//! player controller.

pub mod collision;
pub mod controller;
pub mod director;
pub mod input;
pub mod render;

pub use collision::CollisionSystem;
pub use controller::PlayerController;
pub use director::SpawnDirector;
pub use input::{InputSystem, KeySource, NullKeySource};
pub use render::{Canvas, Drawable, RenderSystem};

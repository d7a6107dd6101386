//! Entity Component System module
//!
//! Built on top of the hecs ECS library

mod body;
mod components;
mod world;

pub use body::EntityBody;
pub use components::{Creature, Mover, Name, Transform2D};
pub use world::{World, movement_system};

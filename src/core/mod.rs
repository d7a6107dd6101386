//! Core engine module
//!
//! Contains the headless Engine, its configuration, the frame clock and the
//! event queue

mod engine;
mod events;
mod time;

pub use engine::{Engine, EngineConfig, EngineContext, Game};
pub use events::{EventQueue, GameEvent};
pub use time::Time;

//! Finite state machine AI for a small 2D creature game
//!
//! This crate provides:
//! - Data-driven state graphs with shared nodes and per-entity memory
//! - A code-driven, interval-polled state machine
//! - Entity Component System (ECS) components for creatures
//! - A headless frame loop with events

pub mod ai;
pub mod animation;
pub mod core;
pub mod ecs;

// Re-exports for convenience
pub use glam;
pub use hecs;
pub use rand;

/// Prelude module for common imports
pub mod prelude {
    pub use crate::ai::{
        Body, DecisionLogic, IdleState, MachineState, StateAction, StateController,
        StateGraphConfig, StateId, StateLibrary, StateMachine, StateNode, Transition,
        WanderAction, update_controllers,
    };
    pub use crate::animation::Curve;
    pub use crate::core::{Engine, EngineConfig, EngineContext, EventQueue, Game, GameEvent, Time};
    pub use crate::ecs::{Creature, Mover, Name, Transform2D, World, movement_system};
    pub use glam::{Vec2, Vec4};
}

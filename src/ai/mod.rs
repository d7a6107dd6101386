//! AI module
//!
//! Two finite state machine layers:
//! - a data-driven graph of [`StateNode`]s shared through a
//!   [`StateLibrary`] and run per entity by a [`StateController`]
//! - a code-driven [`StateMachine`] that polls owned states on an interval

mod action;
pub mod config;
mod controller;
mod decision;
mod idle;
mod library;
mod machine;
mod memory;
mod node;

pub use action::{
    DESTINATION_KEY, MOVEMENT_TIME_KEY, StateAction, WANDER_INIT_KEY, WanderAction,
};
pub use config::{ActionConfig, DecisionConfig, StateConfig, StateGraphConfig, TransitionConfig};
pub use controller::{Body, StateContext, StateController, update_controllers};
pub use decision::{
    DecisionLogic, RANDOM_WAIT_KEY, SwitchStateAfter, WANDER_COUNT_KEY, WaitForRandom,
    WanderingCounter,
};
pub use idle::{CreatureMode, IdleState};
pub use library::{LibraryError, StateLibrary};
pub use machine::{MachineConfig, MachineError, MachineState, StateMachine};
pub use memory::{Memory, MemoryError, MemoryType, MemoryValue};
pub use node::{StateId, StateNode, Transition};

//! Data-driven state controller
//!
//! A [`StateController`] is the per-entity runtime half of the data-driven
//! AI: it points at the active [`StateNode`](super::StateNode) in a shared
//! [`StateLibrary`], tracks how long it has been there, and owns the
//! entity's [`Memory`]. Nodes, actions and decisions are shared behavior;
//! everything per-entity lives here.

use glam::Vec2;
use hecs::Entity;
use rand::RngCore;

use super::library::StateLibrary;
use super::memory::{Memory, MemoryType, MemoryValue};
use super::node::StateId;
use crate::core::{GameEvent, Time};
use crate::ecs::{Creature, EntityBody, Transform2D, World};

/// Movement surface of the entity a controller drives.
///
/// All position and orientation reads and writes made by AI actions go
/// through this trait.
pub trait Body {
    /// Position in local (parent) space
    fn local_position(&self) -> Vec2;

    /// Move to a local-space position
    fn set_local_position(&mut self, position: Vec2);

    /// Movement speed factor
    fn speed(&self) -> f32;

    /// Turn to face the horizontal direction of `target`
    fn face_towards(&mut self, target: Vec2);
}

/// Everything a node, action or decision may touch during one tick
pub struct StateContext<'a> {
    /// The controller being updated
    pub controller: &'a mut StateController,
    /// The controlled entity
    pub body: &'a mut dyn Body,
    /// Frame clock
    pub time: &'a Time,
    /// Random source
    pub rng: &'a mut dyn RngCore,
}

/// Per-entity driver of a data-driven state graph
#[derive(Debug, Clone)]
pub struct StateController {
    entity: Entity,
    current: Option<StateId>,
    active: bool,
    time_in_state: f32,
    last_state_change_time: f32,
    memory: Memory,
    missing_body_reported: bool,
    missing_state_reported: bool,
}

impl StateController {
    /// Create an active controller bound to `entity`, starting in `initial`
    #[must_use]
    pub fn new(entity: Entity, initial: Option<StateId>) -> Self {
        Self {
            entity,
            current: initial,
            active: true,
            time_in_state: 0.0,
            last_state_change_time: 0.0,
            memory: Memory::new(),
            missing_body_reported: false,
            missing_state_reported: false,
        }
    }

    /// Entity this controller is bound to
    #[must_use]
    pub fn entity(&self) -> Entity {
        self.entity
    }

    /// Active node, `None` only before the first assignment
    #[must_use]
    pub fn current_state(&self) -> Option<StateId> {
        self.current
    }

    /// Whether ticks are currently processed
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Seconds spent in the active node
    #[must_use]
    pub fn time_in_state(&self) -> f32 {
        self.time_in_state
    }

    /// Clock time of the most recent state change
    #[must_use]
    pub fn last_state_change_time(&self) -> f32 {
        self.last_state_change_time
    }

    /// Per-entity memory
    #[must_use]
    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    /// Stop processing ticks
    pub fn pause(&mut self) {
        self.active = false;
    }

    /// Resume processing ticks
    pub fn resume(&mut self) {
        self.active = true;
    }

    /// React to broadcast game events
    pub fn handle_event(&mut self, event: &GameEvent) {
        if let GameEvent::GamePaused { paused } = event {
            if *paused {
                self.pause();
            } else {
                self.resume();
            }
        }
    }

    /// Switch to `next`.
    ///
    /// Does nothing for `None` or the node that is already active.
    /// Otherwise resets the time in state and records `now` as the change
    /// time. Returns whether the state changed.
    pub fn change_state(&mut self, next: Option<StateId>, now: f32) -> bool {
        let Some(next) = next else {
            return false;
        };
        if self.current == Some(next) {
            return false;
        }

        log::debug!(
            "{:?}: state {:?} -> {:?}",
            self.entity,
            self.current,
            next
        );
        self.current = Some(next);
        self.missing_state_reported = false;
        self.last_state_change_time = now;
        self.time_in_state = 0.0;
        true
    }

    /// Write a memory slot
    pub fn set_data<T: MemoryType>(&mut self, key: &str, value: T) {
        self.memory.set(key, value);
    }

    /// Read a memory slot, default when absent
    pub fn get_data<T: MemoryType>(&self, key: &str) -> T {
        self.memory.get(key)
    }

    /// Remove a memory slot
    pub fn remove_data(&mut self, key: &str) -> Option<MemoryValue> {
        self.memory.remove(key)
    }

    #[cfg(test)]
    pub(crate) fn set_time_in_state(&mut self, seconds: f32) {
        self.time_in_state = seconds;
    }

    /// Run one frame: update the active node, then accumulate time.
    ///
    /// Paused controllers and controllers without a state do nothing.
    pub fn update(
        &mut self,
        library: &StateLibrary,
        body: &mut dyn Body,
        time: &Time,
        rng: &mut dyn RngCore,
    ) {
        if !self.active {
            return;
        }
        let Some(id) = self.current else {
            return;
        };
        let Some(node) = library.get(id) else {
            if !self.missing_state_reported {
                log::warn!("{:?}: active state {:?} is not in the library", self.entity, id);
                self.missing_state_reported = true;
            }
            return;
        };

        let mut ctx = StateContext {
            controller: self,
            body,
            time,
            rng,
        };
        node.on_update(&mut ctx);

        self.time_in_state += time.delta_seconds();
    }
}

/// Update every entity that carries a `StateController`.
///
/// Entities missing a `Transform2D` or `Creature` are skipped; the problem
/// is logged once per controller.
pub fn update_controllers(
    world: &mut World,
    library: &StateLibrary,
    time: &Time,
    rng: &mut dyn RngCore,
) {
    let entities: Vec<Entity> = world
        .query::<&StateController>()
        .iter()
        .map(|(entity, _)| entity)
        .collect();

    for entity in entities {
        match world
            .inner
            .query_one_mut::<(&mut StateController, &mut Transform2D, &Creature)>(entity)
        {
            Ok((controller, transform, creature)) => {
                let mut body = EntityBody::new(transform, creature);
                controller.update(library, &mut body, time, rng);
            }
            Err(_) => {
                if let Ok(mut controller) = world.get_mut::<StateController>(entity)
                    && !controller.missing_body_reported
                {
                    log::warn!("{entity:?}: creature components missing, AI disabled");
                    controller.missing_body_reported = true;
                }
            }
        }
    }
}

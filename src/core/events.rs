//! Game-wide event broadcast
//!
//! Gameplay code announces pause toggles, level ups and AI state changes
//! without knowing who listens. An event pushed while frame N runs is
//! delivered to listeners in frame N+1, after [`EventQueue::swap`].
//!
//! # Example
//!
//! ```ignore
//! // Pause menu opened
//! ctx.events.push(GameEvent::GamePaused { paused: true });
//!
//! // Next frame, every AI controller reacts
//! for event in ctx.events.iter() {
//!     controller.handle_event(event);
//! }
//! ```

use hecs::Entity;

/// Something that happened in the game.
///
/// Listeners match on the variants they care about and ignore the rest.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum GameEvent {
    /// The game was paused or resumed.
    GamePaused {
        /// `true` when entering the pause menu
        paused: bool,
    },

    /// The player reached a new level.
    LevelUp {
        /// New player level
        level: u32,
    },

    /// A data-driven AI controller switched nodes.
    StateChanged {
        /// Entity whose controller changed state
        entity: Entity,
        /// Name of the node that was entered
        state: String,
    },
}

/// Two-frame mailbox for [`GameEvent`]s.
///
/// A pause pushed by a menu and a level up pushed by scoring in the same
/// frame reach every controller together on the next frame, whatever order
/// the systems ran in.
#[derive(Debug, Default)]
pub struct EventQueue {
    /// Collected during the current frame
    outgoing: Vec<GameEvent>,
    /// Delivered this frame
    delivered: Vec<GameEvent>,
}

impl EventQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Announce an event; listeners see it after the next swap
    pub fn push(&mut self, event: GameEvent) {
        self.outgoing.push(event);
    }

    /// Deliver this frame's announcements and forget the last batch.
    ///
    /// The engine calls this once at the start of every frame.
    pub fn swap(&mut self) {
        self.delivered.clear();
        std::mem::swap(&mut self.outgoing, &mut self.delivered);
    }

    /// Events delivered this frame, in push order
    pub fn iter(&self) -> impl Iterator<Item = &GameEvent> {
        self.delivered.iter()
    }

    /// Take the events delivered this frame
    pub fn drain(&mut self) -> impl Iterator<Item = GameEvent> + '_ {
        self.delivered.drain(..)
    }

    /// Nothing delivered this frame
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.delivered.is_empty()
    }

    /// Number of events delivered this frame
    #[must_use]
    pub fn len(&self) -> usize {
        self.delivered.len()
    }

    /// Number of events waiting for the next frame
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.outgoing.len()
    }
}

//! Code-driven state machine
//!
//! A [`StateMachine`] owns one instance of each registered state, keyed
//! by a small enum. Instead of evaluating every frame it polls the
//! current state on a fixed interval: the host calls
//! [`StateMachine::advance`] each frame and the machine decides whether
//! this frame is a poll.
//!
//! # Example
//!
//! ```ignore
//! #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
//! enum Mode { Calm, Alert }
//!
//! let mut machine = StateMachine::new(entity);
//! machine.add_state(CalmState::default(), true, &mut world)?;
//! machine.add_state(AlertState::default(), false, &mut world)?;
//! machine.start_machine(0.5, &mut world)?;
//!
//! // every frame
//! machine.advance(time.delta_seconds(), &mut world);
//! ```

use std::fmt;
use std::hash::Hash;

use hecs::Entity;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// A state owned by a [`StateMachine`].
///
/// The lifecycle is:
///
/// 1. `bind()` - Called with the machine's entity right before each entry
/// 2. `enter()` - Called once when the machine switches to this state
/// 3. `update()` - Called on every poll while active
/// 4. `exit()` - Called once when the machine leaves this state
pub trait MachineState<K, Ctx>: fmt::Debug {
    /// Key this state is registered under
    fn id(&self) -> K;

    /// Attach the entity the machine drives
    fn bind(&mut self, _entity: Entity) {}

    /// Called when entering this state
    fn enter(&mut self, _ctx: &mut Ctx) {}

    /// Called on each poll with the seconds since the previous poll.
    ///
    /// Returns the key that should be active; its own key means "stay".
    fn update(&mut self, ctx: &mut Ctx, elapsed: f32) -> K;

    /// Called when exiting this state
    fn exit(&mut self, _ctx: &mut Ctx) {}
}

/// Errors raised by [`StateMachine`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MachineError {
    /// A state with this key is already registered
    DuplicateState(String),
    /// The machine was started with nothing registered
    NoStates,
}

impl fmt::Display for MachineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateState(key) => write!(f, "state {key} is already registered"),
            Self::NoStates => write!(f, "no state available to run machine"),
        }
    }
}

impl std::error::Error for MachineError {}

/// Tunables of a [`StateMachine`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineConfig {
    /// Seconds between polls
    pub check_interval: f32,
}

impl MachineConfig {
    #[must_use]
    pub fn with_check_interval(mut self, seconds: f32) -> Self {
        self.check_interval = seconds;
        self
    }
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            check_interval: 1.0,
        }
    }
}

/// The armed polling loop
#[derive(Debug, Clone, Copy, Default)]
struct PollLoop {
    /// Time left before the next poll
    wait_remaining: f32,
    /// Time since the previous poll, handed to the state
    since_last_poll: f32,
}

/// Interval-polled state machine over states keyed by `K`
pub struct StateMachine<K, Ctx> {
    entity: Entity,
    states: FxHashMap<K, Box<dyn MachineState<K, Ctx>>>,
    order: Vec<K>,
    current: Option<K>,
    machine_on: bool,
    config: MachineConfig,
    poll: Option<PollLoop>,
}

impl<K, Ctx> StateMachine<K, Ctx>
where
    K: Copy + Eq + Hash + fmt::Debug,
{
    /// Create a stopped machine with no states
    #[must_use]
    pub fn new(entity: Entity) -> Self {
        Self::with_config(entity, MachineConfig::default())
    }

    /// Create a stopped machine with explicit tunables
    #[must_use]
    pub fn with_config(entity: Entity, config: MachineConfig) -> Self {
        Self {
            entity,
            states: FxHashMap::default(),
            order: Vec::new(),
            current: None,
            machine_on: false,
            config,
            poll: None,
        }
    }

    /// Register a state; `is_default` switches to it right away.
    ///
    /// # Errors
    ///
    /// Returns [`MachineError::DuplicateState`] if the key is taken; the
    /// registered state is kept.
    pub fn add_state(
        &mut self,
        state: impl MachineState<K, Ctx> + 'static,
        is_default: bool,
        ctx: &mut Ctx,
    ) -> Result<(), MachineError> {
        let key = state.id();
        if self.states.contains_key(&key) {
            log::warn!("{:?}: state {key:?} registered twice, keeping the first", self.entity);
            return Err(MachineError::DuplicateState(format!("{key:?}")));
        }

        self.states.insert(key, Box::new(state));
        self.order.push(key);

        if is_default {
            self.change_state(key, ctx);
        }
        Ok(())
    }

    /// Switch to the state registered under `key`.
    ///
    /// Unregistered keys are logged and ignored, as is the active key.
    /// Returns whether the state changed.
    pub fn change_state(&mut self, key: K, ctx: &mut Ctx) -> bool {
        if !self.states.contains_key(&key) {
            log::info!("{:?}: requested state {key:?} is not available", self.entity);
            return false;
        }
        if self.current == Some(key) {
            return false;
        }

        if let Some(previous) = self.current
            && let Some(state) = self.states.get_mut(&previous)
        {
            state.exit(ctx);
        }

        log::debug!("{:?}: state {:?} -> {key:?}", self.entity, self.current);
        self.current = Some(key);
        let entity = self.entity;
        if let Some(state) = self.states.get_mut(&key) {
            state.bind(entity);
            state.enter(ctx);
        }
        true
    }

    /// Start polling from the current state.
    ///
    /// Without a current state the first registered one is used. An
    /// `interval` above zero replaces the configured poll interval.
    ///
    /// # Errors
    ///
    /// Returns [`MachineError::NoStates`] when nothing is registered.
    pub fn start_machine(&mut self, interval: f32, ctx: &mut Ctx) -> Result<(), MachineError> {
        let Some(&first) = self.order.first() else {
            log::error!("{:?}: no state available to run machine", self.entity);
            return Err(MachineError::NoStates);
        };

        self.apply_interval(interval);
        if self.current.is_none() {
            log::warn!(
                "{:?}: initial state is not defined, using first registered {first:?}",
                self.entity
            );
            self.change_state(first, ctx);
        }

        self.arm();
        Ok(())
    }

    /// Switch to `initial`, then start polling.
    ///
    /// # Errors
    ///
    /// Returns [`MachineError::NoStates`] when nothing is registered.
    pub fn start_machine_in(
        &mut self,
        initial: K,
        interval: f32,
        ctx: &mut Ctx,
    ) -> Result<(), MachineError> {
        if self.states.is_empty() {
            log::error!("{:?}: no state available to run machine", self.entity);
            return Err(MachineError::NoStates);
        }

        self.apply_interval(interval);
        self.change_state(initial, ctx);
        self.arm();
        Ok(())
    }

    /// Toggle between running and paused
    pub fn pause_machine(&mut self) {
        if self.machine_on {
            self.machine_on = false;
            self.poll = None;
        } else {
            self.arm();
        }
    }

    /// Stop polling
    pub fn stop_machine(&mut self) {
        self.machine_on = false;
        self.poll = None;
    }

    /// Feed one frame of time; polls when the interval has elapsed.
    ///
    /// At most one poll happens per call. Returns whether this call
    /// polled.
    pub fn advance(&mut self, delta: f32, ctx: &mut Ctx) -> bool {
        let interval = self.config.check_interval;
        let Some(poll) = self.poll.as_mut() else {
            return false;
        };

        poll.since_last_poll += delta;
        if poll.wait_remaining > 0.0 {
            poll.wait_remaining -= delta;
            if poll.wait_remaining > 0.0 {
                return false;
            }
        }

        let elapsed = poll.since_last_poll;
        poll.since_last_poll = 0.0;
        poll.wait_remaining = interval;
        self.poll_once(ctx, elapsed);
        true
    }

    fn poll_once(&mut self, ctx: &mut Ctx, elapsed: f32) {
        let Some(key) = self.current else {
            return;
        };
        let Some(state) = self.states.get_mut(&key) else {
            return;
        };

        let next = state.update(ctx, elapsed);
        if next != key {
            self.change_state(next, ctx);
        }
    }

    fn apply_interval(&mut self, interval: f32) {
        if interval > 0.0 {
            self.config.check_interval = interval;
        }
    }

    /// Replace any running loop with a fresh one that polls next frame
    fn arm(&mut self) {
        self.poll = Some(PollLoop::default());
        self.machine_on = true;
    }

    /// Entity this machine drives
    #[must_use]
    pub fn entity(&self) -> Entity {
        self.entity
    }

    /// Active state key
    #[must_use]
    pub fn current_state(&self) -> Option<K> {
        self.current
    }

    /// Whether the machine is switched on
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.machine_on
    }

    /// Seconds between polls
    #[must_use]
    pub fn interval(&self) -> f32 {
        self.config.check_interval
    }

    #[must_use]
    pub fn config(&self) -> &MachineConfig {
        &self.config
    }

    /// Whether a state is registered under `key`
    #[must_use]
    pub fn contains(&self, key: K) -> bool {
        self.states.contains_key(&key)
    }

    /// Registered state by key
    #[must_use]
    pub fn state(&self, key: K) -> Option<&dyn MachineState<K, Ctx>> {
        self.states.get(&key).map(|state| state.as_ref())
    }

    /// Number of registered states
    #[must_use]
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Check if no state is registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

impl<K: fmt::Debug, Ctx> fmt::Debug for StateMachine<K, Ctx> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateMachine")
            .field("entity", &self.entity)
            .field("states", &self.order)
            .field("current", &self.current)
            .field("machine_on", &self.machine_on)
            .field("poll", &self.poll)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::controller::tests::test_entity;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum Mode {
        Calm,
        Alert,
        Missing,
    }

    #[derive(Debug, Default)]
    struct Journal {
        lines: Vec<String>,
        polls: Vec<f32>,
    }

    /// Records its lifecycle and asks for `next` once polled `hand_over_after` times
    #[derive(Debug)]
    struct Probe {
        mode: Mode,
        next: Mode,
        hand_over_after: usize,
        polls: usize,
        bound: Option<Entity>,
    }

    impl Probe {
        fn staying(mode: Mode) -> Self {
            Self::handing_over(mode, mode, usize::MAX)
        }

        fn handing_over(mode: Mode, next: Mode, hand_over_after: usize) -> Self {
            Self {
                mode,
                next,
                hand_over_after,
                polls: 0,
                bound: None,
            }
        }
    }

    impl MachineState<Mode, Journal> for Probe {
        fn id(&self) -> Mode {
            self.mode
        }

        fn bind(&mut self, entity: Entity) {
            self.bound = Some(entity);
        }

        fn enter(&mut self, ctx: &mut Journal) {
            let bound = if self.bound.is_some() { "bound" } else { "unbound" };
            ctx.lines.push(format!("enter {:?} {bound}", self.mode));
        }

        fn update(&mut self, ctx: &mut Journal, elapsed: f32) -> Mode {
            self.polls += 1;
            ctx.polls.push(elapsed);
            if self.polls >= self.hand_over_after {
                self.polls = 0;
                self.next
            } else {
                self.mode
            }
        }

        fn exit(&mut self, ctx: &mut Journal) {
            ctx.lines.push(format!("exit {:?}", self.mode));
        }
    }

    #[test]
    fn test_default_state_enters_bound() {
        let mut journal = Journal::default();
        let mut machine = StateMachine::new(test_entity());

        machine
            .add_state(Probe::staying(Mode::Calm), true, &mut journal)
            .unwrap();

        assert_eq!(machine.current_state(), Some(Mode::Calm));
        assert_eq!(journal.lines, vec!["enter Calm bound"]);
        assert!(!machine.is_running());
    }

    #[test]
    fn test_duplicate_registration_is_rejected() {
        let mut journal = Journal::default();
        let mut machine = StateMachine::new(test_entity());
        machine
            .add_state(Probe::staying(Mode::Calm), false, &mut journal)
            .unwrap();

        let err = machine
            .add_state(
                Probe::handing_over(Mode::Calm, Mode::Alert, 1),
                true,
                &mut journal,
            )
            .unwrap_err();

        assert_eq!(err, MachineError::DuplicateState("Calm".to_string()));
        assert_eq!(machine.len(), 1);
        assert_eq!(machine.current_state(), None);
        assert!(journal.lines.is_empty());
    }

    #[test]
    fn test_change_state_protocol() {
        let mut journal = Journal::default();
        let mut machine = StateMachine::new(test_entity());
        machine
            .add_state(Probe::staying(Mode::Calm), true, &mut journal)
            .unwrap();
        machine
            .add_state(Probe::staying(Mode::Alert), false, &mut journal)
            .unwrap();

        assert!(!machine.change_state(Mode::Missing, &mut journal));
        assert!(!machine.change_state(Mode::Calm, &mut journal));
        assert_eq!(machine.current_state(), Some(Mode::Calm));

        assert!(machine.change_state(Mode::Alert, &mut journal));
        assert_eq!(
            journal.lines,
            vec!["enter Calm bound", "exit Calm", "enter Alert bound"]
        );
    }

    #[test]
    fn test_start_without_states_fails() {
        let mut journal = Journal::default();
        let mut machine: StateMachine<Mode, Journal> = StateMachine::new(test_entity());

        assert_eq!(machine.start_machine(0.0, &mut journal), Err(MachineError::NoStates));
        assert_eq!(
            machine.start_machine_in(Mode::Calm, 0.0, &mut journal),
            Err(MachineError::NoStates)
        );
        assert!(!machine.is_running());
        assert!(!machine.advance(1.0, &mut journal));
    }

    #[test]
    fn test_start_falls_back_to_first_registered() {
        let mut journal = Journal::default();
        let mut machine = StateMachine::new(test_entity());
        machine
            .add_state(Probe::staying(Mode::Alert), false, &mut journal)
            .unwrap();
        machine
            .add_state(Probe::staying(Mode::Calm), false, &mut journal)
            .unwrap();

        machine.start_machine(0.0, &mut journal).unwrap();

        assert_eq!(machine.current_state(), Some(Mode::Alert));
        assert!(machine.is_running());
        assert_eq!(machine.interval(), 1.0);
    }

    #[test]
    fn test_start_in_overrides_interval() {
        let mut journal = Journal::default();
        let mut machine = StateMachine::new(test_entity());
        machine
            .add_state(Probe::staying(Mode::Calm), true, &mut journal)
            .unwrap();
        machine
            .add_state(Probe::staying(Mode::Alert), false, &mut journal)
            .unwrap();

        machine.start_machine_in(Mode::Alert, 0.5, &mut journal).unwrap();
        assert_eq!(machine.current_state(), Some(Mode::Alert));
        assert_eq!(machine.interval(), 0.5);

        // Non-positive keeps the current interval
        machine.start_machine(-1.0, &mut journal).unwrap();
        assert_eq!(machine.interval(), 0.5);
    }

    #[test]
    fn test_poll_cadence() {
        let mut journal = Journal::default();
        let mut machine = StateMachine::new(test_entity());
        machine
            .add_state(Probe::staying(Mode::Calm), true, &mut journal)
            .unwrap();
        machine.start_machine(1.0, &mut journal).unwrap();

        // First frame after start polls, then one poll per second
        let polled: Vec<bool> = (0..9)
            .map(|_| machine.advance(0.25, &mut journal))
            .collect();
        assert_eq!(
            polled,
            vec![true, false, false, false, true, false, false, false, true]
        );
        assert_eq!(journal.polls, vec![0.25, 1.0, 1.0]);
    }

    #[test]
    fn test_large_frame_polls_once() {
        let mut journal = Journal::default();
        let mut machine = StateMachine::new(test_entity());
        machine
            .add_state(Probe::staying(Mode::Calm), true, &mut journal)
            .unwrap();
        machine.start_machine(0.5, &mut journal).unwrap();

        assert!(machine.advance(0.1, &mut journal));
        assert!(machine.advance(5.0, &mut journal));
        assert!(!machine.advance(0.1, &mut journal));
        assert_eq!(journal.polls.len(), 2);
    }

    #[test]
    fn test_restart_keeps_a_single_loop() {
        let mut journal = Journal::default();
        let mut machine = StateMachine::new(test_entity());
        machine
            .add_state(Probe::staying(Mode::Calm), true, &mut journal)
            .unwrap();

        machine.start_machine(1.0, &mut journal).unwrap();
        machine.start_machine(1.0, &mut journal).unwrap();
        machine.advance(0.1, &mut journal);

        assert_eq!(journal.polls.len(), 1);
    }

    #[test]
    fn test_poll_switches_state() {
        let mut journal = Journal::default();
        let mut machine = StateMachine::new(test_entity());
        machine
            .add_state(
                Probe::handing_over(Mode::Calm, Mode::Alert, 2),
                true,
                &mut journal,
            )
            .unwrap();
        machine
            .add_state(
                Probe::handing_over(Mode::Alert, Mode::Missing, 1),
                false,
                &mut journal,
            )
            .unwrap();
        machine.start_machine(1.0, &mut journal).unwrap();

        machine.advance(1.0, &mut journal);
        assert_eq!(machine.current_state(), Some(Mode::Calm));
        machine.advance(1.0, &mut journal);
        assert_eq!(machine.current_state(), Some(Mode::Alert));

        // Alert asks for an unregistered state and stays put
        machine.advance(1.0, &mut journal);
        assert_eq!(machine.current_state(), Some(Mode::Alert));
        assert_eq!(
            journal.lines,
            vec!["enter Calm bound", "exit Calm", "enter Alert bound"]
        );
    }

    #[test]
    fn test_pause_toggles_and_stop_halts() {
        let mut journal = Journal::default();
        let mut machine = StateMachine::new(test_entity());
        machine
            .add_state(Probe::staying(Mode::Calm), true, &mut journal)
            .unwrap();
        machine.start_machine(1.0, &mut journal).unwrap();
        machine.advance(0.1, &mut journal);

        machine.pause_machine();
        assert!(!machine.is_running());
        assert!(!machine.advance(10.0, &mut journal));

        machine.pause_machine();
        assert!(machine.is_running());
        assert!(machine.advance(0.1, &mut journal));

        machine.stop_machine();
        assert!(!machine.is_running());
        assert!(!machine.advance(10.0, &mut journal));
        assert_eq!(journal.polls.len(), 2);
        assert_eq!(machine.current_state(), Some(Mode::Calm));
    }

    #[test]
    fn test_config_from_ron() {
        let config: MachineConfig = ron::from_str("(check_interval: 0.25)").unwrap();
        assert_eq!(config.check_interval, 0.25);

        let defaulted: MachineConfig = ron::from_str("()").unwrap();
        assert_eq!(defaulted, MachineConfig::default());
        assert_eq!(
            MachineConfig::default().with_check_interval(2.0).check_interval,
            2.0
        );
    }
}

//! State nodes and transitions
//!
//! A [`StateNode`] is shared, immutable behavior: an ordered list of
//! actions run every tick and an ordered list of transitions checked before
//! them. Per-entity data never lives on the node; it goes through the
//! controller's memory.
//!
//! Tick order for the active node:
//!
//! 1. Entry actions, once per entity visiting this node
//! 2. Stop if the controller is paused
//! 3. Transitions in declared order; the first one whose chosen target is
//!    another node changes state and ends evaluation
//! 4. Actions, only if the controller is still in this node
//!
//! A node entered in step 3 does not run its actions until the next tick.

use std::fmt;

use glam::Vec4;
use smallvec::SmallVec;

use super::action::StateAction;
use super::controller::StateContext;
use super::decision::DecisionLogic;

/// Index of a node inside its [`StateLibrary`](super::StateLibrary)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateId(pub(crate) usize);

impl StateId {
    /// Placeholder for nodes not yet added to a library
    pub(crate) const UNASSIGNED: Self = Self(usize::MAX);

    /// Position in the library
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A decision plus the node to enter for each outcome.
///
/// A `None` target, or a target equal to the owning node, means "stay".
#[derive(Debug)]
pub struct Transition {
    decision: Box<dyn DecisionLogic>,
    on_true: Option<StateId>,
    on_false: Option<StateId>,
}

impl Transition {
    /// Create a transition
    pub fn new(
        decision: impl DecisionLogic + 'static,
        on_true: Option<StateId>,
        on_false: Option<StateId>,
    ) -> Self {
        Self::from_boxed(Box::new(decision), on_true, on_false)
    }

    /// Create a transition from an already boxed decision
    pub fn from_boxed(
        decision: Box<dyn DecisionLogic>,
        on_true: Option<StateId>,
        on_false: Option<StateId>,
    ) -> Self {
        Self {
            decision,
            on_true,
            on_false,
        }
    }

    /// Target when the decision is true
    #[must_use]
    pub fn on_true(&self) -> Option<StateId> {
        self.on_true
    }

    /// Target when the decision is false
    #[must_use]
    pub fn on_false(&self) -> Option<StateId> {
        self.on_false
    }

    /// The decision logic
    #[must_use]
    pub fn decision(&self) -> &dyn DecisionLogic {
        self.decision.as_ref()
    }

    /// Evaluate the decision and pick the matching target
    pub fn evaluate(&self, ctx: &mut StateContext<'_>) -> Option<StateId> {
        if self.decision.decide(ctx) {
            self.on_true
        } else {
            self.on_false
        }
    }
}

/// Memory key prefix of the per-entity "entry actions ran" flag
const ENTRY_FLAG_PREFIX: &str = "__node_init:";

/// A named unit of AI behavior
#[derive(Debug)]
pub struct StateNode {
    id: StateId,
    name: String,
    /// Debug visualization tint
    pub color: Vec4,
    /// Free-form author notes
    pub notes: String,
    entry_actions: SmallVec<[Box<dyn StateAction>; 2]>,
    actions: SmallVec<[Box<dyn StateAction>; 4]>,
    transitions: SmallVec<[Transition; 4]>,
}

impl StateNode {
    /// Default debug tint (grey)
    pub const DEFAULT_COLOR: Vec4 = Vec4::new(0.5, 0.5, 0.5, 1.0);

    /// Create an empty node
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: StateId::UNASSIGNED,
            name: name.into(),
            color: Self::DEFAULT_COLOR,
            notes: String::new(),
            entry_actions: SmallVec::new(),
            actions: SmallVec::new(),
            transitions: SmallVec::new(),
        }
    }

    /// Set the debug tint
    #[must_use]
    pub fn with_color(mut self, color: Vec4) -> Self {
        self.color = color;
        self
    }

    /// Set author notes
    #[must_use]
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    /// Append a per-tick action
    #[must_use]
    pub fn with_action(mut self, action: impl StateAction + 'static) -> Self {
        self.actions.push(Box::new(action));
        self
    }

    /// Append an action run once per entity on first visit
    #[must_use]
    pub fn with_entry_action(mut self, action: impl StateAction + 'static) -> Self {
        self.entry_actions.push(Box::new(action));
        self
    }

    /// Append a transition
    #[must_use]
    pub fn with_transition(mut self, transition: Transition) -> Self {
        self.transitions.push(transition);
        self
    }

    /// Append a boxed per-tick action
    pub fn add_action(&mut self, action: Box<dyn StateAction>) {
        self.actions.push(action);
    }

    /// Append a boxed entry action
    pub fn add_entry_action(&mut self, action: Box<dyn StateAction>) {
        self.entry_actions.push(action);
    }

    /// Append a transition
    pub fn add_transition(&mut self, transition: Transition) {
        self.transitions.push(transition);
    }

    /// Library id (unassigned until added to a library)
    #[must_use]
    pub fn id(&self) -> StateId {
        self.id
    }

    pub(crate) fn assign_id(&mut self, id: StateId) {
        self.id = id;
    }

    /// Unique name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Transitions in evaluation order
    #[must_use]
    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    /// Number of per-tick actions
    #[must_use]
    pub fn action_count(&self) -> usize {
        self.actions.len()
    }

    /// Run one tick of this node for the controller in `ctx`
    pub fn on_update(&self, ctx: &mut StateContext<'_>) {
        self.on_start(ctx);

        if !ctx.controller.is_active() {
            return;
        }

        self.execute_transitions(ctx);

        if ctx.controller.current_state() == Some(self.id) {
            self.execute_actions(ctx);
        }
    }

    fn on_start(&self, ctx: &mut StateContext<'_>) {
        let key = format!("{ENTRY_FLAG_PREFIX}{}", self.id.0);
        if ctx.controller.get_data::<bool>(&key) {
            return;
        }
        ctx.controller.set_data(&key, true);

        for action in &self.entry_actions {
            action.on_update(ctx);
        }
    }

    fn execute_transitions(&self, ctx: &mut StateContext<'_>) {
        for transition in &self.transitions {
            if let Some(target) = transition.evaluate(ctx)
                && target != self.id
            {
                ctx.controller
                    .change_state(Some(target), ctx.time.elapsed_seconds());
                break;
            }
        }
    }

    fn execute_actions(&self, ctx: &mut StateContext<'_>) {
        for action in &self.actions {
            action.on_update(ctx);
        }
    }
}

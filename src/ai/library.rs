//! Shared library of state nodes
//!
//! Nodes are authored once and referenced by id from any number of
//! controllers. The library is read-only while controllers run.

use std::fmt;

use rustc_hash::FxHashMap;

use super::node::{StateId, StateNode};

/// Errors raised while building or loading a state library
#[derive(Debug, Clone, PartialEq)]
pub enum LibraryError {
    /// Two nodes share a name
    DuplicateState(String),
    /// The configured initial node does not exist
    UnknownInitial(String),
    /// IO error
    IoError(String),
    /// Serialization error
    SerializeError(String),
    /// Deserialization error
    DeserializeError(String),
}

impl fmt::Display for LibraryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateState(name) => write!(f, "state '{name}' is defined twice"),
            Self::UnknownInitial(name) => write!(f, "initial state '{name}' does not exist"),
            Self::IoError(e) => write!(f, "IO error: {e}"),
            Self::SerializeError(e) => write!(f, "Serialization error: {e}"),
            Self::DeserializeError(e) => write!(f, "Deserialization error: {e}"),
        }
    }
}

impl std::error::Error for LibraryError {}

/// Owner of every state node of a game
#[derive(Debug, Default)]
pub struct StateLibrary {
    nodes: Vec<StateNode>,
    by_name: FxHashMap<String, StateId>,
}

impl StateLibrary {
    /// Create an empty library
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node and return its id.
    ///
    /// # Errors
    ///
    /// Returns [`LibraryError::DuplicateState`] if the name is taken; the
    /// existing node is kept.
    pub fn add_state(&mut self, mut node: StateNode) -> Result<StateId, LibraryError> {
        if self.by_name.contains_key(node.name()) {
            log::warn!("Ignoring duplicate state '{}'", node.name());
            return Err(LibraryError::DuplicateState(node.name().to_owned()));
        }

        let id = StateId(self.nodes.len());
        node.assign_id(id);
        self.by_name.insert(node.name().to_owned(), id);
        self.nodes.push(node);
        Ok(id)
    }

    /// Node by id
    #[must_use]
    pub fn get(&self, id: StateId) -> Option<&StateNode> {
        self.nodes.get(id.0)
    }

    /// Node by id (mutable), for wiring transitions after creation
    pub fn state_mut(&mut self, id: StateId) -> Option<&mut StateNode> {
        self.nodes.get_mut(id.0)
    }

    /// Id of the node with this name
    #[must_use]
    pub fn find(&self, name: &str) -> Option<StateId> {
        self.by_name.get(name).copied()
    }

    /// Name of a node, for logs
    #[must_use]
    pub fn name_of(&self, id: StateId) -> Option<&str> {
        self.get(id).map(StateNode::name)
    }

    /// Iterate nodes in id order
    pub fn iter(&self) -> impl Iterator<Item = &StateNode> {
        self.nodes.iter()
    }

    /// Get the number of nodes
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the library is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Transition targets that point outside the library, as
    /// `(owning node, target)` pairs
    #[must_use]
    pub fn dangling_targets(&self) -> Vec<(StateId, StateId)> {
        let mut dangling = Vec::new();
        for node in &self.nodes {
            for transition in node.transitions() {
                for target in [transition.on_true(), transition.on_false()]
                    .into_iter()
                    .flatten()
                {
                    if self.get(target).is_none() {
                        dangling.push((node.id(), target));
                    }
                }
            }
        }
        dangling
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{SwitchStateAfter, Transition};

    #[test]
    fn test_ids_follow_insertion_order() {
        let mut library = StateLibrary::new();
        let idle = library.add_state(StateNode::new("Idle")).unwrap();
        let wander = library.add_state(StateNode::new("Wander")).unwrap();

        assert_eq!(idle.index(), 0);
        assert_eq!(wander.index(), 1);
        assert_eq!(library.find("Wander"), Some(wander));
        assert_eq!(library.name_of(idle), Some("Idle"));
        assert_eq!(library.get(wander).map(StateNode::id), Some(wander));
        assert_eq!(library.len(), 2);
    }

    #[test]
    fn test_duplicate_names_are_rejected() {
        let mut library = StateLibrary::new();
        library
            .add_state(StateNode::new("Idle").with_notes("first"))
            .unwrap();

        let err = library
            .add_state(StateNode::new("Idle").with_notes("second"))
            .unwrap_err();
        assert_eq!(err, LibraryError::DuplicateState("Idle".to_string()));
        assert_eq!(library.len(), 1);
        assert_eq!(library.iter().next().map(|n| n.notes.as_str()), Some("first"));
    }

    #[test]
    fn test_dangling_targets_are_reported() {
        let mut library = StateLibrary::new();
        let idle = library.add_state(StateNode::new("Idle")).unwrap();
        library.state_mut(idle).unwrap().add_transition(Transition::new(
            SwitchStateAfter::new(1.0),
            Some(StateId(5)),
            Some(idle),
        ));

        assert_eq!(library.dangling_targets(), vec![(idle, StateId(5))]);
    }
}

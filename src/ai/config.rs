//! Authoring format for state graphs
//!
//! Supports loading node graphs from RON (Rusty Object Notation) or JSON.
//! Nodes reference each other by name; [`StateGraphConfig::build`]
//! resolves names into a [`StateLibrary`].

use std::fs;
use std::path::Path;

use glam::Vec4;
use serde::{Deserialize, Serialize};

use super::action::{StateAction, WanderAction};
use super::decision::{DecisionLogic, SwitchStateAfter, WaitForRandom, WanderingCounter};
use super::library::{LibraryError, StateLibrary};
use super::node::{StateId, StateNode, Transition};
use crate::animation::Curve;

/// Decision logic as authored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DecisionConfig {
    /// True after a fixed time in state
    SwitchStateAfter { seconds: f32 },
    /// True after a random time in state, redrawn per visit
    WaitForRandom { min: f32, max: f32 },
    /// True after enough wander legs
    WanderingCounter { threshold: i32 },
}

impl DecisionConfig {
    fn build(&self) -> Box<dyn DecisionLogic> {
        match *self {
            Self::SwitchStateAfter { seconds } => Box::new(SwitchStateAfter::new(seconds)),
            Self::WaitForRandom { min, max } => Box::new(WaitForRandom::new(min, max)),
            Self::WanderingCounter { threshold } => Box::new(WanderingCounter::new(threshold)),
        }
    }
}

/// Action as authored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ActionConfig {
    /// Random eased roaming
    Wander {
        radius_x: f32,
        radius_y: f32,
        #[serde(default)]
        curve_intensity: Option<f32>,
        #[serde(default)]
        easing: Option<Curve>,
        #[serde(default)]
        curve: Option<Curve>,
    },
}

impl ActionConfig {
    fn build(&self) -> Box<dyn StateAction> {
        match self {
            Self::Wander {
                radius_x,
                radius_y,
                curve_intensity,
                easing,
                curve,
            } => {
                let mut action = WanderAction::new(*radius_x, *radius_y);
                if let Some(easing) = easing {
                    action = action.with_easing(easing.clone());
                }
                let intensity = curve_intensity.unwrap_or(action.curve_intensity);
                let bow = curve.clone().unwrap_or_else(|| action.curve.clone());
                Box::new(action.with_curve(bow, intensity))
            }
        }
    }
}

/// Transition as authored; targets are node names
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionConfig {
    pub decision: DecisionConfig,
    #[serde(default)]
    pub on_true: Option<String>,
    #[serde(default)]
    pub on_false: Option<String>,
}

fn default_color() -> Vec4 {
    StateNode::DEFAULT_COLOR
}

/// Node as authored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateConfig {
    /// Unique name
    pub name: String,
    /// Debug visualization tint
    #[serde(default = "default_color")]
    pub color: Vec4,
    /// Free-form author notes
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub entry_actions: Vec<ActionConfig>,
    #[serde(default)]
    pub actions: Vec<ActionConfig>,
    #[serde(default)]
    pub transitions: Vec<TransitionConfig>,
}

impl StateConfig {
    /// Named node with no behavior
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            color: default_color(),
            notes: String::new(),
            entry_actions: Vec::new(),
            actions: Vec::new(),
            transitions: Vec::new(),
        }
    }
}

/// A complete state graph with its entry node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateGraphConfig {
    /// Node every new controller starts in
    pub initial: String,
    /// All nodes
    pub states: Vec<StateConfig>,
}

impl StateGraphConfig {
    /// Resolve names and build the library, returning it with the initial
    /// node's id.
    ///
    /// Transition targets naming unknown nodes are logged and treated as
    /// "stay".
    ///
    /// # Errors
    ///
    /// Returns an error for duplicate node names or an unknown initial node.
    pub fn build(&self) -> Result<(StateLibrary, StateId), LibraryError> {
        let mut library = StateLibrary::new();

        for state in &self.states {
            let mut node = StateNode::new(state.name.clone())
                .with_color(state.color)
                .with_notes(state.notes.clone());
            for action in &state.entry_actions {
                node.add_entry_action(action.build());
            }
            for action in &state.actions {
                node.add_action(action.build());
            }
            library.add_state(node)?;
        }

        for state in &self.states {
            let Some(id) = library.find(&state.name) else {
                continue;
            };
            let transitions: Vec<Transition> = state
                .transitions
                .iter()
                .map(|t| {
                    Transition::from_boxed(
                        t.decision.build(),
                        resolve(&library, &state.name, t.on_true.as_deref()),
                        resolve(&library, &state.name, t.on_false.as_deref()),
                    )
                })
                .collect();

            if let Some(node) = library.state_mut(id) {
                for transition in transitions {
                    node.add_transition(transition);
                }
            }
        }

        let initial = library
            .find(&self.initial)
            .ok_or_else(|| LibraryError::UnknownInitial(self.initial.clone()))?;

        log::info!(
            "Built state library: {} states, initial '{}'",
            library.len(),
            self.initial
        );
        Ok((library, initial))
    }

    /// Parse a RON document
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a valid state graph
    pub fn from_ron_str(text: &str) -> Result<Self, LibraryError> {
        ron::from_str(text).map_err(|e| LibraryError::DeserializeError(e.to_string()))
    }

    /// Save the graph to a RON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or serialization fails
    pub fn save_ron(&self, path: impl AsRef<Path>) -> Result<(), LibraryError> {
        let ron_string = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| LibraryError::SerializeError(e.to_string()))?;
        fs::write(path, ron_string).map_err(|e| LibraryError::IoError(e.to_string()))?;
        Ok(())
    }

    /// Load a graph from a RON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or deserialization fails
    pub fn load_ron(path: impl AsRef<Path>) -> Result<Self, LibraryError> {
        let content = fs::read_to_string(path).map_err(|e| LibraryError::IoError(e.to_string()))?;
        Self::from_ron_str(&content)
    }

    /// Save the graph to a JSON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or serialization fails
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<(), LibraryError> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| LibraryError::SerializeError(e.to_string()))?;
        fs::write(path, json).map_err(|e| LibraryError::IoError(e.to_string()))?;
        Ok(())
    }

    /// Load a graph from a JSON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or deserialization fails
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, LibraryError> {
        let content = fs::read_to_string(path).map_err(|e| LibraryError::IoError(e.to_string()))?;
        serde_json::from_str(&content).map_err(|e| LibraryError::DeserializeError(e.to_string()))
    }
}

fn resolve(library: &StateLibrary, owner: &str, target: Option<&str>) -> Option<StateId> {
    let name = target?;
    let id = library.find(name);
    if id.is_none() {
        log::warn!("State '{owner}': unknown transition target '{name}', staying instead");
    }
    id
}

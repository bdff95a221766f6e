//! Action/binding manifest parsing.
//!
//! A manifest is built from two JSON documents: an action list declaring
//! `{name, type}` pairs, and a bindings document mapping physical input paths
//! to action names for one interaction profile. The result is an immutable
//! action-name → [`Binding`] table.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Declared type of a bound action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingType {
    Boolean,
    Float,
    Vec2,
    Pose,
    Haptic,
    Unknown,
}

impl BindingType {
    fn from_str(s: &str) -> Self {
        match s {
            "boolean" => BindingType::Boolean,
            "vector1" => BindingType::Float,
            "vector2" => BindingType::Vec2,
            "pose" => BindingType::Pose,
            "vibration" => BindingType::Haptic,
            other => {
                warn!(ty = other, "binding type is not known");
                BindingType::Unknown
            }
        }
    }
}

/// Input mode of a bound source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingMode {
    None,
    Button,
    Trackpad,
    Joystick,
    Unknown,
}

impl BindingMode {
    fn from_str(s: Option<&str>) -> Self {
        match s {
            None => BindingMode::None,
            Some("button") => BindingMode::Button,
            Some("trackpad") => BindingMode::Trackpad,
            Some("joystick") => BindingMode::Joystick,
            Some(other) => {
                warn!(mode = other, "binding mode is not known");
                BindingMode::Unknown
            }
        }
    }
}

/// Component of a physical input a binding attaches to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingComponent {
    Click,
    Position,
    /// Whole-input bindings (pose, haptic) have no component.
    None,
    Unknown,
}

impl BindingComponent {
    fn from_str(s: &str) -> Self {
        match s {
            "click" => BindingComponent::Click,
            "position" => BindingComponent::Position,
            other => {
                warn!(component = other, "binding component is not known");
                BindingComponent::Unknown
            }
        }
    }
}

/// One physical input path bound to an action.
#[derive(Debug, Clone, PartialEq)]
pub struct BindingPath {
    pub component: BindingComponent,
    pub path: String,
}

impl BindingPath {
    /// The full path submitted as a binding suggestion, or `None` when this
    /// component cannot be suggested. `Click` appends a `/click` component;
    /// `Position` and componentless bindings use the input path as-is.
    pub fn suggested_path(&self) -> Option<String> {
        match self.component {
            BindingComponent::Click => Some(format!("{}/click", self.path)),
            BindingComponent::Position | BindingComponent::None => Some(self.path.clone()),
            BindingComponent::Unknown => None,
        }
    }
}

/// Everything the manifest knows about one action.
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub binding_type: BindingType,
    pub mode: BindingMode,
    pub input_paths: Vec<BindingPath>,
}

// Raw document shapes. Missing required members fail the whole load.

#[derive(Deserialize)]
struct ActionsDoc {
    actions: Vec<ActionEntry>,
}

#[derive(Deserialize)]
struct ActionEntry {
    name: String,
    #[serde(rename = "type")]
    ty: String,
}

#[derive(Deserialize)]
struct BindingsDoc {
    #[serde(default)]
    interaction_profile: Option<String>,
    bindings: HashMap<String, ActionSetBindings>,
}

#[derive(Deserialize)]
struct ActionSetBindings {
    #[serde(default)]
    sources: Vec<SourceEntry>,
    #[serde(default)]
    pose: Vec<OutputEntry>,
    #[serde(default)]
    haptics: Vec<OutputEntry>,
}

#[derive(Deserialize)]
struct SourceEntry {
    path: String,
    #[serde(default)]
    mode: Option<String>,
    inputs: HashMap<String, InputEntry>,
}

#[derive(Deserialize)]
struct InputEntry {
    output: String,
}

#[derive(Deserialize)]
struct OutputEntry {
    path: String,
    output: String,
}

/// Parsed action → binding table for one interaction profile. Immutable after
/// load.
#[derive(Debug, Clone)]
pub struct Manifest {
    interaction_profile: Option<String>,
    actions: HashMap<String, Binding>,
    num_inputs: usize,
}

impl Manifest {
    /// Parse a manifest from the actions document and the bindings document.
    ///
    /// Malformed JSON or missing required members abort the load; no partial
    /// manifest is usable. A bindings document may declare more outputs than
    /// the action list knows; those are skipped with a diagnostic.
    pub fn load(actions_json: &str, bindings_json: &str) -> Result<Manifest> {
        let actions_doc: ActionsDoc = serde_json::from_str(actions_json)
            .map_err(|e| Error::Manifest(format!("unable to parse actions: {e}")))?;

        let mut actions = HashMap::new();
        debug!(count = actions_doc.actions.len(), "parsing actions");
        for entry in actions_doc.actions {
            debug!(name = %entry.name, ty = %entry.ty, "parsed action");
            actions.insert(
                entry.name,
                Binding {
                    binding_type: BindingType::from_str(&entry.ty),
                    mode: BindingMode::Unknown,
                    input_paths: Vec::new(),
                },
            );
        }

        let bindings_doc: BindingsDoc = serde_json::from_str(bindings_json)
            .map_err(|e| Error::Manifest(format!("unable to parse bindings: {e}")))?;

        let mut num_inputs = 0;
        for (set_url, set_bindings) in &bindings_doc.bindings {
            debug!(action_set = %set_url, "parsing action set bindings");

            for source in &set_bindings.sources {
                let mode = BindingMode::from_str(source.mode.as_deref());
                for (component, input) in &source.inputs {
                    let Some(binding) = actions.get_mut(&input.output) else {
                        warn!(
                            output = %input.output,
                            "binding refers to an action missing from the action list"
                        );
                        continue;
                    };
                    binding.mode = mode;
                    binding.input_paths.push(BindingPath {
                        component: BindingComponent::from_str(component),
                        path: source.path.clone(),
                    });
                    num_inputs += 1;
                }
            }

            for entry in set_bindings.pose.iter().chain(&set_bindings.haptics) {
                let Some(binding) = actions.get_mut(&entry.output) else {
                    warn!(
                        output = %entry.output,
                        "binding refers to an action missing from the action list"
                    );
                    continue;
                };
                binding.mode = BindingMode::None;
                binding.input_paths.push(BindingPath {
                    component: BindingComponent::None,
                    path: entry.path.clone(),
                });
                num_inputs += 1;
            }
        }

        Ok(Manifest {
            interaction_profile: bindings_doc.interaction_profile,
            actions,
            num_inputs,
        })
    }

    /// Load a manifest from two files on disk (typically the cache copies).
    pub fn from_files(actions_path: &Path, bindings_path: &Path) -> Result<Manifest> {
        let actions = fs::read_to_string(actions_path)?;
        let bindings = fs::read_to_string(bindings_path)?;
        Manifest::load(&actions, &bindings)
    }

    /// The interaction profile this manifest's bindings apply to.
    pub fn interaction_profile(&self) -> Option<&str> {
        self.interaction_profile.as_deref()
    }

    /// Look up the binding for an action name.
    pub fn binding(&self, action_name: &str) -> Option<&Binding> {
        self.actions.get(action_name)
    }

    pub fn bindings(&self) -> impl Iterator<Item = (&str, &Binding)> {
        self.actions.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Total number of input paths accumulated across all actions.
    pub fn num_inputs(&self) -> usize {
        self.num_inputs
    }
}

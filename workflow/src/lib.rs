use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::path::PathBuf;

pub mod io;
pub use io::{from_yaml, to_yaml, WORKFLOW_FORMAT_VERSION};

/// Display prefix carried by step names that hold derived results, as
/// opposed to root artifacts supplied from outside the graph.
pub const RESULT_PREFIX: &str = "Result of ";

/// Strips [`RESULT_PREFIX`] for dock titles and user-facing messages.
pub fn display_name(step_name: &str) -> &str {
    step_name.strip_prefix(RESULT_PREFIX).unwrap_or(step_name)
}

/// One argument of a step: either a literal value or a reference to
/// another step's result or a root artifact, addressed by name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum Argument {
    Reference(String),
    Number(f64),
    Bool(bool),
    Text(String),
    Path(PathBuf),
}

impl Argument {
    pub fn as_reference(&self) -> Option<&str> {
        match self {
            Argument::Reference(name) => Some(name.as_str()),
            _ => None,
        }
    }

    pub fn is_reference(&self) -> bool {
        matches!(self, Argument::Reference(_))
    }
}

/// A node of the workflow graph: one operation call producing one named
/// result. Arguments are positional and follow the operation's declared
/// parameter order. Steps are replaced wholesale, never edited in place.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Step {
    pub name: String,
    pub operation: String,
    pub arguments: Vec<Argument>,
}

#[derive(thiserror::Error, Debug)]
pub enum WorkflowError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("unsupported workflow format version: {0}")]
    UnsupportedVersion(String),
    #[error("duplicate step name: {0}")]
    DuplicateStep(String),
}

/// The workflow graph: a mapping from step name to [`Step`]. The
/// reference relation (arguments naming other steps or roots) must be
/// acyclic; [`Workflow::is_acyclic`] validates that outside the hot path.
///
/// The graph never owns the artifacts its steps name. Names with no
/// resolvable target in the external store are a normal transient state.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Workflow {
    steps: BTreeMap<String, Step>,
}

impl Workflow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_steps(steps: Vec<Step>) -> Result<Self, WorkflowError> {
        let mut workflow = Self::new();
        for step in steps {
            if workflow.steps.contains_key(&step.name) {
                return Err(WorkflowError::DuplicateStep(step.name));
            }
            workflow.steps.insert(step.name.clone(), step);
        }
        Ok(workflow)
    }

    /// Inserts or replaces a step under its own name.
    pub fn set_step(&mut self, step: Step) {
        self.steps.insert(step.name.clone(), step);
    }

    pub fn remove_step(&mut self, name: &str) -> Option<Step> {
        self.steps.remove(name)
    }

    pub fn step(&self, name: &str) -> Option<&Step> {
        self.steps.get(name)
    }

    pub fn contains_step(&self, name: &str) -> bool {
        self.steps.contains_key(name)
    }

    pub fn step_names(&self) -> impl Iterator<Item = &str> {
        self.steps.keys().map(String::as_str)
    }

    pub fn steps(&self) -> impl Iterator<Item = &Step> {
        self.steps.values()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Empties the graph. External artifacts and widgets are untouched;
    /// this is a pure data-structure reset used before a full reload.
    pub fn clear(&mut self) {
        self.steps.clear();
    }

    /// The subset of a step's arguments that reference other names, in
    /// argument order. Duplicates are preserved.
    pub fn sources_of(&self, name: &str) -> Vec<&str> {
        self.steps
            .get(name)
            .map(|step| {
                step.arguments
                    .iter()
                    .filter_map(Argument::as_reference)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Names of steps that reference `name` in their arguments.
    pub fn followers_of(&self, name: &str) -> Vec<String> {
        self.steps
            .values()
            .filter(|step| {
                step.arguments
                    .iter()
                    .any(|arg| arg.as_reference() == Some(name))
            })
            .map(|step| step.name.clone())
            .collect()
    }

    /// Names referenced as sources that are not themselves steps, i.e.
    /// external root artifacts.
    pub fn roots(&self) -> Vec<String> {
        let mut roots = BTreeSet::new();
        for step in self.steps.values() {
            for source in step.arguments.iter().filter_map(Argument::as_reference) {
                if !self.steps.contains_key(source) {
                    roots.insert(source.to_string());
                }
            }
        }
        roots.into_iter().collect()
    }

    /// Step names no other step references.
    pub fn leaves(&self) -> Vec<String> {
        let referenced: BTreeSet<&str> = self
            .steps
            .values()
            .flat_map(|step| step.arguments.iter().filter_map(Argument::as_reference))
            .collect();
        self.steps
            .keys()
            .filter(|name| !referenced.contains(name.as_str()))
            .cloned()
            .collect()
    }

    /// Steps whose source set is non-empty and contains only root names.
    /// These can be materialized directly against the external store.
    pub fn root_anchored_steps(&self) -> Vec<String> {
        self.steps
            .values()
            .filter(|step| {
                let sources: Vec<&str> = step
                    .arguments
                    .iter()
                    .filter_map(Argument::as_reference)
                    .collect();
                !sources.is_empty()
                    && sources.iter().all(|source| !self.steps.contains_key(*source))
            })
            .map(|step| step.name.clone())
            .collect()
    }

    /// True when both graphs hold the same set of step names, regardless
    /// of operations or argument values. This is the topology test the
    /// differ uses to choose between patching and a full reload.
    pub fn same_step_names(&self, other: &Workflow) -> bool {
        self.steps.len() == other.steps.len()
            && self.steps.keys().all(|name| other.steps.contains_key(name))
    }

    /// Kahn-style check that no step reaches itself through its sources.
    pub fn is_acyclic(&self) -> bool {
        let mut indegree: HashMap<&str, usize> =
            self.steps.keys().map(|name| (name.as_str(), 0)).collect();
        let mut edges: HashMap<&str, Vec<&str>> = HashMap::new();

        for step in self.steps.values() {
            for source in step.arguments.iter().filter_map(Argument::as_reference) {
                if self.steps.contains_key(source) {
                    edges.entry(source).or_default().push(step.name.as_str());
                    if let Some(count) = indegree.get_mut(step.name.as_str()) {
                        *count += 1;
                    }
                }
            }
        }

        let mut ready: VecDeque<&str> = indegree
            .iter()
            .filter(|(_, count)| **count == 0)
            .map(|(name, _)| *name)
            .collect();
        let mut visited = 0;
        while let Some(name) = ready.pop_front() {
            visited += 1;
            if let Some(children) = edges.get(name) {
                for child in children {
                    if let Some(count) = indegree.get_mut(child) {
                        *count -= 1;
                        if *count == 0 {
                            ready.push_back(child);
                        }
                    }
                }
            }
        }
        visited == self.steps.len()
    }
}

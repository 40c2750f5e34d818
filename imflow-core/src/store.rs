use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An externally owned, named unit of data produced or consumed by a
/// step. The payload is opaque to the core.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Artifact {
    pub name: String,
    pub data: Value,
}

impl Artifact {
    pub fn new(name: &str, data: Value) -> Self {
        Self {
            name: name.to_string(),
            data,
        }
    }
}

/// The live artifact container (the viewer's layer list). The core only
/// reads and writes by name; the store owns the artifacts and may be
/// edited by the user at any time.
pub trait ArtifactStore {
    fn exists(&self, name: &str) -> bool;
    fn get(&self, name: &str) -> Option<&Artifact>;
    /// Inserts or replaces by name.
    fn insert(&mut self, artifact: Artifact);
    fn remove(&mut self, name: &str) -> bool;
    fn names(&self) -> Vec<String>;

    fn is_empty(&self) -> bool {
        self.names().is_empty()
    }
}

/// Ordered in-memory store, for headless sessions and tests. Insertion
/// order is kept, matching how a viewer stacks its layers.
#[derive(Debug, Default)]
pub struct MemoryLayerList {
    artifacts: Vec<Artifact>,
}

impl MemoryLayerList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.artifacts.len()
    }
}

impl ArtifactStore for MemoryLayerList {
    fn exists(&self, name: &str) -> bool {
        self.artifacts.iter().any(|a| a.name == name)
    }

    fn get(&self, name: &str) -> Option<&Artifact> {
        self.artifacts.iter().find(|a| a.name == name)
    }

    fn insert(&mut self, artifact: Artifact) {
        match self.artifacts.iter_mut().find(|a| a.name == artifact.name) {
            Some(existing) => existing.data = artifact.data,
            None => self.artifacts.push(artifact),
        }
    }

    fn remove(&mut self, name: &str) -> bool {
        let before = self.artifacts.len();
        self.artifacts.retain(|a| a.name != name);
        self.artifacts.len() != before
    }

    fn names(&self) -> Vec<String> {
        self.artifacts.iter().map(|a| a.name.clone()).collect()
    }

    fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }
}

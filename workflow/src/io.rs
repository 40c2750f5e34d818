use crate::{Step, Workflow, WorkflowError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const WORKFLOW_FORMAT_VERSION: &str = "v1";

/// On-disk shape of a workflow: a version marker and a flat step list.
/// Step order in the file is not meaningful; dependency order is
/// recovered from the reference relation at load time.
#[derive(Debug, Serialize, Deserialize)]
struct WorkflowFile {
    version: String,
    steps: Vec<Step>,
}

pub fn to_yaml(workflow: &Workflow) -> Result<String, WorkflowError> {
    let file = WorkflowFile {
        version: WORKFLOW_FORMAT_VERSION.to_string(),
        steps: workflow.steps().cloned().collect(),
    };
    Ok(serde_yaml::to_string(&file)?)
}

pub fn from_yaml(text: &str) -> Result<Workflow, WorkflowError> {
    let file: WorkflowFile = serde_yaml::from_str(text)?;
    if file.version != WORKFLOW_FORMAT_VERSION {
        return Err(WorkflowError::UnsupportedVersion(file.version));
    }
    Workflow::from_steps(file.steps)
}

impl Workflow {
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), WorkflowError> {
        let text = to_yaml(self)?;
        fs::write(path, text)?;
        Ok(())
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, WorkflowError> {
        let text = fs::read_to_string(path)?;
        from_yaml(&text)
    }
}

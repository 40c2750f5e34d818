use std::collections::BTreeMap;
use workflow::Argument;

/// Closed set of recognized parameter categories. Classification happens
/// once, at operation registration, instead of matching on stringified
/// type annotations at call sites.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Integer,
    Float,
    Boolean,
    Text,
    Path,
    Artifact,
}

#[derive(Debug, Clone)]
pub struct ParamSpec {
    pub name: String,
    pub kind: ParamKind,
    pub default: Option<Argument>,
}

impl ParamSpec {
    pub fn new(name: &str, kind: ParamKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            default: None,
        }
    }

    pub fn with_default(mut self, default: Argument) -> Self {
        self.default = Some(default);
        self
    }
}

/// Declared call signature of a registered operation: ordered parameters
/// with kinds and defaults. The registry never holds the callable itself;
/// invocation is the widget host's business.
#[derive(Debug, Clone)]
pub struct OperationSpec {
    pub name: String,
    pub description: String,
    pub category: Option<String>,
    pub params: Vec<ParamSpec>,
}

impl OperationSpec {
    pub fn new(name: &str, params: Vec<ParamSpec>) -> Self {
        Self {
            name: name.to_string(),
            description: String::new(),
            category: None,
            params,
        }
    }

    pub fn with_category(mut self, category: &str) -> Self {
        self.category = Some(category.to_string());
        self
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    Image,
    Labels,
    Table,
}

/// A family of operations sharing input shape and widget behavior, e.g.
/// "Remove noise" or "Binarize".
#[derive(Debug, Clone)]
pub struct Category {
    pub name: String,
    pub description: String,
    pub input_count: usize,
    pub default_op: String,
    pub default_values: Vec<f64>,
    pub output: OutputKind,
    pub auto_call: bool,
}

impl Category {
    pub fn new(name: &str, input_count: usize, default_op: &str) -> Self {
        Self {
            name: name.to_string(),
            description: String::new(),
            input_count,
            default_op: default_op.to_string(),
            default_values: Vec::new(),
            output: OutputKind::Image,
            auto_call: true,
        }
    }
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum RegistryError {
    #[error("operation not found: {0}")]
    OperationNotFound(String),
}

/// Catalog of installed operations and categories. Built once at startup
/// from the installed operation providers and read-only afterwards;
/// components receive it by reference instead of consulting process
/// globals.
#[derive(Debug, Default)]
pub struct OperationRegistry {
    operations: BTreeMap<String, OperationSpec>,
    categories: BTreeMap<String, Category>,
}

impl OperationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_operation(&mut self, spec: OperationSpec) {
        self.operations.insert(spec.name.clone(), spec);
    }

    pub fn register_category(&mut self, category: Category) {
        self.categories.insert(category.name.clone(), category);
    }

    pub fn resolve(&self, name: &str) -> Option<&OperationSpec> {
        self.operations.get(name)
    }

    pub fn signature(&self, name: &str) -> Result<&[ParamSpec], RegistryError> {
        self.operations
            .get(name)
            .map(|spec| spec.params.as_slice())
            .ok_or_else(|| RegistryError::OperationNotFound(name.to_string()))
    }

    pub fn category_of(&self, operation: &str) -> Option<&Category> {
        let spec = self.operations.get(operation)?;
        self.categories.get(spec.category.as_deref()?)
    }

    pub fn category(&self, name: &str) -> Option<&Category> {
        self.categories.get(name)
    }

    pub fn operations_in_category(&self, category: &str) -> Vec<&str> {
        self.operations
            .values()
            .filter(|spec| spec.category.as_deref() == Some(category))
            .map(|spec| spec.name.as_str())
            .collect()
    }

    pub fn operation_names(&self) -> impl Iterator<Item = &str> {
        self.operations.keys().map(String::as_str)
    }
}

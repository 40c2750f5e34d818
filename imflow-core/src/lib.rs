pub mod adapter;
pub mod host;
pub mod loader;
pub mod patch;
pub mod registry;
pub mod session;
pub mod store;
pub mod undo;

pub use adapter::SlotAdapter;
pub use host::{DockId, HostError, WidgetBinding, WidgetHost, WidgetId};
pub use loader::{load_workflow, LoadOutcome, MaterializedStep, SELECT_INPUT_SUFFIX};
pub use registry::{
    Category, OperationRegistry, OperationSpec, OutputKind, ParamKind, ParamSpec, RegistryError,
};
pub use session::{AssistantSession, SessionError};
pub use store::{Artifact, ArtifactStore, MemoryLayerList};
pub use undo::UndoRedoController;

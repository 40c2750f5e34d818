use crate::store::ArtifactStore;
use workflow::Argument;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WidgetId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DockId(pub u64);

/// Runtime-only pairing of a step with its live control group and the
/// dock container hosting it. Never persisted; rebuilt by the loader on
/// every load, undo and redo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetBinding {
    pub step: String,
    pub widget: WidgetId,
    pub dock: DockId,
}

#[derive(thiserror::Error, Debug)]
pub enum HostError {
    #[error("operation {operation} failed: {reason}")]
    OperationFailed { operation: String, reason: String },
    #[error("unknown widget")]
    UnknownWidget,
}

/// Seam to the GUI toolkit. Widget invocation is synchronous: `invoke`
/// runs the bound operation to completion and writes the result artifact
/// into the store under the widget's result name.
///
/// With auto-call enabled, assigning a slot value may trigger the
/// widget's own recompute; the loader disables auto-call while wiring
/// multi-input widgets to avoid partial recomputation.
pub trait WidgetHost {
    fn create_widget(&mut self, operation: &str, result_name: &str, auto_call: bool) -> WidgetId;
    fn add_to_dock(&mut self, widget: WidgetId, display_name: &str) -> DockId;
    fn remove_from_dock(&mut self, dock: DockId);
    fn set_auto_call(&mut self, widget: WidgetId, enabled: bool);
    /// Pre-selects the artifact shown in an input drop-down. Does not
    /// trigger a recompute by itself.
    fn select_input(&mut self, widget: WidgetId, slot: &str, artifact: &str);
    fn set_slot_value(
        &mut self,
        widget: WidgetId,
        slot: &str,
        value: &Argument,
        store: &mut dyn ArtifactStore,
    ) -> Result<(), HostError>;
    fn invoke(&mut self, widget: WidgetId, store: &mut dyn ArtifactStore)
        -> Result<(), HostError>;
    /// Dimensionality of the data currently displayed by the viewer.
    fn display_rank(&self) -> usize;
}

use workflow::Workflow;

/// Linear undo/redo history over whole-graph snapshots. `record` pushes
/// the graph as it was before a change and clears the redo stack; while
/// `freeze` is set, recording is a no-op so that replaying history does
/// not record itself as a new action.
#[derive(Debug, Default)]
pub struct UndoRedoController {
    undo_stack: Vec<Workflow>,
    redo_stack: Vec<Workflow>,
    pub freeze: bool,
}

impl UndoRedoController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, snapshot: Workflow) {
        if self.freeze {
            return;
        }
        self.undo_stack.push(snapshot);
        self.redo_stack.clear();
    }

    /// Pops the most recent snapshot; the graph as it is now goes onto
    /// the redo stack. Returns `None` on an empty stack (safe no-op).
    pub fn undo(&mut self, current: &Workflow) -> Option<Workflow> {
        let snapshot = self.undo_stack.pop()?;
        self.redo_stack.push(current.clone());
        Some(snapshot)
    }

    pub fn redo(&mut self, current: &Workflow) -> Option<Workflow> {
        let snapshot = self.redo_stack.pop()?;
        self.undo_stack.push(current.clone());
        Some(snapshot)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}

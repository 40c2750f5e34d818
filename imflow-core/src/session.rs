use crate::host::{DockId, WidgetBinding, WidgetHost, WidgetId};
use crate::loader::{load_workflow, LoadOutcome};
use crate::patch::transition_to;
use crate::registry::OperationRegistry;
use crate::store::ArtifactStore;
use crate::undo::UndoRedoController;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::path::Path;
use workflow::{Step, Workflow, WorkflowError};

/// Undo and redo are gated to data of at most this display rank.
pub const MAX_UNDO_RANK: usize = 3;

#[derive(thiserror::Error, Debug)]
pub enum SessionError {
    #[error("not supported for rank-{0} data")]
    UnsupportedRank(usize),
    #[error("no artifacts open; open an image before loading a workflow")]
    EmptyStore,
    #[error("workflow references itself; refusing to load")]
    CyclicWorkflow,
    #[error(transparent)]
    Workflow(#[from] WorkflowError),
}

/// One assistant session: the authoritative workflow graph, the binding
/// table pairing steps with their live widgets, the subscription table
/// driving recompute propagation, and the undo/redo history. Everything
/// runs on the single UI event thread; the controller's `freeze` flag is
/// the only reentrancy guard and exists solely to keep replaying history
/// from recording itself.
pub struct AssistantSession<S: ArtifactStore, H: WidgetHost> {
    pub workflow: Workflow,
    pub registry: OperationRegistry,
    pub store: S,
    pub host: H,
    pub undo_redo: UndoRedoController,
    bindings: BTreeMap<String, WidgetBinding>,
    // source artifact name -> steps to recompute when its data changes
    subscriptions: BTreeMap<String, BTreeSet<String>>,
}

impl<S: ArtifactStore, H: WidgetHost> AssistantSession<S, H> {
    pub fn new(registry: OperationRegistry, store: S, host: H) -> Self {
        Self {
            workflow: Workflow::new(),
            registry,
            store,
            host,
            undo_redo: UndoRedoController::new(),
            bindings: BTreeMap::new(),
            subscriptions: BTreeMap::new(),
        }
    }

    pub fn bindings(&self) -> &BTreeMap<String, WidgetBinding> {
        &self.bindings
    }

    pub fn binding_for(&self, step: &str) -> Option<&WidgetBinding> {
        self.bindings.get(step)
    }

    /// Records a step produced by a live widget: snapshots the graph for
    /// undo, replaces the step wholesale and refreshes its binding and
    /// source subscriptions. Called by the widget layer whenever an
    /// invocation succeeds.
    pub fn record_step(&mut self, step: Step, widget: WidgetId, dock: DockId) {
        self.undo_redo.record(self.workflow.clone());
        self.bindings.insert(
            step.name.clone(),
            WidgetBinding {
                step: step.name.clone(),
                widget,
                dock,
            },
        );
        self.resubscribe(&step);
        self.workflow.set_step(step);
    }

    /// Reacts to an artifact disappearing from the store: the step that
    /// produced it (if any) is dropped along with its widget, binding
    /// and subscriptions.
    pub fn artifact_removed(&mut self, name: &str) {
        if !self.workflow.contains_step(name) {
            return;
        }
        self.undo_redo.record(self.workflow.clone());
        self.workflow.remove_step(name);
        if let Some(binding) = self.bindings.remove(name) {
            self.host.remove_from_dock(binding.dock);
        }
        self.unsubscribe(name);
        self.subscriptions.remove(name);
    }

    /// Recomputes every step that transitively consumes `name`, each one
    /// only after all of its own affected sources. A step fed by both the
    /// changed artifact and a deeper derived result therefore runs once,
    /// against refreshed inputs. Steps with missing sources or no live
    /// widget are skipped with a warning, and their followers only run if
    /// some other source of theirs actually changed.
    pub fn artifact_data_changed(&mut self, name: &str) {
        let mut dirty: BTreeSet<String> = BTreeSet::new();
        let mut frontier: VecDeque<String> = VecDeque::from([name.to_string()]);
        while let Some(source) = frontier.pop_front() {
            if let Some(steps) = self.subscriptions.get(&source) {
                for step_name in steps {
                    if dirty.insert(step_name.clone()) {
                        frontier.push_back(step_name.clone());
                    }
                }
            }
        }

        let mut pending: Vec<String> = dirty.iter().cloned().collect();
        let mut processed: BTreeSet<String> = BTreeSet::new();
        let mut changed: BTreeSet<String> = BTreeSet::from([name.to_string()]);
        while !pending.is_empty() {
            let mut deferred = Vec::new();
            let mut progressed = false;
            for step_name in pending {
                let waits_on_dirty_source = self
                    .workflow
                    .sources_of(&step_name)
                    .iter()
                    .any(|source| dirty.contains(*source) && !processed.contains(*source));
                if waits_on_dirty_source {
                    deferred.push(step_name);
                    continue;
                }
                progressed = true;
                processed.insert(step_name.clone());
                let source_changed = self
                    .workflow
                    .sources_of(&step_name)
                    .iter()
                    .any(|source| changed.contains(*source));
                if source_changed && self.recompute_step(&step_name) {
                    changed.insert(step_name);
                }
            }
            if !progressed {
                // only reachable through a cycle, which loading rejects
                log::warn!(
                    "recompute propagation stalled; {} step(s) left stale",
                    deferred.len()
                );
                return;
            }
            pending = deferred;
        }
    }

    fn recompute_step(&mut self, step_name: &str) -> bool {
        let Some(widget) = self.bindings.get(step_name).map(|b| b.widget) else {
            log::warn!("no live widget for step {step_name}, not recomputed");
            return false;
        };
        let sources_present = self
            .workflow
            .sources_of(step_name)
            .iter()
            .all(|source| self.store.exists(source));
        if !sources_present {
            log::warn!("step {step_name} has missing sources, not recomputed");
            return false;
        }
        if let Err(err) = self.host.invoke(widget, &mut self.store) {
            log::warn!("step {step_name}: recompute failed: {err}");
            return false;
        }
        true
    }

    /// Loads a serialized workflow against the current store, building
    /// widgets for every step in dependency order. When anything
    /// materializes, the previous graph state is recorded for undo and
    /// the loaded steps merge into the session graph; a load that
    /// resolves nothing leaves the history untouched.
    pub fn load_workflow_file<P: AsRef<Path>>(
        &mut self,
        path: P,
    ) -> Result<LoadOutcome, SessionError> {
        if self.store.is_empty() {
            return Err(SessionError::EmptyStore);
        }
        let target = Workflow::load_from_file(path)?;
        if !target.is_acyclic() {
            return Err(SessionError::CyclicWorkflow);
        }

        let previous = self.workflow.clone();
        let outcome = load_workflow(
            &target,
            &self.registry,
            &mut self.store as &mut dyn ArtifactStore,
            &mut self.host as &mut dyn WidgetHost,
        );
        if !outcome.materialized.is_empty() {
            self.undo_redo.record(previous);
        }
        for materialized in &outcome.materialized {
            self.bindings.insert(
                materialized.step.clone(),
                WidgetBinding {
                    step: materialized.step.clone(),
                    widget: materialized.widget,
                    dock: materialized.dock,
                },
            );
            if let Some(step) = target.step(&materialized.step) {
                self.resubscribe(step);
                self.workflow.set_step(step.clone());
            }
        }
        Ok(outcome)
    }

    pub fn save_workflow_file<P: AsRef<Path>>(&self, path: P) -> Result<(), SessionError> {
        self.workflow.save_to_file(path)?;
        Ok(())
    }

    /// Restores the previous graph snapshot. Rejected before any stack
    /// manipulation when the displayed data has more than
    /// [`MAX_UNDO_RANK`] dimensions; an empty undo stack is a no-op.
    pub fn undo(&mut self) -> Result<bool, SessionError> {
        self.guard_rank()?;
        let current = self.workflow.clone();
        let Some(target) = self.undo_redo.undo(&current) else {
            return Ok(false);
        };
        self.apply_snapshot(target);
        Ok(true)
    }

    pub fn redo(&mut self) -> Result<bool, SessionError> {
        self.guard_rank()?;
        let current = self.workflow.clone();
        let Some(target) = self.undo_redo.redo(&current) else {
            return Ok(false);
        };
        self.apply_snapshot(target);
        Ok(true)
    }

    fn guard_rank(&self) -> Result<(), SessionError> {
        let rank = self.host.display_rank();
        if rank > MAX_UNDO_RANK {
            return Err(SessionError::UnsupportedRank(rank));
        }
        Ok(())
    }

    fn apply_snapshot(&mut self, target: Workflow) {
        self.undo_redo.freeze = true;
        transition_to(
            &mut self.workflow,
            &target,
            &self.registry,
            &mut self.store as &mut dyn ArtifactStore,
            &mut self.host as &mut dyn WidgetHost,
            &mut self.bindings,
        );
        self.undo_redo.freeze = false;
        self.rebuild_subscriptions();
    }

    /// Replaces a step's subscription entries with its current source
    /// set. Safe to call repeatedly; a step never triggers twice for the
    /// same source.
    fn resubscribe(&mut self, step: &Step) {
        self.unsubscribe(&step.name);
        for source in step.arguments.iter().filter_map(workflow::Argument::as_reference) {
            self.subscriptions
                .entry(source.to_string())
                .or_default()
                .insert(step.name.clone());
        }
    }

    fn unsubscribe(&mut self, step_name: &str) {
        for steps in self.subscriptions.values_mut() {
            steps.remove(step_name);
        }
        self.subscriptions.retain(|_, steps| !steps.is_empty());
    }

    fn rebuild_subscriptions(&mut self) {
        self.subscriptions.clear();
        let steps: Vec<Step> = self.workflow.steps().cloned().collect();
        for step in &steps {
            self.resubscribe(step);
        }
    }
}

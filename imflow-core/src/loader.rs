use crate::adapter::{slot_values_for_step, source_wiring_for_step};
use crate::host::{DockId, WidgetHost, WidgetId};
use crate::registry::OperationRegistry;
use crate::store::ArtifactStore;
use std::collections::{BTreeSet, VecDeque};
use workflow::{display_name, Workflow};

/// Dock title suffix for a root widget whose input artifacts are not in
/// the store yet; the user completes the wiring by hand.
pub const SELECT_INPUT_SUFFIX: &str = " - SELECT INPUT";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterializedStep {
    pub step: String,
    pub widget: WidgetId,
    pub dock: DockId,
}

/// Result of a load: widgets in the order they were built, plus the
/// steps whose sources never resolved. Unresolved steps get no widget
/// and no artifact; the load itself is not an error.
#[derive(Debug, Default)]
pub struct LoadOutcome {
    pub materialized: Vec<MaterializedStep>,
    pub unresolved: Vec<String>,
}

/// Materializes widgets for every step of `target` against the live
/// store, root-anchored steps first, then a breadth-first expansion of
/// their followers. Dependency order is discovered by retrying steps
/// whose inputs are not materialized yet; no precomputed topological
/// order is assumed.
pub fn load_workflow(
    target: &Workflow,
    registry: &OperationRegistry,
    store: &mut dyn ArtifactStore,
    host: &mut dyn WidgetHost,
) -> LoadOutcome {
    let mut outcome = LoadOutcome::default();
    initialise_root_steps(target, registry, store, host, &mut outcome);
    load_remaining_workflow(target, registry, store, host, &mut outcome);
    outcome
}

/// Phase one: steps whose inputs are all external root artifacts. When
/// every referenced root is present the widget is wired, its parameters
/// set, and it is invoked once; otherwise it is docked with a
/// select-input marker and left for the user.
pub fn initialise_root_steps(
    target: &Workflow,
    registry: &OperationRegistry,
    store: &mut dyn ArtifactStore,
    host: &mut dyn WidgetHost,
    outcome: &mut LoadOutcome,
) {
    for name in target.root_anchored_steps() {
        let sources_present = target
            .sources_of(&name)
            .iter()
            .all(|source| store.exists(source));
        build_step_widget(target, registry, store, host, &name, sources_present, outcome);
    }
}

/// Phase two: frontier expansion from the followers of the root pass.
/// A follower with missing sources is requeued at the back; since the
/// graph is acyclic the set of resolvable steps grows each full pass.
/// When a whole cycle over the worklist materializes nothing, the
/// leftovers are reported as unresolved instead of spinning.
pub fn load_remaining_workflow(
    target: &Workflow,
    registry: &OperationRegistry,
    store: &mut dyn ArtifactStore,
    host: &mut dyn WidgetHost,
    outcome: &mut LoadOutcome,
) {
    let mut done: BTreeSet<String> = outcome
        .materialized
        .iter()
        .map(|m| m.step.clone())
        .collect();
    for skipped in &outcome.unresolved {
        done.insert(skipped.clone());
    }

    let mut queue: VecDeque<String> = VecDeque::new();
    for root_step in target.root_anchored_steps() {
        for follower in target.followers_of(&root_step) {
            if !done.contains(&follower) && !queue.contains(&follower) {
                queue.push_back(follower);
            }
        }
    }

    let mut stalled = 0usize;
    while let Some(name) = queue.pop_front() {
        if done.contains(&name) {
            continue;
        }
        let sources_present = target
            .sources_of(&name)
            .iter()
            .all(|source| store.exists(source));
        if !sources_present {
            if stalled >= queue.len() + 1 {
                log::warn!(
                    "workflow load stalled; {} step(s) have unresolvable sources",
                    queue.len() + 1
                );
                outcome.unresolved.push(name);
                while let Some(left) = queue.pop_front() {
                    if !done.contains(&left) && !outcome.unresolved.contains(&left) {
                        outcome.unresolved.push(left);
                    }
                }
                return;
            }
            stalled += 1;
            queue.push_back(name);
            continue;
        }

        stalled = 0;
        let built = build_step_widget(target, registry, store, host, &name, true, outcome);
        done.insert(name.clone());
        if built {
            for follower in target.followers_of(&name) {
                if !done.contains(&follower) && !queue.contains(&follower) {
                    queue.push_back(follower);
                }
            }
        }
    }
}

/// Builds, wires and (when its sources are present) invokes the widget
/// for one step. Returns false when the step had to be skipped.
fn build_step_widget(
    target: &Workflow,
    registry: &OperationRegistry,
    store: &mut dyn ArtifactStore,
    host: &mut dyn WidgetHost,
    name: &str,
    sources_present: bool,
    outcome: &mut LoadOutcome,
) -> bool {
    let Some(step) = target.step(name) else {
        return false;
    };
    let Some(spec) = registry.resolve(&step.operation) else {
        log::warn!("operation not found: {}, skipping step {}", step.operation, name);
        outcome.unresolved.push(name.to_string());
        return false;
    };

    let distinct_sources: BTreeSet<&str> = target.sources_of(name).into_iter().collect();
    let category_auto_call = registry
        .category_of(&step.operation)
        .map(|c| c.auto_call)
        .unwrap_or(true);
    // Multi-input widgets must not recompute while their inputs are
    // still being wired one by one.
    let multi_input = distinct_sources.len() > 1;
    let auto_call = !multi_input && category_auto_call;

    let widget = host.create_widget(&step.operation, name, auto_call);
    let title = if sources_present {
        display_name(name).to_string()
    } else {
        format!("{}{}", display_name(name), SELECT_INPUT_SUFFIX)
    };
    let dock = host.add_to_dock(widget, &title);

    if sources_present {
        for (slot, artifact) in source_wiring_for_step(step, spec) {
            host.select_input(widget, &slot, &artifact);
        }
    }
    for (slot, value) in slot_values_for_step(step, spec) {
        if let Err(err) = host.set_slot_value(widget, &slot, &value, store) {
            log::warn!("step {name}: failed to set {slot}: {err}");
        }
    }
    if sources_present {
        if let Err(err) = host.invoke(widget, store) {
            log::warn!("step {name}: invocation failed: {err}");
        }
        if multi_input {
            host.set_auto_call(widget, category_auto_call);
        }
    }

    outcome.materialized.push(MaterializedStep {
        step: name.to_string(),
        widget,
        dock,
    });
    true
}

#![allow(dead_code)]

use imflow_core::{
    Artifact, ArtifactStore, Category, DockId, HostError, MemoryLayerList, OperationRegistry,
    OperationSpec, OutputKind, ParamKind, ParamSpec, WidgetHost, WidgetId,
};
use serde_json::json;
use std::collections::BTreeMap;
use workflow::{Argument, Step};

pub fn step(name: &str, operation: &str, arguments: Vec<Argument>) -> Step {
    Step {
        name: name.to_string(),
        operation: operation.to_string(),
        arguments,
    }
}

pub fn reference(name: &str) -> Argument {
    Argument::Reference(name.to_string())
}

pub fn number(value: f64) -> Argument {
    Argument::Number(value)
}

/// Registry with a handful of operations shaped like the real catalog:
/// a one-input filter, a one-input binarization, a two-input combiner
/// and a two-input measurement whose category disables auto-call.
pub fn test_registry() -> OperationRegistry {
    let mut registry = OperationRegistry::new();

    let mut noise = Category::new("Remove noise", 1, "gaussian_blur");
    noise.description = "Low-pass filters".to_string();
    noise.default_values = vec![1.0, 1.0, 0.0];
    registry.register_category(noise);
    let mut binarize = Category::new("Binarize", 1, "threshold_otsu");
    binarize.output = OutputKind::Labels;
    registry.register_category(binarize);
    registry.register_category(Category::new("Image math", 2, "add_images"));
    let mut measurement = Category::new("Measurement", 2, "label_stats");
    measurement.description = "Quantify labelled regions".to_string();
    measurement.output = OutputKind::Table;
    measurement.auto_call = false;
    registry.register_category(measurement);

    registry.register_operation(
        OperationSpec::new(
            "gaussian_blur",
            vec![
                ParamSpec::new("image", ParamKind::Artifact),
                ParamSpec::new("sigma_x", ParamKind::Float).with_default(number(1.0)),
                ParamSpec::new("sigma_y", ParamKind::Float).with_default(number(1.0)),
                ParamSpec::new("sigma_z", ParamKind::Float).with_default(number(0.0)),
            ],
        )
        .with_description("Gaussian low-pass filter")
        .with_category("Remove noise"),
    );
    registry.register_operation(
        OperationSpec::new(
            "threshold_otsu",
            vec![ParamSpec::new("image", ParamKind::Artifact)],
        )
        .with_category("Binarize"),
    );
    registry.register_operation(
        OperationSpec::new(
            "add_images",
            vec![
                ParamSpec::new("image1", ParamKind::Artifact),
                ParamSpec::new("image2", ParamKind::Artifact),
                ParamSpec::new("factor1", ParamKind::Float).with_default(number(1.0)),
                ParamSpec::new("factor2", ParamKind::Float).with_default(number(1.0)),
            ],
        )
        .with_category("Image math"),
    );
    registry.register_operation(
        OperationSpec::new(
            "label_stats",
            vec![
                ParamSpec::new("image", ParamKind::Artifact),
                ParamSpec::new("labels", ParamKind::Artifact),
            ],
        )
        .with_category("Measurement"),
    );

    registry
}

pub fn store_with(names: &[&str]) -> MemoryLayerList {
    let mut store = MemoryLayerList::new();
    for name in names {
        store.insert(Artifact::new(name, json!({"pixels": name})));
    }
    store
}

#[derive(Debug)]
pub struct MockWidget {
    pub operation: String,
    pub result_name: String,
    pub auto_call: bool,
    pub inputs: BTreeMap<String, String>,
    pub values: BTreeMap<String, Argument>,
    pub invocations: usize,
}

#[derive(Debug)]
pub struct MockDock {
    pub title: String,
    pub open: bool,
}

/// Scripted widget host: `invoke` "computes" a result by folding the
/// operation name, the data of the selected inputs and the current slot
/// values into a json payload stored under the widget's result name.
#[derive(Debug, Default)]
pub struct MockHost {
    pub widgets: Vec<MockWidget>,
    pub docks: Vec<MockDock>,
    pub rank: usize,
}

impl MockHost {
    pub fn new() -> Self {
        Self {
            widgets: Vec::new(),
            docks: Vec::new(),
            rank: 2,
        }
    }

    pub fn widget(&self, id: WidgetId) -> &MockWidget {
        &self.widgets[id.0 as usize]
    }

    pub fn open_docks(&self) -> Vec<&MockDock> {
        self.docks.iter().filter(|d| d.open).collect()
    }

    pub fn total_invocations(&self) -> usize {
        self.widgets.iter().map(|w| w.invocations).sum()
    }

    fn compute(widget: &mut MockWidget, store: &mut dyn ArtifactStore) -> Result<(), HostError> {
        let mut inputs = serde_json::Map::new();
        for (slot, artifact) in &widget.inputs {
            let data = store
                .get(artifact)
                .map(|a| a.data.clone())
                .ok_or_else(|| HostError::OperationFailed {
                    operation: widget.operation.clone(),
                    reason: format!("missing input {artifact}"),
                })?;
            inputs.insert(slot.clone(), data);
        }
        let values: BTreeMap<&String, serde_json::Value> = widget
            .values
            .iter()
            .map(|(slot, value)| (slot, serde_json::to_value(value).unwrap_or_default()))
            .collect();
        let data = json!({
            "operation": widget.operation,
            "inputs": inputs,
            "values": values,
        });
        widget.invocations += 1;
        store.insert(Artifact::new(&widget.result_name, data));
        Ok(())
    }
}

impl WidgetHost for MockHost {
    fn create_widget(&mut self, operation: &str, result_name: &str, auto_call: bool) -> WidgetId {
        self.widgets.push(MockWidget {
            operation: operation.to_string(),
            result_name: result_name.to_string(),
            auto_call,
            inputs: BTreeMap::new(),
            values: BTreeMap::new(),
            invocations: 0,
        });
        WidgetId(self.widgets.len() as u64 - 1)
    }

    fn add_to_dock(&mut self, _widget: WidgetId, display_name: &str) -> DockId {
        self.docks.push(MockDock {
            title: display_name.to_string(),
            open: true,
        });
        DockId(self.docks.len() as u64 - 1)
    }

    fn remove_from_dock(&mut self, dock: DockId) {
        if let Some(dock) = self.docks.get_mut(dock.0 as usize) {
            dock.open = false;
        }
    }

    fn set_auto_call(&mut self, widget: WidgetId, enabled: bool) {
        self.widgets[widget.0 as usize].auto_call = enabled;
    }

    fn select_input(&mut self, widget: WidgetId, slot: &str, artifact: &str) {
        self.widgets[widget.0 as usize]
            .inputs
            .insert(slot.to_string(), artifact.to_string());
    }

    fn set_slot_value(
        &mut self,
        widget: WidgetId,
        slot: &str,
        value: &Argument,
        store: &mut dyn ArtifactStore,
    ) -> Result<(), HostError> {
        let widget = &mut self.widgets[widget.0 as usize];
        widget.values.insert(slot.to_string(), value.clone());
        // with auto-call on, assignment triggers the widget's recompute
        let wired = !widget.inputs.is_empty()
            && widget.inputs.values().all(|artifact| store.exists(artifact));
        if widget.auto_call && wired {
            Self::compute(widget, store)?;
        }
        Ok(())
    }

    fn invoke(
        &mut self,
        widget: WidgetId,
        store: &mut dyn ArtifactStore,
    ) -> Result<(), HostError> {
        Self::compute(&mut self.widgets[widget.0 as usize], store)
    }

    fn display_rank(&self) -> usize {
        self.rank
    }
}

use crate::registry::{OperationSpec, ParamKind};
use std::collections::HashMap;
use workflow::{Argument, Step};

// Generic slot vocabulary exposed by the widget layer. Pool sizes are a
// hard capacity limit: operations declaring more parameters of one
// category than slots exist have the excess dropped from the UI.
pub const NUMERIC_SLOTS: [&str; 10] = ["x", "y", "z", "u", "v", "w", "w1", "w2", "w3", "w4"];
pub const BOOL_SLOTS: [&str; 10] = ["a", "b", "c", "d", "e", "f", "g", "h", "i", "j"];
pub const TEXT_SLOTS: [&str; 3] = ["k", "l", "m"];
pub const PATH_SLOTS: [&str; 3] = ["o", "p", "q"];

/// Name of the n-th artifact input slot. Artifact slots are unbounded.
pub fn artifact_slot(index: usize) -> String {
    format!("input{index}")
}

/// Two-way mapping between an operation's natural parameter names and
/// the generic slot names, assigned in declaration order per category.
/// Pure function of the signature; cheap to rebuild on demand.
#[derive(Debug, Default)]
pub struct SlotAdapter {
    to_slot: HashMap<String, String>,
    to_param: HashMap<String, String>,
}

impl SlotAdapter {
    pub fn for_operation(spec: &OperationSpec) -> Self {
        let mut adapter = SlotAdapter::default();
        let mut numeric = 0;
        let mut boolean = 0;
        let mut text = 0;
        let mut path = 0;
        let mut artifact = 0;

        for param in &spec.params {
            let slot = match param.kind {
                ParamKind::Integer | ParamKind::Float => next(&NUMERIC_SLOTS, &mut numeric),
                ParamKind::Boolean => next(&BOOL_SLOTS, &mut boolean),
                ParamKind::Text => next(&TEXT_SLOTS, &mut text),
                ParamKind::Path => next(&PATH_SLOTS, &mut path),
                ParamKind::Artifact => {
                    let slot = artifact_slot(artifact);
                    artifact += 1;
                    Some(slot)
                }
            };
            match slot {
                Some(slot) => adapter.bind(&param.name, &slot),
                None => {
                    log::debug!(
                        "operation {}: no free slot for parameter {}, dropped from the UI",
                        spec.name,
                        param.name
                    );
                }
            }
        }
        adapter
    }

    fn bind(&mut self, param: &str, slot: &str) {
        self.to_slot.insert(param.to_string(), slot.to_string());
        self.to_param.insert(slot.to_string(), param.to_string());
    }

    pub fn slot_for(&self, param: &str) -> Option<&str> {
        self.to_slot.get(param).map(String::as_str)
    }

    pub fn param_for(&self, slot: &str) -> Option<&str> {
        self.to_param.get(slot).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.to_slot.len()
    }

    pub fn is_empty(&self) -> bool {
        self.to_slot.is_empty()
    }
}

fn next(pool: &[&str], counter: &mut usize) -> Option<String> {
    let slot = pool.get(*counter).map(|s| s.to_string());
    if slot.is_some() {
        *counter += 1;
    }
    slot
}

/// Translates a step's literal arguments into `(slot, value)` pairs.
/// Reference arguments are input wiring, not parameter values, and are
/// left out.
pub fn slot_values_for_step(step: &Step, spec: &OperationSpec) -> Vec<(String, Argument)> {
    let adapter = SlotAdapter::for_operation(spec);
    let mut values = Vec::new();
    for (param, arg) in spec.params.iter().zip(&step.arguments) {
        if arg.is_reference() {
            continue;
        }
        if let Some(slot) = adapter.slot_for(&param.name) {
            values.push((slot.to_string(), arg.clone()));
        }
    }
    values
}

/// Pairs each artifact-kind parameter with the reference argument it
/// consumes, in declaration order: `(input slot, artifact name)`.
pub fn source_wiring_for_step(step: &Step, spec: &OperationSpec) -> Vec<(String, String)> {
    let mut wiring = Vec::new();
    let mut index = 0;
    for (param, arg) in spec.params.iter().zip(&step.arguments) {
        if param.kind != ParamKind::Artifact {
            continue;
        }
        match arg.as_reference() {
            Some(name) => wiring.push((artifact_slot(index), name.to_string())),
            None => {
                log::debug!(
                    "step {}: artifact parameter {} bound to a literal, skipped",
                    step.name,
                    param.name
                );
            }
        }
        index += 1;
    }
    wiring
}

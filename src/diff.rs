//! Original-vs-current differential tracking.
//!
//! Each element can capture a baseline snapshot of its serializable fields;
//! the differential of a whole definition is derived from these baselines at
//! serialization time and never stored.

use serde_json::{Map, Value};

use crate::types::ElementDefinition;

/// Fields always present in a diff so the element stays addressable.
const SKELETAL_FIELDS: &[&str] = &["id", "path", "sliceName"];

impl ElementDefinition {
    /// Snapshot all currently-serializable fields as the comparison baseline.
    pub fn capture_original(&mut self) {
        self.original = Some(self.to_wire());
    }

    /// Reset the baseline to empty, forcing full re-inclusion on next diff.
    pub fn clear_original(&mut self) {
        self.original = None;
    }

    /// Fields whose current value differs from the baseline, plus the
    /// skeletal identifying fields. A field removed since the baseline
    /// appears as `null`.
    pub fn diff(&self) -> Map<String, Value> {
        let current = self.to_wire();
        let empty = Map::new();
        let baseline = self.original.as_ref().unwrap_or(&empty);

        let mut out = Map::new();
        for (key, value) in &current {
            let skeletal = SKELETAL_FIELDS.contains(&key.as_str());
            if skeletal || baseline.get(key) != Some(value) {
                out.insert(key.clone(), value.clone());
            }
        }
        for key in baseline.keys() {
            if !current.contains_key(key) {
                out.insert(key.clone(), Value::Null);
            }
        }
        out
    }

    /// Whether the diff carries anything beyond the skeletal fields.
    pub fn has_diff(&self) -> bool {
        self.diff()
            .keys()
            .any(|key| !SKELETAL_FIELDS.contains(&key.as_str()))
    }
}

//! The structure container: an ordered element tree with identity metadata,
//! nesting-invariant insertion and wire (de)serialization.
//!
//! Parent/child structure is implicit in element ids: a node's id is a
//! `.`/`:`-delimited prefix of everything nesting under it, and each subtree
//! is contiguous. An id-to-position index avoids rescanning on lookup.

use std::collections::{HashMap, HashSet};

use serde_json::{Map, Value, json};

use crate::error::{FhirShapeError, Result};
use crate::types::element::{ElementDefinition, validate_id};

/// A structure definition under construction: identity plus the ordered
/// element arena.
#[derive(Debug, Clone)]
pub struct StructureDefinition {
    pub id: Option<String>,
    pub url: String,
    pub version: Option<String>,
    pub name: String,
    pub status: String,
    /// resource | complex-type | primitive-type | logical
    pub kind: String,
    pub abstract_type: Option<bool>,
    /// Structural type this definition constrains or specializes
    pub type_name: String,
    pub base_definition: Option<String>,
    /// specialization | constraint
    pub derivation: Option<String>,

    elements: Vec<ElementDefinition>,
    index: HashMap<String, usize>,
    unfolded: HashSet<String>,
}

impl StructureDefinition {
    /// A fresh definition holding only its root element.
    pub fn new(type_name: &str, url: &str, name: &str) -> Self {
        let root = ElementDefinition::root(type_name);
        let mut index = HashMap::new();
        index.insert(root.id.clone(), 0);
        Self {
            id: None,
            url: url.to_string(),
            version: None,
            name: name.to_string(),
            status: "active".to_string(),
            kind: "resource".to_string(),
            abstract_type: None,
            type_name: type_name.to_string(),
            base_definition: None,
            derivation: None,
            elements: vec![root],
            index,
            unfolded: HashSet::new(),
        }
    }

    pub fn elements(&self) -> &[ElementDefinition] {
        &self.elements
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn element_at(&self, position: usize) -> &ElementDefinition {
        &self.elements[position]
    }

    pub fn element_at_mut(&mut self, position: usize) -> &mut ElementDefinition {
        &mut self.elements[position]
    }

    pub fn position_of(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn find_element(&self, id: &str) -> Option<&ElementDefinition> {
        self.position_of(id).map(|i| &self.elements[i])
    }

    pub fn find_element_mut(&mut self, id: &str) -> Option<&mut ElementDefinition> {
        let position = self.position_of(id)?;
        Some(&mut self.elements[position])
    }

    /// Whether `id` structurally nests under `ancestor` (child or slice).
    pub fn is_descendant(id: &str, ancestor: &str) -> bool {
        id.len() > ancestor.len()
            && id.starts_with(ancestor)
            && matches!(id.as_bytes()[ancestor.len()], b'.' | b':')
    }

    /// Position of the nearest existing ancestor of `id`, if any.
    pub fn nearest_ancestor(&self, id: &str) -> Option<usize> {
        let mut candidate = id;
        loop {
            let cut = candidate.rfind(['.', ':'])?;
            candidate = &candidate[..cut];
            if let Some(&position) = self.index.get(candidate) {
                return Some(position);
            }
        }
    }

    pub fn parent_of(&self, position: usize) -> Option<usize> {
        self.nearest_ancestor(&self.elements[position].id)
    }

    /// Positions of every element nesting under `position`, in order.
    pub fn descendants_of(&self, position: usize) -> Vec<usize> {
        let ancestor = &self.elements[position].id;
        let mut out = Vec::new();
        // Subtrees are contiguous; the first non-descendant ends the scan.
        for (i, e) in self.elements.iter().enumerate().skip(position + 1) {
            if Self::is_descendant(&e.id, ancestor) {
                out.push(i);
            } else {
                break;
            }
        }
        out
    }

    /// Insert an element at the position that preserves the nesting
    /// invariant: scan forward from its nearest ancestor while the scanned id
    /// still nests under that ancestor, stop at the first that does not.
    pub fn add_element(&mut self, element: ElementDefinition) -> Result<usize> {
        validate_id(&element.id)?;
        if self.index.contains_key(&element.id) {
            return Err(FhirShapeError::invalid_id(format!(
                "{} already exists",
                element.id
            )));
        }
        let anchor = self
            .nearest_ancestor(&element.id)
            .ok_or_else(|| FhirShapeError::invalid_id(format!("{} has no parent", element.id)))?;
        let ancestor_id = self.elements[anchor].id.clone();
        let mut position = anchor + 1;
        while position < self.elements.len()
            && Self::is_descendant(&self.elements[position].id, &ancestor_id)
        {
            position += 1;
        }
        self.elements.insert(position, element);
        self.reindex_from(position);
        Ok(position)
    }

    fn reindex_from(&mut self, position: usize) {
        for (i, e) in self.elements.iter().enumerate().skip(position) {
            self.index.insert(e.id.clone(), i);
        }
    }

    /// Add a named slice of the element at `position`.
    pub fn add_slice(&mut self, position: usize, name: &str) -> Result<usize> {
        let slice = self.elements[position].new_slice(name);
        self.add_element(slice)
    }

    /// "Removal": zero out max cardinality, never delete.
    pub fn zero_out(&mut self, position: usize) {
        self.elements[position].max = Some("0".to_string());
    }

    /// Whether `id` has already been structurally expanded.
    pub fn is_unfolded(&self, id: &str) -> bool {
        self.unfolded.contains(id)
    }

    pub fn mark_unfolded(&mut self, id: &str) {
        self.unfolded.insert(id.to_string());
    }

    /// Full wire document: `snapshot.element[]` is always the complete
    /// current state, `differential.element[]` is derived from each element's
    /// baseline diff, never stored.
    pub fn to_json(&self) -> Value {
        let snapshot: Vec<Value> = self
            .elements
            .iter()
            .map(|e| Value::Object(e.to_wire()))
            .collect();
        let differential: Vec<Value> = self
            .elements
            .iter()
            .filter(|e| e.has_diff())
            .map(|e| Value::Object(e.diff()))
            .collect();

        let mut doc = Map::new();
        doc.insert("resourceType".into(), json!("StructureDefinition"));
        if let Some(id) = &self.id {
            doc.insert("id".into(), json!(id));
        }
        doc.insert("url".into(), json!(self.url));
        if let Some(version) = &self.version {
            doc.insert("version".into(), json!(version));
        }
        doc.insert("name".into(), json!(self.name));
        doc.insert("status".into(), json!(self.status));
        doc.insert("kind".into(), json!(self.kind));
        if let Some(abstract_type) = self.abstract_type {
            doc.insert("abstract".into(), json!(abstract_type));
        }
        doc.insert("type".into(), json!(self.type_name));
        if let Some(base) = &self.base_definition {
            doc.insert("baseDefinition".into(), json!(base));
        }
        if let Some(derivation) = &self.derivation {
            doc.insert("derivation".into(), json!(derivation));
        }
        doc.insert("snapshot".into(), json!({ "element": snapshot }));
        doc.insert("differential".into(), json!({ "element": differential }));
        Value::Object(doc)
    }

    /// Reconstruct from a wire document. Only `snapshot.element[]` is read;
    /// a differential on the wire is derivable and discarded. With
    /// `capture_original` every node is immediately captured as its own
    /// baseline (loading a base definition that will not itself be diffed).
    pub fn from_json(doc: &Value, capture_original: bool) -> Result<Self> {
        let str_field = |key: &str| doc.get(key).and_then(Value::as_str).map(String::from);
        let type_name = str_field("type")
            .ok_or_else(|| FhirShapeError::invalid_id("document has no type"))?;

        let mut sd = StructureDefinition::new(
            &type_name,
            str_field("url").unwrap_or_default().as_str(),
            str_field("name").unwrap_or_default().as_str(),
        );
        sd.id = str_field("id");
        sd.version = str_field("version");
        sd.status = str_field("status").unwrap_or_else(|| "active".to_string());
        sd.kind = str_field("kind").unwrap_or_else(|| "resource".to_string());
        sd.abstract_type = doc.get("abstract").and_then(Value::as_bool);
        sd.base_definition = str_field("baseDefinition");
        sd.derivation = str_field("derivation");

        let elements = doc
            .get("snapshot")
            .and_then(|s| s.get("element"))
            .and_then(Value::as_array);
        if let Some(elements) = elements {
            sd.elements.clear();
            sd.index.clear();
            for entry in elements {
                let map = entry
                    .as_object()
                    .ok_or_else(|| FhirShapeError::invalid_id("element is not an object"))?;
                let element = ElementDefinition::from_wire(map)?;
                validate_id(&element.id)?;
                sd.index.insert(element.id.clone(), sd.elements.len());
                sd.elements.push(element);
            }
        }
        if sd.elements.is_empty() {
            return Err(FhirShapeError::invalid_id("document has no elements"));
        }
        if capture_original {
            for element in &mut sd.elements {
                element.capture_original();
            }
        }
        Ok(sd)
    }
}

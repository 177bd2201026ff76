//! Element definitions: one node of a structure definition's tree.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{FhirShapeError, Result};
use crate::types::binding::ElementBinding;
use crate::types::type_descriptor::TypeDescriptor;
use crate::types::{capitalize_first, decapitalize_first, is_primitive_type};

static ID_SEGMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9\-@]+(\[x\])?$").expect("valid regex"));
static MAPPING_IDENTITY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9\-\.]{1,64}$").expect("valid regex"));

/// Slicing discriminator kind: how instances are told apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiscriminatorKind {
    #[serde(rename = "value")]
    Value,
    #[serde(rename = "exists")]
    Exists,
    #[serde(rename = "pattern")]
    Pattern,
    #[serde(rename = "type")]
    Type,
    #[serde(rename = "profile")]
    Profile,
}

/// Slicing rules: whether unsliced content is allowed, and where.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlicingRules {
    #[serde(rename = "closed")]
    Closed,
    #[serde(rename = "open")]
    Open,
    #[serde(rename = "openAtEnd")]
    OpenAtEnd,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlicingDiscriminator {
    #[serde(rename = "type")]
    pub kind: DiscriminatorKind,
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementSlicing {
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub discriminator: Vec<SlicingDiscriminator>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ordered: Option<bool>,
    pub rules: SlicingRules,
}

impl ElementSlicing {
    pub fn new(rules: SlicingRules) -> Self {
        Self {
            discriminator: Vec::new(),
            description: None,
            ordered: None,
            rules,
        }
    }

    pub fn add_discriminator(&mut self, kind: DiscriminatorKind, path: &str) {
        self.discriminator.push(SlicingDiscriminator {
            kind,
            path: path.to_string(),
        });
    }
}

/// Cardinality and path of the element in the definition it was first named.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementBase {
    pub path: String,
    pub min: u32,
    pub max: String,
}

/// Invariant attached to an element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementConstraint {
    pub key: String,
    /// error | warning
    pub severity: String,
    pub human: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expression: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// Mapping of an element to a concept in another specification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementMapping {
    pub identity: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    pub map: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// The fixed or pattern value carried by an element.
///
/// A single slot with an `exact` flag enforces "at most one of fixed/pattern";
/// the wire shape is the dynamic `fixed<Type>` / `pattern<Type>` key.
#[derive(Debug, Clone, PartialEq)]
pub struct AssignedValue {
    /// true => fixed (closed world), false => pattern (open world)
    pub exact: bool,
    /// FHIR type code the value is shaped as
    pub type_name: String,
    pub value: Value,
}

impl AssignedValue {
    pub fn wire_key(&self) -> String {
        let prefix = if self.exact { "fixed" } else { "pattern" };
        format!("{prefix}{}", capitalize_first(&self.type_name))
    }

    /// Split a wire key such as `patternCodeableConcept` into (exact, type).
    pub fn parse_wire_key(key: &str) -> Option<(bool, String)> {
        let (exact, suffix) = if let Some(rest) = key.strip_prefix("fixed") {
            (true, rest)
        } else if let Some(rest) = key.strip_prefix("pattern") {
            (false, rest)
        } else {
            return None;
        };
        if suffix.is_empty() || !suffix.starts_with(|c: char| c.is_ascii_uppercase()) {
            return None;
        }
        let lowered = decapitalize_first(suffix);
        let type_name = if is_primitive_type(&lowered) {
            lowered
        } else {
            suffix.to_string()
        };
        Some((exact, type_name))
    }
}

/// One node of a structure definition's element tree.
///
/// The `id` nests with `.` and introduces slice names with `:`; `path` is the
/// id with slice segments stripped. The `original` baseline backs the
/// differential and is never serialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementDefinition {
    pub id: String,
    pub path: String,
    #[serde(rename = "sliceName", skip_serializing_if = "Option::is_none")]
    pub slice_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slicing: Option<ElementSlicing>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub short: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub definition: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base: Option<ElementBase>,
    #[serde(rename = "contentReference", skip_serializing_if = "Option::is_none")]
    pub content_reference: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Vec::is_empty", default)]
    pub types: Vec<TypeDescriptor>,
    #[serde(rename = "constraint", skip_serializing_if = "Vec::is_empty", default)]
    pub constraints: Vec<ElementConstraint>,
    #[serde(rename = "mustSupport", skip_serializing_if = "Option::is_none")]
    pub must_support: Option<bool>,
    #[serde(rename = "isModifier", skip_serializing_if = "Option::is_none")]
    pub is_modifier: Option<bool>,
    #[serde(rename = "isSummary", skip_serializing_if = "Option::is_none")]
    pub is_summary: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub binding: Option<ElementBinding>,
    #[serde(rename = "mapping", skip_serializing_if = "Vec::is_empty", default)]
    pub mappings: Vec<ElementMapping>,

    /// Fixed or pattern value; serialized through [`ElementDefinition::to_wire`]
    #[serde(skip)]
    pub assigned: Option<AssignedValue>,
    /// Baseline snapshot for differential derivation
    #[serde(skip)]
    pub original: Option<Map<String, Value>>,
}

impl ElementDefinition {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            path: strip_slice_names(id),
            slice_name: None,
            slicing: None,
            short: None,
            definition: None,
            min: None,
            max: None,
            base: None,
            content_reference: None,
            types: Vec::new(),
            constraints: Vec::new(),
            must_support: None,
            is_modifier: None,
            is_summary: None,
            binding: None,
            mappings: Vec::new(),
            assigned: None,
            original: None,
        }
    }

    /// The container root: cardinality 0..*, no flags.
    pub fn root(type_name: &str) -> Self {
        let mut el = Self::new(type_name);
        el.min = Some(0);
        el.max = Some("*".to_string());
        el.base = Some(ElementBase {
            path: type_name.to_string(),
            min: 0,
            max: "*".to_string(),
        });
        el
    }

    /// Updating the id recomputes the structural path.
    pub fn set_id(&mut self, id: &str) -> Result<()> {
        validate_id(id)?;
        self.id = id.to_string();
        self.path = strip_slice_names(id);
        Ok(())
    }

    pub fn is_choice(&self) -> bool {
        self.path.ends_with("[x]")
    }

    pub fn is_array(&self) -> bool {
        match self.max.as_deref() {
            Some("*") => true,
            Some(n) => n.parse::<u32>().map(|v| v > 1).unwrap_or(false),
            None => false,
        }
    }

    /// Numeric max, `None` when unbounded or unset.
    pub fn max_value(&self) -> Option<u32> {
        match self.max.as_deref() {
            Some("*") | None => None,
            Some(n) => n.parse().ok(),
        }
    }

    /// Clone this element as a named slice of itself: same types and base,
    /// min reset to 0, no inherited slicing, new in the differential.
    pub fn new_slice(&self, name: &str) -> Self {
        let mut slice = self.clone();
        slice.id = format!("{}:{name}", self.id);
        slice.slice_name = Some(name.to_string());
        slice.min = Some(0);
        slice.slicing = None;
        slice.assigned = None;
        slice.original = None;
        slice
    }

    pub fn add_constraint(&mut self, constraint: ElementConstraint) {
        self.constraints.push(constraint);
    }

    pub fn add_mapping(&mut self, mapping: ElementMapping) -> Result<()> {
        if !MAPPING_IDENTITY.is_match(&mapping.identity) {
            return Err(FhirShapeError::invalid_mapping(format!(
                "identity '{}' is not a valid id",
                mapping.identity
            )));
        }
        if mapping.map.trim().is_empty() {
            return Err(FhirShapeError::invalid_mapping(format!(
                "mapping for '{}' has an empty map",
                self.id
            )));
        }
        self.mappings.push(mapping);
        Ok(())
    }

    /// Serialize to the wire field map, with the fixed/pattern slot expanded
    /// to its dynamic `fixed<Type>`/`pattern<Type>` key.
    pub fn to_wire(&self) -> Map<String, Value> {
        let mut map = match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        };
        if let Some(assigned) = &self.assigned {
            map.insert(assigned.wire_key(), assigned.value.clone());
        }
        map
    }

    /// Reconstruct from a wire field map, folding any `fixed<Type>` or
    /// `pattern<Type>` key back into the assigned-value slot.
    pub fn from_wire(map: &Map<String, Value>) -> Result<Self> {
        let mut element: ElementDefinition =
            serde_json::from_value(Value::Object(map.clone()))?;
        for (key, value) in map {
            if let Some((exact, type_name)) = AssignedValue::parse_wire_key(key) {
                element.assigned = Some(AssignedValue {
                    exact,
                    type_name,
                    value: value.clone(),
                });
                break;
            }
        }
        Ok(element)
    }
}

/// Strip `:slice` segments from an id, yielding the structural path.
pub fn strip_slice_names(id: &str) -> String {
    id.split('.')
        .map(|segment| segment.split(':').next().unwrap_or(segment))
        .collect::<Vec<_>>()
        .join(".")
}

/// Ids nest with `.` and introduce slice names with `:`; every name and
/// slice-name part must be a plain token (with an optional `[x]` suffix).
pub fn validate_id(id: &str) -> Result<()> {
    if id.is_empty() {
        return Err(FhirShapeError::invalid_id(id));
    }
    for segment in id.split('.') {
        for part in segment.split(':') {
            if !ID_SEGMENT.is_match(part) {
                return Err(FhirShapeError::invalid_id(id));
            }
        }
    }
    Ok(())
}

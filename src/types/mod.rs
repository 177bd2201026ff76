//! Core data model: structure containers, element nodes, type descriptors
//! and bindings.

pub mod binding;
pub mod element;
pub mod structure_definition;
pub mod type_descriptor;

pub use binding::{BindingStrength, ElementBinding};
pub use element::{
    AssignedValue, DiscriminatorKind, ElementBase, ElementConstraint, ElementDefinition,
    ElementMapping, ElementSlicing, SlicingDiscriminator, SlicingRules, strip_slice_names,
    validate_id,
};
pub use structure_definition::StructureDefinition;
pub use type_descriptor::{ProfileEntry, REFERENCE_LIKE_CODES, TypeDescriptor, short_name};

/// FHIR primitive types
pub const FHIR_PRIMITIVE_TYPES: &[&str] = &[
    "base64Binary",
    "boolean",
    "canonical",
    "code",
    "date",
    "dateTime",
    "decimal",
    "id",
    "instant",
    "integer",
    "integer64",
    "markdown",
    "oid",
    "positiveInt",
    "string",
    "time",
    "unsignedInt",
    "uri",
    "url",
    "uuid",
    "xhtml",
];

/// Quantity and its specializations
pub const QUANTITY_TYPES: &[&str] = &[
    "Quantity", "Age", "Count", "Distance", "Duration", "MoneyQuantity", "SimpleQuantity",
];

pub fn is_primitive_type(code: &str) -> bool {
    FHIR_PRIMITIVE_TYPES.contains(&code)
}

pub fn is_quantity_type(code: &str) -> bool {
    QUANTITY_TYPES.contains(&code)
}

pub(crate) fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

pub(crate) fn decapitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

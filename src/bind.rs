//! Binding a value set to a coded element.
//!
//! Binding strength forms a lattice (`example < preferred < extensible <
//! required`); a derived definition may tighten a binding but never loosen it.

use crate::assign::primitives::is_usable_uri;
use crate::error::{FhirShapeError, Result};
use crate::types::{BindingStrength, ElementBinding, StructureDefinition, is_quantity_type};

/// Type codes a binding can attach to.
const BINDABLE_CODES: &[&str] = &[
    "code",
    "Coding",
    "CodeableConcept",
    "Quantity",
    "string",
    "uri",
    "CodeableReference",
];

fn is_bindable(code: &str) -> bool {
    BINDABLE_CODES.contains(&code) || is_quantity_type(code)
}

/// Bind `value_set` at the given strength to the element at `position`.
///
/// Returns `CodeableReferenceConcept` after recording the binding when the
/// target is the `.concept` child of a CodeableReference element, so the
/// caller can point at the misplaced rule.
pub fn bind(
    sd: &mut StructureDefinition,
    position: usize,
    value_set: Option<&str>,
    strength: BindingStrength,
) -> Result<()> {
    let element = sd.element_at(position);
    let id = element.id.clone();

    let bindable = element.types.iter().any(|t| is_bindable(&t.code));
    if !bindable {
        let types = element
            .types
            .iter()
            .map(|t| t.code.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        return Err(FhirShapeError::coded_type_not_found(types));
    }

    let bare_code = element.types.iter().all(|t| t.code == "code");
    if let Some(vs) = value_set {
        let unversioned = vs.split('|').next().unwrap_or(vs);
        if !is_usable_uri(unversioned) && !bare_code {
            return Err(FhirShapeError::invalid_uri(vs));
        }
    }

    if let Some(current) = &element.binding {
        if strength < current.strength {
            return Err(FhirShapeError::BindingStrengthViolation {
                current: current.strength,
                attempted: strength,
            });
        }
    }

    let mut binding = ElementBinding::new(strength);
    binding.value_set = value_set.map(str::to_string);
    sd.element_at_mut(position).binding = Some(binding);

    if concept_of_codeable_reference(sd, position) {
        return Err(FhirShapeError::codeable_reference_concept(id));
    }
    Ok(())
}

/// Whether the element is the unfolded `concept` child of an element typed
/// CodeableReference.
fn concept_of_codeable_reference(sd: &StructureDefinition, position: usize) -> bool {
    if !sd.element_at(position).path.ends_with(".concept") {
        return false;
    }
    let Some(parent) = sd.parent_of(position) else {
        return false;
    };
    sd.element_at(parent)
        .types
        .iter()
        .any(|t| t.code == "CodeableReference")
}

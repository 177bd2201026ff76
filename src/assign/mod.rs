//! The value assignment engine: mapping literal values onto an element's
//! `fixed<Type>`/`pattern<Type>` slot.
//!
//! Every check runs before the single field write; a rejected assignment
//! leaves the element untouched.

pub mod primitives;
pub mod value;

use serde_json::Value;
use tracing::warn;

use crate::assign::primitives::is_usable_uri;
use crate::assign::value::{LiteralValue, materialize, shape_of};
use crate::error::{FhirShapeError, Result};
use crate::lookup::{DefinitionKind, TypeLookup};
use crate::types::{AssignedValue, DiscriminatorKind, StructureDefinition};

/// Assign `value` to the element at `position`, as a pattern (`exact` false,
/// open world) or fixed value (`exact` true, closed world).
pub fn assign(
    sd: &mut StructureDefinition,
    position: usize,
    value: &LiteralValue,
    exact: bool,
    lookup: Option<&dyn TypeLookup>,
) -> Result<()> {
    let element = sd.element_at(position);
    let id = element.id.clone();
    if element.types.len() != 1 {
        return Err(FhirShapeError::no_single_type(&id));
    }
    let descriptor = element.types[0].clone();
    let shape = shape_of(&descriptor, lookup);

    check_coded_system(value, &shape, lookup)?;

    let materialized = materialize(value, &shape)?;
    let incoming = AssignedValue {
        exact,
        type_name: descriptor.code.clone(),
        value: materialized,
    };

    if let Some(current) = &sd.element_at(position).assigned {
        let same = current.type_name == incoming.type_name && current.value == incoming.value;
        if current.exact {
            // A fixed value never downgrades to a pattern, equal or not.
            if !exact {
                return Err(FhirShapeError::fixed_to_pattern(&id));
            }
            if same {
                return Ok(());
            }
            return Err(FhirShapeError::value_already_assigned(
                incoming.value.to_string(),
                current.value.to_string(),
            ));
        }
        if !same {
            return Err(FhirShapeError::value_already_assigned(
                incoming.value.to_string(),
                current.value.to_string(),
            ));
        }
        if !exact {
            // Identical pattern re-assignment is a no-op success.
            return Ok(());
        }
        // Equal value, pattern -> fixed: tightening, allowed; falls through.
    }

    check_inherited_conflict(sd, position, &incoming)?;

    let bump_min = named_by_value_discriminator(sd, position);

    let element = sd.element_at_mut(position);
    element.assigned = Some(incoming);
    if bump_min && element.min.unwrap_or(0) < 1 {
        element.min = Some(1);
    }
    Ok(())
}

/// A coded value's system must be a usable URI, and must identify a code
/// system. Bare `code` targets cannot carry a system on the wire, so a
/// questionable system there is a warning, not an error.
fn check_coded_system(
    value: &LiteralValue,
    shape: &crate::assign::value::TargetShape,
    lookup: Option<&dyn TypeLookup>,
) -> Result<()> {
    let LiteralValue::Code {
        system: Some(system),
        code,
        ..
    } = value
    else {
        return Ok(());
    };
    let unversioned = system.split('|').next().unwrap_or(system);

    if !is_usable_uri(unversioned) {
        if shape.is_bare_code() {
            warn!(code = %code, system = %system, "system is not a URI; dropped on a bare code target");
            return Ok(());
        }
        return Err(FhirShapeError::invalid_uri(system));
    }

    if let Some(lookup) = lookup {
        let is_value_set = lookup.fetch(unversioned, &[DefinitionKind::ValueSet]).is_some()
            && lookup.fetch(unversioned, &[DefinitionKind::CodeSystem]).is_none();
        if is_value_set {
            if shape.is_bare_code() {
                warn!(code = %code, system = %system, "system names a value set; dropped on a bare code target");
            } else {
                return Err(FhirShapeError::mismatched_binding_type(system));
            }
        }
    }
    Ok(())
}

/// Compare against any value implied by an ancestor's fixed/pattern
/// structure: a differing inherited value is a conflict regardless of
/// open/closed world.
fn check_inherited_conflict(
    sd: &StructureDefinition,
    position: usize,
    incoming: &AssignedValue,
) -> Result<()> {
    let path = sd.element_at(position).path.clone();
    let mut cursor = sd.parent_of(position);
    while let Some(ancestor) = cursor {
        let ancestor_el = sd.element_at(ancestor);
        if let Some(assigned) = &ancestor_el.assigned {
            let relative = path
                .strip_prefix(&format!("{}.", ancestor_el.path))
                .unwrap_or_default();
            let segments: Vec<&str> = relative.split('.').filter(|s| !s.is_empty()).collect();
            if let Some(inherited) = project(&assigned.value, &segments) {
                if inherited != incoming.value {
                    return Err(FhirShapeError::value_already_assigned(
                        incoming.value.to_string(),
                        assigned.value.to_string(),
                    ));
                }
            }
        }
        cursor = sd.parent_of(ancestor);
    }
    Ok(())
}

/// Project an assigned structure down a relative structural path. Arrays
/// project through their first entry; a choice segment cannot be projected.
fn project(value: &Value, segments: &[&str]) -> Option<Value> {
    let mut current = value;
    for segment in segments {
        if segment.contains("[x]") {
            return None;
        }
        if let Value::Array(items) = current {
            current = items.first()?;
        }
        current = current.get(segment)?;
    }
    if let Value::Array(items) = current {
        current = items.first()?;
    }
    Some(current.clone())
}

/// Whether the element's path is named by an ancestor slicing discriminator
/// of kind value/pattern (and not `$this`) while the element sits inside a
/// slice — such an element must be present for the slice to match.
fn named_by_value_discriminator(sd: &StructureDefinition, position: usize) -> bool {
    let element = sd.element_at(position);
    for owner in sd.elements() {
        let Some(slicing) = &owner.slicing else {
            continue;
        };
        let inside_slice = element.id.starts_with(&format!("{}:", owner.id));
        if !inside_slice {
            continue;
        }
        for discriminator in &slicing.discriminator {
            if !matches!(
                discriminator.kind,
                DiscriminatorKind::Value | DiscriminatorKind::Pattern
            ) || discriminator.path == "$this"
            {
                continue;
            }
            if element.path == format!("{}.{}", owner.path, discriminator.path) {
                return true;
            }
        }
    }
    false
}

mod common;

use common::{observation_profile, standard_lookup};
use fhirshape::path::resolve_path;
use fhirshape::types::{DiscriminatorKind, SlicingRules};

#[test]
fn test_resolve_direct_child() {
    let mut sd = observation_profile();
    let lookup = standard_lookup();
    let pos = resolve_path(&mut sd, "status", &lookup).unwrap();
    assert_eq!(sd.element_at(pos).id, "Observation.status");
}

#[test]
fn test_resolve_unfolds_on_demand() {
    let mut sd = observation_profile();
    let lookup = standard_lookup();
    assert!(sd.position_of("Observation.code.coding").is_none());

    let pos = resolve_path(&mut sd, "code.coding.system", &lookup).unwrap();
    assert_eq!(sd.element_at(pos).id, "Observation.code.coding.system");

    // The unfolds left both intermediate levels in place.
    assert!(sd.position_of("Observation.code.coding").is_some());
    assert!(sd.position_of("Observation.code.text").is_some());
    assert_eq!(sd.element_at(pos).types[0].code, "uri");
}

#[test]
fn test_resolve_is_idempotent() {
    let mut sd = observation_profile();
    let lookup = standard_lookup();

    let first = resolve_path(&mut sd, "code.coding.system", &lookup).unwrap();
    let len_after_first = sd.len();
    let second = resolve_path(&mut sd, "code.coding.system", &lookup).unwrap();

    assert_eq!(first, second);
    assert_eq!(sd.len(), len_after_first);
}

#[test]
fn test_resolve_choice_slices_on_first_use() {
    let mut sd = observation_profile();
    let lookup = standard_lookup();

    let pos = resolve_path(&mut sd, "valueQuantity", &lookup).unwrap();
    let slice = sd.element_at(pos);
    assert_eq!(slice.id, "Observation.value[x]:valueQuantity");
    assert_eq!(slice.slice_name.as_deref(), Some("valueQuantity"));
    assert_eq!(slice.types.len(), 1);
    assert_eq!(slice.types[0].code, "Quantity");

    let choice = sd.find_element("Observation.value[x]").unwrap();
    let slicing = choice.slicing.as_ref().unwrap();
    assert_eq!(slicing.rules, SlicingRules::Open);
    assert_eq!(slicing.discriminator[0].kind, DiscriminatorKind::Type);
    assert_eq!(slicing.discriminator[0].path, "$this");

    // Re-resolving reuses the slice instead of stacking another.
    let again = resolve_path(&mut sd, "valueQuantity", &lookup).unwrap();
    assert_eq!(again, pos);
}

#[test]
fn test_resolve_primitive_choice_suffix() {
    let mut sd = observation_profile();
    let lookup = standard_lookup();

    let pos = resolve_path(&mut sd, "valueString", &lookup).unwrap();
    let slice = sd.element_at(pos);
    assert_eq!(slice.id, "Observation.value[x]:valueString");
    assert_eq!(slice.types[0].code, "string");
}

#[test]
fn test_resolve_unknown_choice_type_is_none() {
    let mut sd = observation_profile();
    let lookup = standard_lookup();
    assert!(resolve_path(&mut sd, "valueBoolean", &lookup).is_none());
}

#[test]
fn test_numeric_bracket_stays_on_node() {
    let mut sd = observation_profile();
    let lookup = standard_lookup();

    let plain = resolve_path(&mut sd, "component.code", &lookup).unwrap();
    let indexed = resolve_path(&mut sd, "component[0].code", &lookup).unwrap();
    assert_eq!(plain, indexed);
}

#[test]
fn test_slice_bracket_resolves_named_slice() {
    let mut sd = observation_profile();
    let lookup = standard_lookup();

    let component = resolve_path(&mut sd, "component", &lookup).unwrap();
    sd.add_slice(component, "systolic").unwrap();

    let pos = resolve_path(&mut sd, "component[systolic]", &lookup).unwrap();
    assert_eq!(sd.element_at(pos).id, "Observation.component:systolic");
    assert!(resolve_path(&mut sd, "component[diastolic]", &lookup).is_none());
}

#[test]
fn test_reference_target_bracket_passes_through() {
    let mut sd = observation_profile();
    let lookup = standard_lookup();

    let plain = resolve_path(&mut sd, "subject", &lookup).unwrap();
    let qualified = resolve_path(&mut sd, "subject[Patient]", &lookup).unwrap();
    assert_eq!(plain, qualified);
    assert!(resolve_path(&mut sd, "subject[Medication]", &lookup).is_none());
}

#[test]
fn test_content_reference_unfolds_local_subtree() {
    let mut sd = observation_profile();
    let lookup = standard_lookup();

    let pos = resolve_path(&mut sd, "component.referenceRange.low", &lookup).unwrap();
    let low = sd.element_at(pos);
    assert_eq!(low.id, "Observation.component.referenceRange.low");
    assert_eq!(low.types[0].code, "Quantity");

    // The referenced subtree was re-rooted, not moved.
    assert!(sd.position_of("Observation.referenceRange.low").is_some());
    assert!(
        sd.position_of("Observation.component.referenceRange.high")
            .is_some()
    );

    let again = resolve_path(&mut sd, "component.referenceRange.low", &lookup).unwrap();
    assert_eq!(again, pos);
}

#[test]
fn test_unknown_path_is_none_not_error() {
    let mut sd = observation_profile();
    let lookup = standard_lookup();
    assert!(resolve_path(&mut sd, "nonsense", &lookup).is_none());
    assert!(resolve_path(&mut sd, "code.nonsense", &lookup).is_none());
}

#[test]
fn test_unfolded_children_bear_base_and_baseline() {
    let mut sd = observation_profile();
    let lookup = standard_lookup();

    let pos = resolve_path(&mut sd, "code.text", &lookup).unwrap();
    let text = sd.element_at(pos);
    let base = text.base.as_ref().unwrap();
    assert_eq!(base.path, "CodeableConcept.text");
    // Freshly unfolded nodes carry no differential of their own.
    assert!(!text.has_diff());
}

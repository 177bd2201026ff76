//! Path resolution over a structure definition's element tree.
//!
//! `resolve_path` walks a dotted/bracketed rule path to exactly one element,
//! unfolding child structure from the type-lookup capability and slicing
//! choice elements on demand. Not-found is `None`, never an error; only the
//! caller decides whether that matters.

use tracing::debug;

use crate::lookup::{DefinitionKind, TypeLookup};
use crate::path::parser::{PathPart, is_numeric_bracket, parse_path};
use crate::types::{
    DiscriminatorKind, ElementBase, ElementSlicing, SlicingRules, StructureDefinition,
    capitalize_first, decapitalize_first,
};

/// Resolve `path` (relative to the definition's root) to the position of a
/// single element. Unfolds and choice slices are spliced into the container
/// as a side effect; re-resolving the same path returns the same node
/// without re-unfolding.
pub fn resolve_path(
    sd: &mut StructureDefinition,
    path: &str,
    lookup: &dyn TypeLookup,
) -> Option<usize> {
    let parts = parse_path(path);
    let mut anchor = 0;
    for part in &parts {
        anchor = resolve_segment(sd, anchor, part, lookup)?;
    }
    Some(anchor)
}

fn resolve_segment(
    sd: &mut StructureDefinition,
    anchor: usize,
    part: &PathPart,
    lookup: &dyn TypeLookup,
) -> Option<usize> {
    let anchor_id = sd.element_at(anchor).id.clone();
    let child_id = format!("{anchor_id}.{}", part.base);

    let mut target = sd.position_of(&child_id);
    if target.is_none() && unfold(sd, anchor, lookup) {
        target = sd.position_of(&child_id);
    }
    if target.is_none() {
        target = resolve_choice(sd, anchor, part);
    }
    let mut target = target?;

    // Bracket qualifiers apply in declared order.
    for bracket in &part.brackets {
        if is_numeric_bracket(bracket) {
            // Positional index into instances; one schema node covers all.
            continue;
        }
        let slice_id = format!("{}:{bracket}", sd.element_at(target).id);
        if let Some(slice) = sd.position_of(&slice_id) {
            target = slice;
            continue;
        }
        let element = sd.element_at(target);
        let names_reference_target = element.types.iter().any(|t| {
            t.is_reference_like() && t.target_short_names().iter().any(|n| n == bracket)
        });
        if names_reference_target {
            continue;
        }
        return None;
    }
    Some(target)
}

/// Find a choice element (`stem[x]`) among the anchor's direct children whose
/// declared types reconstruct `part.base` (stem + upper-cased type code), and
/// slice it for the concrete type on first use.
fn resolve_choice(sd: &mut StructureDefinition, anchor: usize, part: &PathPart) -> Option<usize> {
    let anchor_id = sd.element_at(anchor).id.clone();
    let prefix = format!("{anchor_id}.");

    let mut found = None;
    for pos in sd.descendants_of(anchor) {
        let element = sd.element_at(pos);
        if element.slice_name.is_some() {
            continue;
        }
        let Some(rest) = element.id.strip_prefix(&prefix) else {
            continue;
        };
        if rest.contains('.') || rest.contains(':') {
            continue;
        }
        let Some(stem) = rest.strip_suffix("[x]") else {
            continue;
        };
        if !part.base.starts_with(stem) || part.base.len() == stem.len() {
            continue;
        }
        let suffix = &part.base[stem.len()..];
        // Primitive codes are lowercase on the descriptor and capitalized in
        // the path; complex codes match verbatim.
        let wanted = if part.primitive {
            decapitalize_first(suffix)
        } else {
            suffix.to_string()
        };
        if let Some(descriptor) = element.types.iter().find(|t| {
            t.code == wanted || capitalize_first(&t.code) == suffix
        }) {
            found = Some((pos, descriptor.clone()));
            break;
        }
    }
    let (choice, descriptor) = found?;

    let slice_id = format!("{}:{}", sd.element_at(choice).id, part.base);
    if let Some(existing) = sd.position_of(&slice_id) {
        return Some(existing);
    }

    // First use: slice the choice for the concrete type.
    let element = sd.element_at_mut(choice);
    if element.slicing.is_none() {
        let mut slicing = ElementSlicing::new(SlicingRules::Open);
        slicing.add_discriminator(DiscriminatorKind::Type, "$this");
        slicing.ordered = Some(false);
        element.slicing = Some(slicing);
    }
    let mut slice = sd.element_at(choice).new_slice(&part.base);
    slice.types = vec![descriptor];
    sd.add_element(slice).ok()
}

/// Lazily expand the element at `position` with its declared type's child
/// structure. Returns whether anything was spliced in. Each element unfolds
/// at most once; the container remembers expanded ids.
pub fn unfold(sd: &mut StructureDefinition, position: usize, lookup: &dyn TypeLookup) -> bool {
    let id = sd.element_at(position).id.clone();
    if sd.is_unfolded(&id) {
        return false;
    }

    if let Some(reference) = sd.element_at(position).content_reference.clone() {
        let target_id = reference.trim_start_matches('#').to_string();
        return unfold_from_local(sd, position, &target_id);
    }

    let element = sd.element_at(position);
    if element.types.len() != 1 {
        return false;
    }
    let descriptor = element.types[0].clone();
    // A declared profile narrows the unfold source; fall back to the code.
    let fetch_key = descriptor
        .profiles
        .first()
        .map(|p| p.uri.clone())
        .unwrap_or_else(|| descriptor.code.clone());

    let Some(doc) = lookup.fetch(&fetch_key, DefinitionKind::STRUCTURAL) else {
        debug!(id = %id, key = %fetch_key, "unfold lookup found no definition");
        return false;
    };
    let Ok(base) = StructureDefinition::from_json(&doc, false) else {
        debug!(id = %id, key = %fetch_key, "unfold source is not a valid definition");
        return false;
    };

    let base_root = base.element_at(0).id.clone();
    let mut spliced = false;
    for source in base.elements().iter().skip(1) {
        let Some(suffix) = source.id.strip_prefix(&format!("{base_root}.")) else {
            continue;
        };
        let mut child = source.clone();
        if child.set_id(&format!("{id}.{suffix}")).is_err() {
            continue;
        }
        if child.base.is_none() {
            child.base = Some(ElementBase {
                path: source.path.clone(),
                min: source.min.unwrap_or(0),
                max: source.max.clone().unwrap_or_else(|| "1".to_string()),
            });
        }
        child.capture_original();
        if sd.add_element(child).is_ok() {
            spliced = true;
        }
    }
    sd.mark_unfolded(&id);
    spliced
}

/// Unfold a contentReference: re-root the referenced local subtree under
/// `position`.
fn unfold_from_local(sd: &mut StructureDefinition, position: usize, target_id: &str) -> bool {
    let id = sd.element_at(position).id.clone();
    let Some(target) = sd.position_of(target_id) else {
        return false;
    };
    let sources: Vec<_> = sd
        .descendants_of(target)
        .into_iter()
        .map(|i| sd.element_at(i).clone())
        .collect();

    let mut spliced = false;
    for source in sources {
        let Some(suffix) = source.id.strip_prefix(target_id).map(String::from) else {
            continue;
        };
        let mut child = source;
        if child.set_id(&format!("{id}{suffix}")).is_err() {
            continue;
        }
        child.capture_original();
        if sd.add_element(child).is_ok() {
            spliced = true;
        }
    }
    sd.mark_unfolded(&id);
    spliced
}

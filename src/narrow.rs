//! Type narrowing: restricting an element's allowed types to a subset.
//!
//! Candidates come from a parsed "only" rule. Legality is structural
//! sub-typing: a candidate is accepted by an existing type descriptor when it
//! is that type, or a profile/specialization whose base chain reaches it.
//! Reference-like descriptors apply the same rule per target. The descriptor
//! list is rebuilt aside and swapped in only on success.

use crate::error::{FhirShapeError, Result};
use crate::lookup::{DefinitionMetadata, TypeLookup, base_chain};
use crate::types::{ProfileEntry, StructureDefinition, TypeDescriptor, short_name};

/// One candidate type from an "only" rule.
#[derive(Debug, Clone, PartialEq)]
pub struct OnlyCandidate {
    /// Type name or canonical URL
    pub name: String,
    pub reference: bool,
    pub canonical: bool,
    pub codeable_reference: bool,
}

impl OnlyCandidate {
    pub fn plain(name: &str) -> Self {
        Self {
            name: name.to_string(),
            reference: false,
            canonical: false,
            codeable_reference: false,
        }
    }

    pub fn reference_to(name: &str) -> Self {
        Self {
            reference: true,
            ..Self::plain(name)
        }
    }

    pub fn canonical_of(name: &str) -> Self {
        Self {
            canonical: true,
            ..Self::plain(name)
        }
    }

    pub fn codeable_reference_to(name: &str) -> Self {
        Self {
            codeable_reference: true,
            ..Self::plain(name)
        }
    }

    /// The descriptor code a reference-like candidate narrows.
    fn reference_code(&self) -> Option<&'static str> {
        if self.reference {
            Some("Reference")
        } else if self.canonical {
            Some("canonical")
        } else if self.codeable_reference {
            Some("CodeableReference")
        } else {
            None
        }
    }
}

struct Slot {
    descriptor: TypeDescriptor,
    in_filter: bool,
    matched_bare: bool,
    matched_profiles: Vec<ProfileEntry>,
    matched_targets: Vec<ProfileEntry>,
}

impl Slot {
    fn matched(&self) -> bool {
        self.matched_bare || !self.matched_profiles.is_empty() || !self.matched_targets.is_empty()
    }
}

/// Narrow the types of the element at `position` to `candidates`. With a
/// `target_filter`, only the descriptor it names is narrowed and all others
/// pass through unchanged.
pub fn narrow(
    sd: &mut StructureDefinition,
    position: usize,
    candidates: &[OnlyCandidate],
    target_filter: Option<&str>,
    lookup: &dyn TypeLookup,
) -> Result<()> {
    let current = &sd.element_at(position).types;
    let mut slots: Vec<Slot> = current
        .iter()
        .map(|d| Slot {
            in_filter: target_filter.is_none_or(|f| descriptor_matches_filter(d, f)),
            descriptor: d.clone(),
            matched_bare: false,
            matched_profiles: Vec::new(),
            matched_targets: Vec::new(),
        })
        .collect();

    for candidate in candidates {
        let mut matched_any = false;

        if let Some(code) = candidate.reference_code() {
            for slot in slots.iter_mut().filter(|s| s.in_filter) {
                if slot.descriptor.code != code {
                    continue;
                }
                if match_reference_target(&slot.descriptor, candidate, lookup)? {
                    merge_entry(
                        &mut slot.matched_targets,
                        &slot.descriptor.targets,
                        &candidate_uri(candidate, lookup),
                    );
                    matched_any = true;
                }
            }
        } else {
            // Bare match first: naming the descriptor's own code keeps the
            // whole type, widening past any profiles it carried.
            for slot in slots.iter_mut().filter(|s| s.in_filter) {
                if candidate.name == slot.descriptor.code {
                    slot.matched_bare = true;
                    matched_any = true;
                }
            }
            if !matched_any {
                let chain = base_chain(lookup, &candidate.name);
                if chain.is_empty() {
                    return Err(FhirShapeError::type_not_found(&candidate.name));
                }
                for slot in slots.iter_mut().filter(|s| s.in_filter) {
                    if chain_reaches_descriptor(&chain, &slot.descriptor) {
                        check_non_abstract(&slot.descriptor.code, &chain[0], lookup)?;
                        merge_entry(
                            &mut slot.matched_profiles,
                            &slot.descriptor.profiles,
                            &chain[0].url.clone().unwrap_or_else(|| candidate.name.clone()),
                        );
                        matched_any = true;
                    }
                }
            }
        }

        if !matched_any {
            return Err(FhirShapeError::invalid_type(&candidate.name));
        }
    }

    // Rebuild in original descriptor order.
    let mut narrowed = Vec::new();
    for slot in slots {
        if !slot.in_filter {
            narrowed.push(slot.descriptor);
            continue;
        }
        if !slot.matched() {
            continue;
        }
        let mut descriptor = slot.descriptor;
        if slot.matched_bare {
            // The bare type accepts everything under its code.
            descriptor.profiles.clear();
        } else if !slot.matched_profiles.is_empty() {
            descriptor.profiles = slot.matched_profiles;
        }
        if !slot.matched_targets.is_empty() {
            descriptor.targets = slot.matched_targets;
        }
        narrowed.push(descriptor);
    }

    sd.element_at_mut(position).types = narrowed;
    Ok(())
}

fn descriptor_matches_filter(descriptor: &TypeDescriptor, filter: &str) -> bool {
    descriptor.code == filter
        || descriptor
            .profiles
            .iter()
            .chain(&descriptor.targets)
            .any(|p| p.uri == filter || short_name(&p.uri) == filter)
}

/// Reuse an existing entry (keeping upstream per-slot annotations) when the
/// candidate re-selects the same URI.
fn merge_entry(matched: &mut Vec<ProfileEntry>, existing: &[ProfileEntry], uri: &str) {
    if matched.iter().any(|e| e.uri == uri) {
        return;
    }
    if let Some(entry) = existing.iter().find(|e| e.uri == uri) {
        matched.push(entry.clone());
    } else {
        matched.push(ProfileEntry::new(uri));
    }
}

fn candidate_uri(candidate: &OnlyCandidate, lookup: &dyn TypeLookup) -> String {
    base_chain(lookup, &candidate.name)
        .first()
        .and_then(|m| m.url.clone())
        .unwrap_or_else(|| candidate.name.clone())
}

/// Whether the candidate's base chain reaches the descriptor's code or one of
/// its declared profiles.
fn chain_reaches_descriptor(chain: &[DefinitionMetadata], descriptor: &TypeDescriptor) -> bool {
    chain.iter().any(|meta| {
        meta.sd_type.as_deref() == Some(&descriptor.code)
            || meta.name.as_deref() == Some(&descriptor.code)
            || descriptor.profiles.iter().any(|p| {
                meta.url.as_deref() == Some(&p.uri)
                    || meta.name.as_deref() == Some(short_name(&p.uri))
            })
    })
}

/// Specializing a non-abstract type is illegal: when the descriptor's own
/// code is non-abstract, the candidate must be that exact type.
fn check_non_abstract(
    code: &str,
    candidate: &DefinitionMetadata,
    lookup: &dyn TypeLookup,
) -> Result<()> {
    if candidate.sd_type.as_deref() == Some(code) {
        return Ok(());
    }
    // Profiles of the code (derivation constraint) do not specialize it.
    if candidate.derivation.as_deref() == Some("constraint") {
        return Ok(());
    }
    let chain = base_chain(lookup, code);
    if let Some(meta) = chain.first() {
        if !meta.abstract_type {
            return Err(FhirShapeError::non_abstract_parent(
                code,
                candidate
                    .sd_type
                    .as_deref()
                    .or(candidate.name.as_deref())
                    .unwrap_or("unknown"),
            ));
        }
    }
    Ok(())
}

/// Apply the profile legality rule against each existing reference target.
/// An unconstrained target set accepts any resolvable candidate.
fn match_reference_target(
    descriptor: &TypeDescriptor,
    candidate: &OnlyCandidate,
    lookup: &dyn TypeLookup,
) -> Result<bool> {
    let chain = base_chain(lookup, &candidate.name);
    if chain.is_empty() {
        return Err(FhirShapeError::type_not_found(&candidate.name));
    }
    if descriptor.targets.is_empty() {
        return Ok(true);
    }
    for target in &descriptor.targets {
        let target_name = short_name(&target.uri);
        let reached = chain.iter().any(|meta| {
            meta.url.as_deref() == Some(target.uri.split('|').next().unwrap_or(&target.uri))
                || meta.sd_type.as_deref() == Some(target_name)
                || meta.name.as_deref() == Some(target_name)
        });
        if reached {
            check_non_abstract(target_name, &chain[0], lookup)?;
            return Ok(true);
        }
    }
    Ok(false)
}

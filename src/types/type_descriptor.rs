//! Element type descriptors.
//!
//! A [`TypeDescriptor`] names one allowed type of an element: a primitive or
//! complex type code, or one of the reference-like codes (`Reference`,
//! `canonical`, `CodeableReference`) whose profile list is a list of allowed
//! targets. Each profile/target slot is a [`ProfileEntry`] carrying its URI
//! together with any upstream per-slot annotation; the wire's parallel
//! `profile[]`/`_profile[]` arrays exist only at the serde boundary.

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const REFERENCE_LIKE_CODES: &[&str] = &["Reference", "canonical", "CodeableReference"];

/// One profile or reference-target slot.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileEntry {
    /// Canonical URL of the profile or target
    pub uri: String,
    /// Per-slot annotation from the wire's `_profile`/`_targetProfile` array
    pub extra: Option<Value>,
}

impl ProfileEntry {
    pub fn new(uri: &str) -> Self {
        Self {
            uri: uri.to_string(),
            extra: None,
        }
    }
}

/// One allowed type on an element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawTypeDescriptor", into = "RawTypeDescriptor")]
pub struct TypeDescriptor {
    /// FHIR type code
    pub code: String,
    /// Profile slots, for constrained complex/resource types
    pub profiles: Vec<ProfileEntry>,
    /// Target slots, for reference-like codes
    pub targets: Vec<ProfileEntry>,
}

impl TypeDescriptor {
    pub fn new(code: &str) -> Self {
        Self {
            code: code.to_string(),
            profiles: Vec::new(),
            targets: Vec::new(),
        }
    }

    pub fn with_profile(mut self, uri: &str) -> Self {
        self.profiles.push(ProfileEntry::new(uri));
        self
    }

    pub fn with_target(mut self, uri: &str) -> Self {
        self.targets.push(ProfileEntry::new(uri));
        self
    }

    pub fn is_reference_like(&self) -> bool {
        REFERENCE_LIKE_CODES.contains(&self.code.as_str())
    }

    pub fn has_profiles(&self) -> bool {
        !self.profiles.is_empty() || !self.targets.is_empty()
    }

    /// Short names of reference targets: the final path segment of each
    /// target URL, version suffix stripped.
    pub fn target_short_names(&self) -> Vec<String> {
        self.targets
            .iter()
            .map(|t| short_name(&t.uri).to_string())
            .collect()
    }
}

/// Final path segment of a canonical URL, with any `|version` suffix removed.
pub fn short_name(uri: &str) -> &str {
    let unversioned = uri.split('|').next().unwrap_or(uri);
    unversioned.rsplit('/').next().unwrap_or(unversioned)
}

// Wire shape: `code` with sibling `profile`/`_profile` and
// `targetProfile`/`_targetProfile` parallel arrays.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct RawTypeDescriptor {
    code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    profile: Option<Vec<String>>,
    #[serde(rename = "_profile", skip_serializing_if = "Option::is_none")]
    profile_extra: Option<Vec<Option<Value>>>,
    #[serde(rename = "targetProfile", skip_serializing_if = "Option::is_none")]
    target_profile: Option<Vec<String>>,
    #[serde(rename = "_targetProfile", skip_serializing_if = "Option::is_none")]
    target_profile_extra: Option<Vec<Option<Value>>>,
}

fn zip_entries(uris: Option<Vec<String>>, extras: Option<Vec<Option<Value>>>) -> Vec<ProfileEntry> {
    let uris = uris.unwrap_or_default();
    let mut extras = extras.unwrap_or_default();
    extras.resize(uris.len(), None);
    uris.into_iter()
        .zip(extras)
        .map(|(uri, extra)| ProfileEntry { uri, extra })
        .collect()
}

fn unzip_entries(entries: &[ProfileEntry]) -> (Option<Vec<String>>, Option<Vec<Option<Value>>>) {
    if entries.is_empty() {
        return (None, None);
    }
    let uris = entries.iter().map(|e| e.uri.clone()).collect();
    let extras: Vec<Option<Value>> = entries.iter().map(|e| e.extra.clone()).collect();
    // The sibling array is omitted entirely once every slot is null.
    if extras.iter().all(Option::is_none) {
        (Some(uris), None)
    } else {
        (Some(uris), Some(extras))
    }
}

impl From<RawTypeDescriptor> for TypeDescriptor {
    fn from(raw: RawTypeDescriptor) -> Self {
        Self {
            code: raw.code,
            profiles: zip_entries(raw.profile, raw.profile_extra),
            targets: zip_entries(raw.target_profile, raw.target_profile_extra),
        }
    }
}

impl From<TypeDescriptor> for RawTypeDescriptor {
    fn from(td: TypeDescriptor) -> Self {
        let (profile, profile_extra) = unzip_entries(&td.profiles);
        let (target_profile, target_profile_extra) = unzip_entries(&td.targets);
        Self {
            code: td.code,
            profile,
            profile_extra,
            target_profile,
            target_profile_extra,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parallel_arrays_zip() {
        let td: TypeDescriptor = serde_json::from_value(json!({
            "code": "Reference",
            "targetProfile": ["http://hl7.org/fhir/StructureDefinition/Patient",
                              "http://hl7.org/fhir/StructureDefinition/Group"],
            "_targetProfile": [null, {"extension": [{"url": "http://example.org/x", "valueBoolean": true}]}]
        }))
        .unwrap();

        assert_eq!(td.targets.len(), 2);
        assert!(td.targets[0].extra.is_none());
        assert!(td.targets[1].extra.is_some());
        assert_eq!(td.target_short_names(), vec!["Patient", "Group"]);
    }

    #[test]
    fn test_extra_array_omitted_when_all_null() {
        let td = TypeDescriptor::new("Quantity")
            .with_profile("http://hl7.org/fhir/StructureDefinition/SimpleQuantity");
        let wire = serde_json::to_value(&td).unwrap();
        assert!(wire.get("_profile").is_none());
        assert_eq!(
            wire["profile"],
            json!(["http://hl7.org/fhir/StructureDefinition/SimpleQuantity"])
        );
    }

    #[test]
    fn test_short_name_strips_version() {
        assert_eq!(
            short_name("http://hl7.org/fhir/StructureDefinition/Patient|4.0.1"),
            "Patient"
        );
        assert_eq!(short_name("Patient"), "Patient");
    }
}

//! The synchronous definition-lookup capability.
//!
//! The engine never touches disk or network; the caller supplies one
//! [`TypeLookup`] through which base definitions, profiles, value sets and
//! code systems are fetched on demand.

use std::collections::HashSet;

use serde_json::Value;

/// Requested definition kind for a lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefinitionKind {
    Resource,
    Type,
    Profile,
    Extension,
    Logical,
    ValueSet,
    CodeSystem,
}

impl DefinitionKind {
    /// Everything a structural unfold or narrowing check may resolve against.
    pub const STRUCTURAL: &'static [DefinitionKind] = &[
        DefinitionKind::Resource,
        DefinitionKind::Type,
        DefinitionKind::Profile,
        DefinitionKind::Extension,
        DefinitionKind::Logical,
    ];
}

/// Synchronous lookup of definitions by name, id or canonical URL
/// (optionally `|version`-suffixed). Returns the raw wire document.
pub trait TypeLookup {
    fn fetch(&self, name_or_url: &str, kinds: &[DefinitionKind]) -> Option<Value>;
}

/// Metadata extracted from a fetched definition document.
#[derive(Debug, Clone)]
pub struct DefinitionMetadata {
    pub name: Option<String>,
    pub id: Option<String>,
    pub url: Option<String>,
    pub version: Option<String>,
    /// The structural type a StructureDefinition defines
    pub sd_type: Option<String>,
    pub kind: Option<String>,
    pub abstract_type: bool,
    pub base_definition: Option<String>,
    pub resource_type: Option<String>,
    pub derivation: Option<String>,
}

impl DefinitionMetadata {
    pub fn from_doc(doc: &Value) -> Self {
        let str_field = |key: &str| doc.get(key).and_then(Value::as_str).map(String::from);
        Self {
            name: str_field("name"),
            id: str_field("id"),
            url: str_field("url"),
            version: str_field("version"),
            sd_type: str_field("type"),
            kind: str_field("kind"),
            abstract_type: doc.get("abstract").and_then(Value::as_bool).unwrap_or(false),
            base_definition: str_field("baseDefinition"),
            resource_type: str_field("resourceType"),
            derivation: str_field("derivation"),
        }
    }

    /// Whether this definition is known by `key` (name, id, url, or
    /// unversioned url).
    pub fn answers_to(&self, key: &str) -> bool {
        let unversioned = key.split('|').next().unwrap_or(key);
        [&self.name, &self.id, &self.url]
            .into_iter()
            .flatten()
            .any(|v| v == key || v == unversioned || v.split('|').next() == Some(unversioned))
    }
}

/// Walk `baseDefinition` links from `start`, returning the definition's own
/// metadata followed by each ancestor's. Cycles terminate the walk.
pub fn base_chain(lookup: &dyn TypeLookup, start: &str) -> Vec<DefinitionMetadata> {
    let mut chain = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut next = Some(start.to_string());
    while let Some(key) = next {
        if !seen.insert(key.clone()) {
            break;
        }
        let Some(doc) = lookup.fetch(&key, DefinitionKind::STRUCTURAL) else {
            break;
        };
        let meta = DefinitionMetadata::from_doc(&doc);
        next = meta.base_definition.clone();
        chain.push(meta);
    }
    chain
}

/// In-memory lookup over preloaded definition documents.
#[derive(Debug, Default)]
pub struct MemoryLookup {
    docs: Vec<Value>,
}

impl MemoryLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, doc: Value) {
        self.docs.push(doc);
    }

    pub fn with(mut self, doc: Value) -> Self {
        self.add(doc);
        self
    }

    fn doc_matches_kind(doc: &Value, kind: DefinitionKind) -> bool {
        let meta = DefinitionMetadata::from_doc(doc);
        match (meta.resource_type.as_deref(), kind) {
            (Some("ValueSet"), DefinitionKind::ValueSet) => true,
            (Some("CodeSystem"), DefinitionKind::CodeSystem) => true,
            (Some("StructureDefinition"), structural) => match structural {
                DefinitionKind::Resource => {
                    meta.kind.as_deref() == Some("resource")
                        && meta.derivation.as_deref() != Some("constraint")
                }
                DefinitionKind::Type => {
                    matches!(
                        meta.kind.as_deref(),
                        Some("complex-type") | Some("primitive-type")
                    ) && meta.derivation.as_deref() != Some("constraint")
                }
                DefinitionKind::Profile => {
                    meta.derivation.as_deref() == Some("constraint")
                        && meta.sd_type.as_deref() != Some("Extension")
                }
                DefinitionKind::Extension => meta.sd_type.as_deref() == Some("Extension"),
                DefinitionKind::Logical => meta.kind.as_deref() == Some("logical"),
                _ => false,
            },
            _ => false,
        }
    }
}

impl TypeLookup for MemoryLookup {
    fn fetch(&self, name_or_url: &str, kinds: &[DefinitionKind]) -> Option<Value> {
        let (key, version) = match name_or_url.split_once('|') {
            Some((key, version)) => (key, Some(version)),
            None => (name_or_url, None),
        };
        self.docs
            .iter()
            .find(|doc| {
                let meta = DefinitionMetadata::from_doc(doc);
                meta.answers_to(key)
                    && version.is_none_or(|v| meta.version.as_deref() == Some(v))
                    && kinds.iter().any(|&k| Self::doc_matches_kind(doc, k))
            })
            .cloned()
    }
}

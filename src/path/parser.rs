//! Rule-path parsing.
//!
//! A rule path is a dotted sequence of segments; each segment is a base name
//! followed by zero or more bracket qualifiers (slice name, positional index,
//! or reference-target name). A trailing `[x]` belongs to the base name, not
//! to the qualifiers.

use crate::types::{FHIR_PRIMITIVE_TYPES, is_primitive_type};

/// One parsed path segment. Resolver-internal, never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct PathPart {
    pub base: String,
    pub brackets: Vec<String>,
    /// Whether the base names a primitive leaf: either a primitive type code
    /// itself, or a concrete choice name ending in an upper-cased primitive
    /// code (e.g. `valueString`). The resolver decapitalizes such suffixes
    /// when reconstructing the choice type.
    pub primitive: bool,
}

impl PathPart {
    fn new(base: String, mut brackets: Vec<String>) -> Self {
        let mut base = base;
        // `value[x]` reads as one name.
        if brackets.first().map(String::as_str) == Some("x") {
            base.push_str("[x]");
            brackets.remove(0);
        }
        let primitive = is_primitive_type(&base) || has_primitive_choice_suffix(&base);
        Self {
            base,
            brackets,
            primitive,
        }
    }
}

fn has_primitive_choice_suffix(base: &str) -> bool {
    FHIR_PRIMITIVE_TYPES.iter().any(|p| {
        let mut chars = p.chars();
        let capitalized = match chars.next() {
            Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
            None => return false,
        };
        base.len() > capitalized.len() && base.ends_with(&capitalized)
    })
}

/// Split a dotted path into [`PathPart`]s. Dots inside brackets do not split.
pub fn parse_path(path: &str) -> Vec<PathPart> {
    let mut parts = Vec::new();
    let mut base = String::new();
    let mut brackets: Vec<String> = Vec::new();
    let mut bracket: Option<String> = None;

    for c in path.chars() {
        match (c, &mut bracket) {
            ('[', None) => bracket = Some(String::new()),
            (']', Some(current)) => {
                brackets.push(std::mem::take(current));
                bracket = None;
            }
            ('.', None) => {
                if !base.is_empty() || !brackets.is_empty() {
                    parts.push(PathPart::new(
                        std::mem::take(&mut base),
                        std::mem::take(&mut brackets),
                    ));
                }
            }
            (c, Some(current)) => current.push(c),
            (c, None) => base.push(c),
        }
    }
    if !base.is_empty() || !brackets.is_empty() {
        parts.push(PathPart::new(base, brackets));
    }
    parts
}

/// Whether a bracket qualifier is a positional index.
pub fn is_numeric_bracket(bracket: &str) -> bool {
    !bracket.is_empty() && bracket.chars().all(|c| c.is_ascii_digit())
}

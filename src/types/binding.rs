//! Value set bindings and the binding strength order.

use serde::{Deserialize, Serialize};

/// Binding strength, ordered from weakest to strongest.
///
/// The derived ordering is the rebinding lattice: a binding may only be
/// replaced by one of equal or greater strength.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BindingStrength {
    #[serde(rename = "example")]
    Example,
    #[serde(rename = "preferred")]
    Preferred,
    #[serde(rename = "extensible")]
    Extensible,
    #[serde(rename = "required")]
    Required,
}

impl BindingStrength {
    pub fn as_str(&self) -> &'static str {
        match self {
            BindingStrength::Example => "example",
            BindingStrength::Preferred => "preferred",
            BindingStrength::Extensible => "extensible",
            BindingStrength::Required => "required",
        }
    }

    pub fn parse_str(s: &str) -> Option<Self> {
        match s {
            "example" => Some(BindingStrength::Example),
            "preferred" => Some(BindingStrength::Preferred),
            "extensible" => Some(BindingStrength::Extensible),
            "required" => Some(BindingStrength::Required),
            _ => None,
        }
    }
}

impl std::fmt::Display for BindingStrength {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value set binding on an element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementBinding {
    /// Binding strength: required | extensible | preferred | example
    pub strength: BindingStrength,
    /// Value set URL/canonical, optionally version-suffixed
    #[serde(rename = "valueSet", skip_serializing_if = "Option::is_none")]
    pub value_set: Option<String>,
    /// Human-readable description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ElementBinding {
    pub fn new(strength: BindingStrength) -> Self {
        Self {
            strength,
            value_set: None,
            description: None,
        }
    }

    pub fn with_value_set(mut self, value_set: &str) -> Self {
        self.value_set = Some(value_set.to_string());
        self
    }
}

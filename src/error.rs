use thiserror::Error;

use crate::types::BindingStrength;

#[derive(Error, Debug)]
pub enum FhirShapeError {
    #[error("Invalid element id: {id}")]
    InvalidId { id: String },

    #[error("Invalid mapping: {message}")]
    InvalidMapping { message: String },

    #[error("Type {type_name} is not allowed by any existing type on this element")]
    InvalidType { type_name: String },

    #[error("Definition for type {type_name} could not be resolved")]
    TypeNotFound { type_name: String },

    #[error("Cannot specialize non-abstract type {parent} to {child}")]
    NonAbstractParent { parent: String, child: String },

    #[error("Cannot assign a value at {id}: element does not have exactly one type")]
    NoSingleType { id: String },

    #[error("Value {value} cannot be assigned to an element of type {target}")]
    MismatchedType { value: String, target: String },

    #[error("System {system} identifies a value set, not a code system")]
    MismatchedBindingType { system: String },

    #[error("Cannot assign {requested}: element already carries {existing}")]
    ValueAlreadyAssigned { requested: String, existing: String },

    #[error("Cannot relax fixed value at {id} to a pattern")]
    FixedToPattern { id: String },

    #[error("Invalid URI: {uri}")]
    InvalidUri { uri: String },

    #[error("Cannot weaken binding strength from {current} to {attempted}")]
    BindingStrengthViolation {
        current: BindingStrength,
        attempted: BindingStrength,
    },

    #[error("Cannot bind value set: no coded type among [{types}]")]
    CodedTypeNotFound { types: String },

    #[error(
        "Binding applied to the concept child of CodeableReference element {id}; bind the CodeableReference element itself"
    )]
    CodeableReferenceConcept { id: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),
}

pub type Result<T> = std::result::Result<T, FhirShapeError>;

impl FhirShapeError {
    pub fn invalid_id<S: Into<String>>(id: S) -> Self {
        Self::InvalidId { id: id.into() }
    }

    pub fn invalid_mapping<S: Into<String>>(message: S) -> Self {
        Self::InvalidMapping {
            message: message.into(),
        }
    }

    pub fn invalid_type<S: Into<String>>(type_name: S) -> Self {
        Self::InvalidType {
            type_name: type_name.into(),
        }
    }

    pub fn type_not_found<S: Into<String>>(type_name: S) -> Self {
        Self::TypeNotFound {
            type_name: type_name.into(),
        }
    }

    pub fn non_abstract_parent<S: Into<String>>(parent: S, child: S) -> Self {
        Self::NonAbstractParent {
            parent: parent.into(),
            child: child.into(),
        }
    }

    pub fn no_single_type<S: Into<String>>(id: S) -> Self {
        Self::NoSingleType { id: id.into() }
    }

    pub fn mismatched_type<S: Into<String>>(value: S, target: S) -> Self {
        Self::MismatchedType {
            value: value.into(),
            target: target.into(),
        }
    }

    pub fn mismatched_binding_type<S: Into<String>>(system: S) -> Self {
        Self::MismatchedBindingType {
            system: system.into(),
        }
    }

    pub fn value_already_assigned<S: Into<String>>(requested: S, existing: S) -> Self {
        Self::ValueAlreadyAssigned {
            requested: requested.into(),
            existing: existing.into(),
        }
    }

    pub fn fixed_to_pattern<S: Into<String>>(id: S) -> Self {
        Self::FixedToPattern { id: id.into() }
    }

    pub fn invalid_uri<S: Into<String>>(uri: S) -> Self {
        Self::InvalidUri { uri: uri.into() }
    }

    pub fn coded_type_not_found<S: Into<String>>(types: S) -> Self {
        Self::CodedTypeNotFound {
            types: types.into(),
        }
    }

    pub fn codeable_reference_concept<S: Into<String>>(id: S) -> Self {
        Self::CodeableReferenceConcept { id: id.into() }
    }
}

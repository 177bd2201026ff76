//! fhirshape - FHIR StructureDefinition profiling core.
//!
//! This crate provides:
//! - A structure container with id-indexed element trees (snapshot in,
//!   snapshot + derived differential out)
//! - Path resolution with on-demand unfolding, choice specialization and
//!   slicing
//! - Type narrowing ("only" rules), value assignment (fixed/pattern) and
//!   value set binding
//!
//! # Quick Start
//!
//! ```ignore
//! use fhirshape::{MemoryLookup, StructureDefinition, resolve_path};
//!
//! let lookup = MemoryLookup::new().with(observation_doc);
//! let mut profile = StructureDefinition::from_json(&base_doc, true)?;
//!
//! // Unfolds Observation.code and its CodeableConcept children on demand.
//! let position = resolve_path(&mut profile, "code.coding.system", &lookup);
//! ```
//!
//! # Module Organization
//!
//! - [`types`] - Core type definitions (StructureDefinition, ElementDefinition, etc.)
//! - [`path`] - Path parsing and resolution against a container
//! - [`narrow`] - Type constraint resolution
//! - [`assign`] - Literal value materialization and assignment
//! - [`bind`] - Value set binding with the strength lattice
//! - [`diff`] - Differential tracking against captured baselines
//! - [`lookup`] - The `TypeLookup` capability and an in-memory implementation

pub mod assign;
pub mod bind;
pub mod diff;
pub mod error;
pub mod lookup;
pub mod narrow;
pub mod path;
pub mod types;

// Error exports
pub use error::{FhirShapeError, Result};

// Type exports
pub use types::{
    AssignedValue, BindingStrength, ElementBinding, ElementDefinition, StructureDefinition,
    TypeDescriptor,
};

// Lookup exports
pub use lookup::{DefinitionKind, DefinitionMetadata, MemoryLookup, TypeLookup};

// Operation exports
pub use assign::assign;
pub use assign::value::{LiteralValue, TargetShape};
pub use bind::bind;
pub use narrow::{OnlyCandidate, narrow};
pub use path::{parse_path, resolve_path};

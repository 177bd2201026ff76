//! Literal values and target shapes.
//!
//! The closed set of literal kinds a rule can assign, the closed set of
//! shapes an element can expose, and the compatibility matrix that
//! materializes one onto the other as nested wire JSON.

use serde_json::{Map, Value, json};

use crate::assign::primitives::{
    validate_big_integer, validate_code_string, validate_decimal, validate_integer,
    validate_string_primitive,
};
use crate::error::{FhirShapeError, Result};
use crate::lookup::{DefinitionKind, TypeLookup};
use crate::types::{TypeDescriptor, is_primitive_type, is_quantity_type};

/// A literal value from a parsed assignment rule.
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    Boolean(bool),
    Integer(i64),
    /// Arbitrary-precision integer as its decimal string
    BigInteger(String),
    /// Decimal kept textual until materialization
    Decimal(String),
    String(String),
    Code {
        system: Option<String>,
        code: String,
        display: Option<String>,
    },
    Quantity {
        value: Option<f64>,
        unit: Option<String>,
        system: Option<String>,
        code: Option<String>,
    },
    Ratio {
        numerator: Box<LiteralValue>,
        denominator: Box<LiteralValue>,
    },
    Reference {
        reference: String,
        display: Option<String>,
    },
    /// An inline instance, already in wire form
    Instance(Value),
}

impl LiteralValue {
    /// Short rendering for error messages.
    pub fn describe(&self) -> String {
        match self {
            LiteralValue::Boolean(b) => b.to_string(),
            LiteralValue::Integer(n) => n.to_string(),
            LiteralValue::BigInteger(s) | LiteralValue::Decimal(s) => s.clone(),
            LiteralValue::String(s) => s.clone(),
            LiteralValue::Code { system, code, .. } => match system {
                Some(system) => format!("{code}@{system}"),
                None => format!("#{code}"),
            },
            LiteralValue::Quantity { value, code, .. } => format!(
                "{} '{}'",
                value.map(|v| v.to_string()).unwrap_or_default(),
                code.clone().unwrap_or_default()
            ),
            LiteralValue::Ratio { .. } => "ratio".to_string(),
            LiteralValue::Reference { reference, .. } => format!("Reference({reference})"),
            LiteralValue::Instance(v) => v
                .get("resourceType")
                .and_then(Value::as_str)
                .map(|rt| format!("instance of {rt}"))
                .unwrap_or_else(|| "instance".to_string()),
        }
    }
}

/// The shape an element's single type exposes to assignment.
#[derive(Debug, Clone, PartialEq)]
pub enum TargetShape {
    Primitive(String),
    Coding,
    CodeableConcept,
    /// Quantity or one of its specializations, carrying the concrete code
    Quantity(String),
    Ratio,
    Reference,
    CodeableReference,
    /// Other complex datatype
    Complex(String),
    /// A resource type; the only shape accepting inline instances
    Resource(String),
}

impl TargetShape {
    pub fn is_bare_code(&self) -> bool {
        matches!(self, TargetShape::Primitive(code) if code == "code")
    }

    pub fn code(&self) -> &str {
        match self {
            TargetShape::Primitive(code)
            | TargetShape::Quantity(code)
            | TargetShape::Complex(code)
            | TargetShape::Resource(code) => code,
            TargetShape::Coding => "Coding",
            TargetShape::CodeableConcept => "CodeableConcept",
            TargetShape::Ratio => "Ratio",
            TargetShape::Reference => "Reference",
            TargetShape::CodeableReference => "CodeableReference",
        }
    }
}

/// Classify a type descriptor into its assignment shape. The lookup, when
/// given, distinguishes resource codes from unknown complex types.
pub fn shape_of(descriptor: &TypeDescriptor, lookup: Option<&dyn TypeLookup>) -> TargetShape {
    let code = descriptor.code.as_str();
    if is_primitive_type(code) {
        return TargetShape::Primitive(code.to_string());
    }
    if is_quantity_type(code) {
        return TargetShape::Quantity(code.to_string());
    }
    match code {
        "Coding" => TargetShape::Coding,
        "CodeableConcept" => TargetShape::CodeableConcept,
        "Ratio" => TargetShape::Ratio,
        "Reference" => TargetShape::Reference,
        "CodeableReference" => TargetShape::CodeableReference,
        _ => {
            let is_resource = lookup
                .and_then(|l| {
                    l.fetch(code, &[DefinitionKind::Resource, DefinitionKind::Logical])
                })
                .is_some();
            if is_resource {
                TargetShape::Resource(code.to_string())
            } else {
                TargetShape::Complex(code.to_string())
            }
        }
    }
}

fn coding_json(system: &Option<String>, code: &str, display: &Option<String>) -> Value {
    let mut map = Map::new();
    if let Some(system) = system {
        map.insert("system".into(), json!(system.split('|').next().unwrap_or(system)));
        if let Some(version) = system.split_once('|').map(|(_, v)| v) {
            map.insert("version".into(), json!(version));
        }
    }
    map.insert("code".into(), json!(code));
    if let Some(display) = display {
        map.insert("display".into(), json!(display));
    }
    Value::Object(map)
}

fn quantity_json(
    value: &Option<f64>,
    unit: &Option<String>,
    system: &Option<String>,
    code: &Option<String>,
) -> Value {
    let mut map = Map::new();
    if let Some(value) = value {
        map.insert("value".into(), json!(value));
    }
    if let Some(unit) = unit {
        map.insert("unit".into(), json!(unit));
    }
    if let Some(system) = system {
        map.insert("system".into(), json!(system));
    }
    if let Some(code) = code {
        map.insert("code".into(), json!(code));
    }
    Value::Object(map)
}

/// Materialize a literal onto a target shape, producing the value to store
/// under `fixed<Type>`/`pattern<Type>`. Incompatible pairs are
/// `MismatchedType`.
pub fn materialize(value: &LiteralValue, shape: &TargetShape) -> Result<Value> {
    let mismatch = || FhirShapeError::mismatched_type(value.describe(), shape.code().to_string());

    match (value, shape) {
        (LiteralValue::Boolean(b), TargetShape::Primitive(code)) if code == "boolean" => {
            Ok(json!(b))
        }
        (LiteralValue::Integer(n), TargetShape::Primitive(code)) => validate_integer(code, *n),
        (LiteralValue::BigInteger(raw), TargetShape::Primitive(code)) => {
            validate_big_integer(code, raw)
        }
        (LiteralValue::Decimal(raw), TargetShape::Primitive(code)) => validate_decimal(code, raw),
        (LiteralValue::String(raw), shape) if shape.is_bare_code() => validate_code_string(raw),
        (LiteralValue::String(raw), TargetShape::Primitive(code)) => {
            if code == "boolean" || code == "decimal" || code == "integer" {
                Err(mismatch())
            } else {
                validate_string_primitive(code, raw)
            }
        }
        (LiteralValue::Code { code, .. }, shape) if shape.is_bare_code() => {
            validate_code_string(code)
        }
        (
            LiteralValue::Code {
                system,
                code,
                display,
            },
            TargetShape::Coding,
        ) => Ok(coding_json(system, code, display)),
        (
            LiteralValue::Code {
                system,
                code,
                display,
            },
            TargetShape::CodeableConcept,
        ) => Ok(json!({ "coding": [coding_json(system, code, display)] })),
        (
            LiteralValue::Code {
                system,
                code,
                display,
            },
            TargetShape::Quantity(_),
        ) => {
            // A coded value on a quantity constrains its units.
            let mut map = Map::new();
            if let Some(display) = display {
                map.insert("unit".into(), json!(display));
            }
            if let Some(system) = system {
                map.insert("system".into(), json!(system.split('|').next().unwrap_or(system)));
            }
            map.insert("code".into(), json!(code));
            Ok(Value::Object(map))
        }
        (
            LiteralValue::Quantity {
                value,
                unit,
                system,
                code,
            },
            TargetShape::Quantity(_),
        ) => Ok(quantity_json(value, unit, system, code)),
        (LiteralValue::Ratio { numerator, denominator }, TargetShape::Ratio) => {
            let quantity_shape = TargetShape::Quantity("Quantity".to_string());
            Ok(json!({
                "numerator": materialize(numerator, &quantity_shape)?,
                "denominator": materialize(denominator, &quantity_shape)?,
            }))
        }
        (LiteralValue::Reference { reference, display }, TargetShape::Reference) => {
            let mut map = Map::new();
            map.insert("reference".into(), json!(reference));
            if let Some(display) = display {
                map.insert("display".into(), json!(display));
            }
            Ok(Value::Object(map))
        }
        (LiteralValue::Reference { reference, display }, TargetShape::CodeableReference) => {
            let mut map = Map::new();
            map.insert("reference".into(), json!(reference));
            if let Some(display) = display {
                map.insert("display".into(), json!(display));
            }
            Ok(json!({ "reference": Value::Object(map) }))
        }
        (LiteralValue::Instance(doc), TargetShape::Resource(_)) => Ok(doc.clone()),
        _ => Err(mismatch()),
    }
}

//! Primitive value validation and normalization.
//!
//! Each string-shaped primitive has a dedicated matcher; numeric primitives
//! get bound checks. Matchers follow the FHIR datatype grammars.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Value, json};
use url::Url;

use crate::error::{FhirShapeError, Result};

static ID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9\-\.]{1,64}$").expect("valid regex"));
static OID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^urn:oid:[0-2](\.(0|[1-9][0-9]*))+$").expect("valid regex"));
static UUID_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^urn:uuid:[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}$")
        .expect("valid regex")
});
static DATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([0-9]([0-9]([0-9][1-9]|[1-9]0)|[1-9]00)|[1-9]000)(-(0[1-9]|1[0-2])(-(0[1-9]|[1-2][0-9]|3[0-1]))?)?$")
        .expect("valid regex")
});
static DATE_TIME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([0-9]([0-9]([0-9][1-9]|[1-9]0)|[1-9]00)|[1-9]000)(-(0[1-9]|1[0-2])(-(0[1-9]|[1-2][0-9]|3[0-1])(T([01][0-9]|2[0-3]):[0-5][0-9]:([0-5][0-9]|60)(\.[0-9]+)?(Z|(\+|-)((0[0-9]|1[0-3]):[0-5][0-9]|14:00))?)?)?)?$")
        .expect("valid regex")
});
static INSTANT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([0-9]([0-9]([0-9][1-9]|[1-9]0)|[1-9]00)|[1-9]000)-(0[1-9]|1[0-2])-(0[1-9]|[1-2][0-9]|3[0-1])T([01][0-9]|2[0-3]):[0-5][0-9]:([0-5][0-9]|60)(\.[0-9]+)?(Z|(\+|-)((0[0-9]|1[0-3]):[0-5][0-9]|14:00))$")
        .expect("valid regex")
});
static TIME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([01][0-9]|2[0-3]):[0-5][0-9]:([0-5][0-9]|60)(\.[0-9]+)?$").expect("valid regex")
});
static BASE64_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\s*[0-9a-zA-Z\+/=]{4}\s*)+$").expect("valid regex"));
static CODE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[^\s]+(\s[^\s]+)*$").expect("valid regex"));
static INTEGER64_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^-?(0|[1-9][0-9]*)$").expect("valid regex"));
static DECIMAL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^-?(0|[1-9][0-9]*)(\.[0-9]+)?([eE][+-]?[0-9]+)?$").expect("valid regex")
});
static XHTML_DIV_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^<div( [^>]*)?>.*</div>$").expect("valid regex"));

/// Whether a string is a usable system/value-set URI: absolute (including
/// `urn:` forms) or a local fragment.
pub fn is_usable_uri(uri: &str) -> bool {
    uri.starts_with('#') || Url::parse(uri).is_ok()
}

/// Validate and normalize a string destined for a string-shaped primitive.
pub fn validate_string_primitive(code: &str, raw: &str) -> Result<Value> {
    let ok = match code {
        "string" | "markdown" => !raw.is_empty(),
        "id" => ID_RE.is_match(raw),
        "oid" => OID_RE.is_match(raw),
        "uuid" => UUID_RE.is_match(raw),
        "date" => DATE_RE.is_match(raw),
        "dateTime" => DATE_TIME_RE.is_match(raw),
        "instant" => INSTANT_RE.is_match(raw),
        "time" => TIME_RE.is_match(raw),
        "base64Binary" => BASE64_RE.is_match(raw),
        "uri" => !raw.contains(char::is_whitespace),
        "url" | "canonical" => {
            let unversioned = raw.split('|').next().unwrap_or(raw);
            is_usable_uri(unversioned)
        }
        "xhtml" => return validate_xhtml(raw),
        _ => false,
    };
    if ok {
        Ok(json!(raw))
    } else {
        Err(FhirShapeError::mismatched_type(raw, code))
    }
}

/// xhtml requires a well-formed root `<div>`; interior whitespace collapses.
fn validate_xhtml(raw: &str) -> Result<Value> {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if XHTML_DIV_RE.is_match(&collapsed) {
        Ok(json!(collapsed))
    } else {
        Err(FhirShapeError::mismatched_type(raw, "xhtml"))
    }
}

/// Validate an integer against a numeric primitive's bounds.
pub fn validate_integer(code: &str, n: i64) -> Result<Value> {
    let ok = match code {
        "integer" => i32::try_from(n).is_ok(),
        "unsignedInt" => (0..=i64::from(i32::MAX)).contains(&n),
        "positiveInt" => (1..=i64::from(i32::MAX)).contains(&n),
        "integer64" => true,
        "decimal" => true,
        _ => false,
    };
    if !ok {
        return Err(FhirShapeError::mismatched_type(
            n.to_string(),
            code.to_string(),
        ));
    }
    if code == "integer64" {
        // integer64 rides the wire as a string to stay lossless.
        Ok(json!(n.to_string()))
    } else {
        Ok(json!(n))
    }
}

/// An arbitrary-precision integer stays a decimal string, never parsed into
/// a float.
pub fn validate_big_integer(code: &str, raw: &str) -> Result<Value> {
    if code != "integer64" || !INTEGER64_RE.is_match(raw) {
        return Err(FhirShapeError::mismatched_type(raw, code));
    }
    Ok(json!(raw))
}

pub fn validate_decimal(code: &str, raw: &str) -> Result<Value> {
    if code != "decimal" || !DECIMAL_RE.is_match(raw) {
        return Err(FhirShapeError::mismatched_type(raw, code));
    }
    let parsed: Value = serde_json::from_str(raw)?;
    Ok(parsed)
}

pub fn validate_code_string(raw: &str) -> Result<Value> {
    if CODE_RE.is_match(raw) {
        Ok(json!(raw))
    } else {
        Err(FhirShapeError::mismatched_type(raw, "code"))
    }
}

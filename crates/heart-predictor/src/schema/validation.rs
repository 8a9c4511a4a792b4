//! Field-level validation primitives.
//!
//! Each field kind has its own reader; the reader records every violation it
//! sees instead of stopping at the first one, so a single bad request can be
//! answered with the complete list of problems.

use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;

/// Where a violation was found in the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Location {
    Path,
    Body,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    Missing,
    TypeError,
    RangeError,
    LiteralError,
    JsonInvalid,
}

/// One violated field: `loc` is `[location, field]`, `msg` is human readable.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    pub loc: (Location, String),
    pub msg: String,
    #[serde(rename = "type")]
    pub kind: ViolationKind,
}

impl FieldError {
    pub fn body(field: &str, kind: ViolationKind, msg: impl Into<String>) -> Self {
        Self {
            loc: (Location::Body, field.to_string()),
            msg: msg.into(),
            kind,
        }
    }

    pub fn path(field: &str, kind: ViolationKind, msg: impl Into<String>) -> Self {
        Self {
            loc: (Location::Path, field.to_string()),
            msg: msg.into(),
            kind,
        }
    }

    pub fn field(&self) -> &str {
        &self.loc.1
    }
}

/// Aggregate of every violation found while validating one request.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    errors: Vec<FieldError>,
}

impl ValidationError {
    pub fn new(errors: Vec<FieldError>) -> Self {
        Self { errors }
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<FieldError> {
        self.errors
    }

    /// True when some violation names `field`.
    pub fn mentions(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field() == field)
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} field(s) failed validation", self.errors.len())?;
        for err in &self.errors {
            write!(f, "; {}: {}", err.field(), err.msg)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// A closed set of string literals accepted for a categorical field.
pub trait Categorical: Sized + Copy + 'static {
    const VARIANTS: &'static [Self];

    fn as_str(&self) -> &'static str;

    /// Exact, case-sensitive match against the permitted literals.
    fn parse_exact(raw: &str) -> Option<Self> {
        Self::VARIANTS.iter().copied().find(|v| v.as_str() == raw)
    }

    fn permitted() -> String {
        Self::VARIANTS
            .iter()
            .map(|v| format!("'{}'", v.as_str()))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Inclusive numeric bounds for a field.
#[derive(Debug, Clone, Copy)]
pub struct Bounds {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl Bounds {
    pub const fn at_least(min: f64) -> Self {
        Self { min: Some(min), max: None }
    }

    pub const fn between(min: f64, max: f64) -> Self {
        Self { min: Some(min), max: Some(max) }
    }

    pub const fn unbounded() -> Self {
        Self { min: None, max: None }
    }
}

/// Reads typed fields out of an untyped JSON object, collecting violations.
pub struct FieldReader<'a> {
    map: &'a Map<String, Value>,
    errors: Vec<FieldError>,
}

impl<'a> FieldReader<'a> {
    pub fn new(map: &'a Map<String, Value>) -> Self {
        Self {
            map,
            errors: Vec::new(),
        }
    }

    fn required(&mut self, field: &str) -> Option<&'a Value> {
        match self.map.get(field) {
            Some(Value::Null) | None => {
                self.errors
                    .push(FieldError::body(field, ViolationKind::Missing, "field required"));
                None
            }
            Some(value) => Some(value),
        }
    }

    /// Integer or float, within `bounds`. Strings and booleans are rejected.
    pub fn number(&mut self, field: &str, bounds: Bounds) -> Option<f64> {
        let value = self.required(field)?;
        let Some(n) = value.as_f64().filter(|n| n.is_finite()) else {
            self.errors.push(FieldError::body(
                field,
                ViolationKind::TypeError,
                "value is not a valid number",
            ));
            return None;
        };

        if let Some(min) = bounds.min {
            if n < min {
                self.errors.push(FieldError::body(
                    field,
                    ViolationKind::RangeError,
                    format!("ensure this value is greater than or equal to {}", min),
                ));
                return None;
            }
        }
        if let Some(max) = bounds.max {
            if n > max {
                self.errors.push(FieldError::body(
                    field,
                    ViolationKind::RangeError,
                    format!("ensure this value is less than or equal to {}", max),
                ));
                return None;
            }
        }
        Some(n)
    }

    /// String literal from the closed set `T::VARIANTS`.
    pub fn category<T: Categorical>(&mut self, field: &str) -> Option<T> {
        let value = self.required(field)?;
        let parsed = value.as_str().and_then(T::parse_exact);
        if parsed.is_none() {
            self.errors.push(FieldError::body(
                field,
                ViolationKind::LiteralError,
                format!("unexpected value; permitted: {}", T::permitted()),
            ));
        }
        parsed
    }

    /// Numeric literal from `permitted`; an integral float like `1.0` matches `1`.
    pub fn integer_literal(&mut self, field: &str, permitted: &[i64]) -> Option<i64> {
        let value = self.required(field)?;
        let parsed = match value {
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
                .filter(|i| permitted.contains(i)),
            _ => None,
        };
        if parsed.is_none() {
            let allowed = permitted
                .iter()
                .map(|p| p.to_string())
                .collect::<Vec<_>>()
                .join(", ");
            self.errors.push(FieldError::body(
                field,
                ViolationKind::LiteralError,
                format!("unexpected value; permitted: {}", allowed),
            ));
        }
        parsed
    }

    /// Record a violation found by a field-specific check.
    pub fn push(&mut self, error: FieldError) {
        self.errors.push(error);
    }

    pub fn finish(self) -> Vec<FieldError> {
        self.errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_number_accepts_int_and_float() {
        let body = json!({"a": 3, "b": 2.5});
        let map = body.as_object().unwrap();
        let mut reader = FieldReader::new(map);
        assert_eq!(reader.number("a", Bounds::at_least(0.0)), Some(3.0));
        assert_eq!(reader.number("b", Bounds::at_least(0.0)), Some(2.5));
        assert!(reader.finish().is_empty());
    }

    #[test]
    fn test_number_rejects_string_and_bool() {
        let body = json!({"a": "3", "b": true});
        let map = body.as_object().unwrap();
        let mut reader = FieldReader::new(map);
        assert_eq!(reader.number("a", Bounds::at_least(0.0)), None);
        assert_eq!(reader.number("b", Bounds::at_least(0.0)), None);
        let errors = reader.finish();
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().all(|e| e.kind == ViolationKind::TypeError));
    }

    #[test]
    fn test_null_counts_as_missing() {
        let body = json!({"a": null});
        let map = body.as_object().unwrap();
        let mut reader = FieldReader::new(map);
        assert_eq!(reader.number("a", Bounds::at_least(0.0)), None);
        assert_eq!(reader.finish()[0].kind, ViolationKind::Missing);
    }

    #[test]
    fn test_integer_literal() {
        let body = json!({"a": 1.0, "b": 2, "c": "1"});
        let map = body.as_object().unwrap();
        let mut reader = FieldReader::new(map);
        assert_eq!(reader.integer_literal("a", &[0, 1]), Some(1));
        assert_eq!(reader.integer_literal("b", &[0, 1]), None);
        assert_eq!(reader.integer_literal("c", &[0, 1]), None);
        assert_eq!(reader.finish().len(), 2);
    }

    #[test]
    fn test_field_error_serializes_loc_as_pair() {
        let err = FieldError::path("model_name", ViolationKind::LiteralError, "bad");
        let v = serde_json::to_value(&err).unwrap();
        assert_eq!(v["loc"], json!(["path", "model_name"]));
        assert_eq!(v["type"], json!("literal_error"));
    }
}

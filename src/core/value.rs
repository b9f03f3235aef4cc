//! Scalar values and the backend field-type vocabulary.
//!
//! Raw row data arrives as text keyed by backend field name; every parse in
//! this module uses a fixed, locale-independent format so the result does not
//! depend on the host environment.

use crate::core::error::{EngineError, EngineResult};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Wire format for datetime columns.
pub const DATE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Type tag carried by every mapped backend field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldType {
    Boolean,
    DateTime,
    Counter,
    Number,
    Integer,
    Url,
    Text,
    Lookup,
    LookupMulti,
    Choice,
    MultiChoice,
}

impl FieldType {
    /// Whether this tag denotes a foreign-key reference into another list.
    pub fn is_lookup(&self) -> bool {
        matches!(self, FieldType::Lookup | FieldType::LookupMulti)
    }

    /// Whether this tag denotes a flags-style token set.
    pub fn is_choice(&self) -> bool {
        matches!(self, FieldType::Choice | FieldType::MultiChoice)
    }
}

/// A typed scalar cell value.
///
/// Counter and integer columns both map to `Int`; url columns map to `Text`.
/// The distinction survives in [`FieldType`], which drives parsing.
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    DateTime(NaiveDateTime),
}

impl ScalarValue {
    /// Parse a raw text cell according to the field's type tag.
    ///
    /// Lookup and choice tags are rejected here; those raw forms are
    /// structured and decoded by the entity materializer instead.
    pub fn parse(field_type: FieldType, raw: &str) -> EngineResult<ScalarValue> {
        match field_type {
            FieldType::Boolean => match raw {
                "1" => Ok(ScalarValue::Bool(true)),
                "0" => Ok(ScalarValue::Bool(false)),
                other => match other.to_ascii_lowercase().as_str() {
                    "true" => Ok(ScalarValue::Bool(true)),
                    "false" => Ok(ScalarValue::Bool(false)),
                    _ => Err(EngineError::shape(format!("invalid boolean value '{raw}'"))),
                },
            },
            FieldType::Counter | FieldType::Integer => raw
                .trim()
                .parse::<i64>()
                .map(ScalarValue::Int)
                .map_err(|_| EngineError::shape(format!("invalid integer value '{raw}'"))),
            FieldType::Number => raw
                .trim()
                .parse::<f64>()
                .map(ScalarValue::Float)
                .map_err(|_| EngineError::shape(format!("invalid number value '{raw}'"))),
            FieldType::DateTime => NaiveDateTime::parse_from_str(raw.trim(), DATE_TIME_FORMAT)
                .map(ScalarValue::DateTime)
                .map_err(|_| EngineError::shape(format!("invalid datetime value '{raw}'"))),
            FieldType::Url | FieldType::Text => Ok(ScalarValue::Text(raw.to_string())),
            FieldType::Lookup
            | FieldType::LookupMulti
            | FieldType::Choice
            | FieldType::MultiChoice => Err(EngineError::shape(format!(
                "field type {field_type:?} has no scalar form"
            ))),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ScalarValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            ScalarValue::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ScalarValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarValue::Bool(b) => write!(f, "{b}"),
            ScalarValue::Int(n) => write!(f, "{n}"),
            ScalarValue::Float(x) => write!(f, "{x}"),
            ScalarValue::Text(s) => write!(f, "'{s}'"),
            ScalarValue::DateTime(dt) => write!(f, "{}", dt.format(DATE_TIME_FORMAT)),
        }
    }
}

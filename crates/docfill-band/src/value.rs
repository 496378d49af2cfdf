//! Parameter values carried by report bands

use serde::{Deserialize, Serialize};

/// A single report parameter value.
///
/// Values keep their runtime type until formatting time so that field
/// formats and alias transforms can be applied per type. A `Null`
/// value is valid and renders as empty text; an absent parameter is an
/// error at fill time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParameterValue {
    /// Present but empty; renders as ""
    Null,
    /// Plain text
    Text(String),
    /// Whole number
    Integer(i64),
    /// Floating point number
    Decimal(f64),
    /// Boolean flag
    Boolean(bool),
    /// Date/time, pre-rendered or ISO-8601; field formats may reshape it
    Date(String),
    /// Opaque rich-content payload, claimed by a content inliner
    Content(Vec<u8>),
}

impl ParameterValue {
    /// Whether this value is `Null`
    pub fn is_null(&self) -> bool {
        matches!(self, ParameterValue::Null)
    }
}

impl From<&str> for ParameterValue {
    fn from(s: &str) -> Self {
        ParameterValue::Text(s.to_string())
    }
}

impl From<String> for ParameterValue {
    fn from(s: String) -> Self {
        ParameterValue::Text(s)
    }
}

impl From<i64> for ParameterValue {
    fn from(n: i64) -> Self {
        ParameterValue::Integer(n)
    }
}

impl From<f64> for ParameterValue {
    fn from(n: f64) -> Self {
        ParameterValue::Decimal(n)
    }
}

impl From<bool> for ParameterValue {
    fn from(b: bool) -> Self {
        ParameterValue::Boolean(b)
    }
}

//! Request validation from per-resource required-field policies.

use crate::config::{Presence, RequiredField};
use crate::error::AppError;
use crate::service::messages;
use serde_json::Value;

/// JSON truthiness: `null`, `false`, `0` and `""` are falsy, everything else is truthy.
pub fn is_truthy(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

impl Presence {
    pub fn satisfied_by(&self, v: Option<&Value>) -> bool {
        match (self, v) {
            (_, None) => false,
            (Presence::Truthy, Some(v)) => is_truthy(v),
            (Presence::Present, Some(_)) => true,
            (Presence::NonNull, Some(Value::Null)) => false,
            (Presence::NonNull, Some(Value::String(s))) => !s.is_empty(),
            (Presence::NonNull, Some(_)) => true,
        }
    }
}

pub struct RequestValidator;

impl RequestValidator {
    /// Validate a single object or every element of an array. Non-object
    /// elements fail. The error names every required field of the resource.
    pub fn validate(payload: &Value, required: &[RequiredField]) -> Result<(), AppError> {
        if required.is_empty() {
            return Ok(());
        }
        let ok = match payload {
            Value::Array(items) => items.iter().all(|item| Self::item_passes(item, required)),
            item => Self::item_passes(item, required),
        };
        if ok {
            Ok(())
        } else {
            let names: Vec<&str> = required.iter().map(|r| r.field.as_str()).collect();
            Err(AppError::Validation(messages::required_fields(&names)))
        }
    }

    fn item_passes(item: &Value, required: &[RequiredField]) -> bool {
        match item.as_object() {
            Some(obj) => required.iter().all(|r| r.policy.satisfied_by(obj.get(&r.field))),
            None => false,
        }
    }
}

//! Schema driven validation of call parameters.
//!
//! A schema is an ordered list of [`FieldSchema`], validation stops at the first violation and
//! never touches the validated data.

use crate::payload::{Object, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    String,
    Number,
    Boolean,
    Array,
    /// Raw binary data, see [`Value::Buffer`]
    ArrayBuffer,
    Object,
}

impl FieldType {
    fn matches(&self, value: &Value) -> bool {
        matches!(
            (self, value),
            (FieldType::String, Value::String(_))
                | (FieldType::Number, Value::Number(_))
                | (FieldType::Boolean, Value::Bool(_))
                | (FieldType::Array, Value::Array(_))
                | (FieldType::ArrayBuffer, Value::Buffer(_))
                | (FieldType::Object, Value::Object(_))
        )
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldType::String => write!(f, "string"),
            FieldType::Number => write!(f, "number"),
            FieldType::Boolean => write!(f, "boolean"),
            FieldType::Array => write!(f, "array"),
            FieldType::ArrayBuffer => write!(f, "array-buffer"),
            FieldType::Object => write!(f, "object"),
        }
    }
}

/// Constraints on one field of a parameter object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSchema {
    pub name: &'static str,

    /// When `None` any kind of value is accepted
    pub ty: Option<FieldType>,

    /// The field must be present and not null
    pub obligatory: bool,

    /// Arrays and buffers may have zero length
    pub allow_empty: bool,
}

impl FieldSchema {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            ty: None,
            obligatory: false,
            allow_empty: false,
        }
    }

    pub const fn typed(self, ty: FieldType) -> Self {
        Self {
            ty: Some(ty),
            ..self
        }
    }

    pub const fn obligatory(self) -> Self {
        Self {
            obligatory: true,
            ..self
        }
    }

    pub const fn allow_empty(self) -> Self {
        Self {
            allow_empty: true,
            ..self
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Parameter \"{field}\" is missing")]
    MissingField { field: String },

    #[error("Parameter \"{field}\" has invalid type. \"{expected}\" expected, \"{found}\" found")]
    WrongType {
        field: String,
        expected: FieldType,
        found: &'static str,
    },

    #[error("Parameter \"{field}\" is empty")]
    EmptyValue { field: String },
}

impl ValidationError {
    /// The name of the offending field
    pub fn field(&self) -> &str {
        match self {
            ValidationError::MissingField { field }
            | ValidationError::WrongType { field, .. }
            | ValidationError::EmptyValue { field } => field,
        }
    }
}

/// Check `params` against `schema`, reporting the first violated field.
///
/// A `null` value counts as absent.
pub fn validate_params(params: &Object, schema: &[FieldSchema]) -> Result<(), ValidationError> {
    for field in schema {
        let value = match params.get(field.name).filter(|v| !v.is_null()) {
            Some(value) => value,
            None if field.obligatory => {
                return Err(ValidationError::MissingField {
                    field: field.name.to_string(),
                })
            }
            None => continue,
        };

        let Some(ty) = field.ty else {
            continue;
        };
        if !ty.matches(value) {
            return Err(ValidationError::WrongType {
                field: field.name.to_string(),
                expected: ty,
                found: value.kind(),
            });
        }

        let is_empty = match value {
            Value::Array(v) => v.is_empty(),
            Value::Buffer(b) => b.is_empty(),
            _ => false,
        };
        if is_empty && !field.allow_empty {
            return Err(ValidationError::EmptyValue {
                field: field.name.to_string(),
            });
        }
    }
    Ok(())
}

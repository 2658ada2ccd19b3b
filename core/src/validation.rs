// crudflow/src/validation.rs

//! Declarative checks of a `Params` map against an ordered list of field rules.

use crate::core::step::Step;
use crate::crud::store::Params;
use crate::error::CrudError;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::{event, Level};

/// Primitive JSON type a field is expected to carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
  String,
  Number,
  Boolean,
  Object,
  Array,
}

impl FieldType {
  pub fn matches(&self, value: &Value) -> bool {
    matches!(
      (self, value),
      (FieldType::String, Value::String(_))
        | (FieldType::Number, Value::Number(_))
        | (FieldType::Boolean, Value::Bool(_))
        | (FieldType::Object, Value::Object(_))
        | (FieldType::Array, Value::Array(_))
    )
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      FieldType::String => "string",
      FieldType::Number => "number",
      FieldType::Boolean => "boolean",
      FieldType::Object => "object",
      FieldType::Array => "array",
    }
  }
}

impl fmt::Display for FieldType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// What was actually found in place of an expected field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
  Missing,
  Null,
  String,
  Number,
  Boolean,
  Object,
  Array,
}

impl ValueKind {
  pub fn of(value: Option<&Value>) -> Self {
    match value {
      None => ValueKind::Missing,
      Some(Value::Null) => ValueKind::Null,
      Some(Value::String(_)) => ValueKind::String,
      Some(Value::Number(_)) => ValueKind::Number,
      Some(Value::Bool(_)) => ValueKind::Boolean,
      Some(Value::Object(_)) => ValueKind::Object,
      Some(Value::Array(_)) => ValueKind::Array,
    }
  }
}

impl fmt::Display for ValueKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let label = match self {
      ValueKind::Missing => "missing",
      ValueKind::Null => "null",
      ValueKind::String => "string",
      ValueKind::Number => "number",
      ValueKind::Boolean => "boolean",
      ValueKind::Object => "object",
      ValueKind::Array => "array",
    };
    f.write_str(label)
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRule {
  pub field: String,
  pub field_type: FieldType,
  pub required: bool,
}

/// Ordered field rules; the first violated rule is reported and the rest are not checked.
///
/// ```
/// use crudflow::{FieldType, Validator};
/// use serde_json::json;
///
/// let validator = Validator::new()
///   .required("id", FieldType::String)
///   .optional("limit", FieldType::Number);
///
/// let ok = json!({ "id": "a1", "limit": 5 });
/// assert!(validator.validate(ok.as_object().unwrap()).is_ok());
///
/// let err = validator.validate(json!({ "limit": 5 }).as_object().unwrap()).unwrap_err();
/// assert_eq!(err.field(), Some("id"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Validator {
  rules: Vec<FieldRule>,
}

impl Validator {
  pub fn new() -> Self {
    Self::default()
  }

  /// The field must be present, non-null and of `field_type`.
  pub fn required(mut self, field: impl Into<String>, field_type: FieldType) -> Self {
    self.rules.push(FieldRule {
      field: field.into(),
      field_type,
      required: true,
    });
    self
  }

  /// The field may be absent or `null`; otherwise it must be of `field_type`.
  pub fn optional(mut self, field: impl Into<String>, field_type: FieldType) -> Self {
    self.rules.push(FieldRule {
      field: field.into(),
      field_type,
      required: false,
    });
    self
  }

  pub fn rules(&self) -> &[FieldRule] {
    &self.rules
  }

  pub fn validate(&self, params: &Params) -> Result<(), CrudError> {
    for rule in &self.rules {
      let value = params.get(&rule.field);
      let passes = match value {
        None | Some(Value::Null) => !rule.required,
        Some(v) => rule.field_type.matches(v),
      };
      if !passes {
        let actual = ValueKind::of(value);
        event!(Level::DEBUG, field = %rule.field, expected = %rule.field_type, %actual, "Params failed validation.");
        return Err(CrudError::Validation {
          field: rule.field.clone(),
          expected: rule.field_type,
          actual,
        });
      }
    }
    Ok(())
  }

  /// A pass-through step: yields the params unchanged when they validate.
  pub fn into_step<E>(self) -> Step<Params, Params, E>
  where
    E: From<CrudError> + Send + 'static,
  {
    Arc::new(move |params| {
      let verdict = self.validate(&params);
      Box::pin(async move {
        match verdict {
          Ok(()) => Ok(params),
          Err(e) => Err(E::from(e)),
        }
      })
    })
  }
}

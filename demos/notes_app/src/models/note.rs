// demos/notes_app/src/models/note.rs

use chrono::{DateTime, Utc};
use crudflow::{CrudError, Entity, FieldType, Params, ValueKind};
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Serialize)]
pub struct Note {
  pub id: String,
  pub title: String,
  pub body: String,
  pub tags: Vec<String>,
  pub pinned: bool,
  pub author_email: Option<String>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl Note {
  pub fn new() -> Self {
    let now = Utc::now();
    Self {
      id: String::new(),
      title: String::new(),
      body: String::new(),
      tags: Vec::new(),
      pinned: false,
      author_email: None,
      created_at: now,
      updated_at: now,
    }
  }

  pub fn has_tag(&self, tag: &str) -> bool {
    self.tags.iter().any(|t| t == tag)
  }
}

fn mismatch(field: &str, expected: FieldType, value: &Value) -> CrudError {
  CrudError::Validation {
    field: field.to_string(),
    expected,
    actual: ValueKind::of(Some(value)),
  }
}

fn as_string(field: &str, value: &Value) -> Result<String, CrudError> {
  value
    .as_str()
    .map(str::to_string)
    .ok_or_else(|| mismatch(field, FieldType::String, value))
}

impl Entity for Note {
  fn id(&self) -> &str {
    &self.id
  }

  fn apply_fields(&mut self, fields: &Params) -> Result<(), CrudError> {
    for (key, value) in fields {
      match key.as_str() {
        "id" => self.id = as_string(key, value)?,
        "title" => self.title = as_string(key, value)?,
        "body" => self.body = as_string(key, value)?,
        "pinned" => self.pinned = value.as_bool().ok_or_else(|| mismatch(key, FieldType::Boolean, value))?,
        "author_email" => {
          self.author_email = match value {
            Value::Null => None,
            other => Some(as_string(key, other)?),
          }
        }
        "tags" => {
          let items = value.as_array().ok_or_else(|| mismatch(key, FieldType::Array, value))?;
          self.tags = items
            .iter()
            .map(|tag| as_string(key, tag))
            .collect::<Result<Vec<_>, _>>()?;
        }
        other => tracing::debug!(field = other, "Ignoring unknown note field."),
      }
    }
    Ok(())
  }
}

// crudflow/src/error.rs
use anyhow::Error as AnyhowError;
use thiserror::Error;

use crate::crud::config::HookPoint;
use crate::validation::{FieldType, ValueKind};

/// Errors raised by the engine itself.
///
/// Pipelines are generic over their error type `E` and only require
/// `E: From<CrudError>`, so errors produced by a store or by a caller-supplied
/// hook reach the caller unchanged. `CrudError` is also usable directly as
/// that `E` when an application has no error type of its own.
#[derive(Debug, Error)]
pub enum CrudError {
  #[error("Validation failed for field '{field}': expected {expected}, found {actual}")]
  Validation {
    field: String,
    expected: FieldType,
    actual: ValueKind,
  },

  #[error("Store operation failed: {source}")]
  Store {
    #[source]
    source: AnyhowError,
  },

  #[error("Hook '{hook}' failed: {source}")]
  Hook {
    hook: HookPoint,
    #[source]
    source: AnyhowError,
  },

  #[error("Internal crudflow error: {0}")]
  Internal(String),
}

impl CrudError {
  /// Name of the offending field for validation failures.
  pub fn field(&self) -> Option<&str> {
    match self {
      CrudError::Validation { field, .. } => Some(field),
      _ => None,
    }
  }

  pub fn is_validation(&self) -> bool {
    matches!(self, CrudError::Validation { .. })
  }

  /// Tags a failure raised inside a caller-supplied hook.
  pub fn hook(hook: HookPoint, source: impl Into<AnyhowError>) -> Self {
    CrudError::Hook {
      hook,
      source: source.into(),
    }
  }
}

impl From<AnyhowError> for CrudError {
  fn from(err: AnyhowError) -> Self {
    // Unwrap a CrudError that was boxed into anyhow on its way up instead of nesting it.
    match err.downcast::<CrudError>() {
      Ok(crud_err) => crud_err,
      Err(source) => CrudError::Store { source },
    }
  }
}

pub type CrudResult<T, E = CrudError> = std::result::Result<T, E>;

// demos/notes_app/src/errors.rs

use crudflow::CrudError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Note Store Error: {0}")]
  Store(String),

  #[error("Crudflow Error: {source}")]
  Crud {
    #[from] // Validation, hook and engine failures raised inside the pipelines
    source: CrudError,
  },
}

impl AppError {
  /// Field name for validation failures, so callers can point at the bad input.
  pub fn invalid_field(&self) -> Option<&str> {
    match self {
      AppError::Crud { source } => source.field(),
      _ => None,
    }
  }
}

// Define a Result type alias for the application
pub type Result<T, E = AppError> = std::result::Result<T, E>;

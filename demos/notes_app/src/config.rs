// demos/notes_app/src/config.rs

use crate::errors::{AppError, Result};
use crudflow::{FindSort, SortDirection};
use dotenvy::dotenv;
use std::env;

#[derive(Debug, Clone)]
pub struct AppConfig {
  /// Notes created before the scripted run starts.
  pub seed_count: usize,
  /// Largest page `find` may return; also the page size used by the script.
  pub page_size: u64,
  /// Applied when a find request carries no usable sort.
  pub default_sort: FindSort,
  pub log_filter: String,
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok(); // Load .env file if present

    let get_env = |var_name: &str| env::var(var_name).ok();

    let seed_count = get_env("NOTES_SEED_COUNT")
      .unwrap_or_else(|| "12".to_string())
      .parse::<usize>()
      .map_err(|e| AppError::Config(format!("Invalid NOTES_SEED_COUNT: {}", e)))?;

    let page_size = get_env("NOTES_PAGE_SIZE")
      .unwrap_or_else(|| "5".to_string())
      .parse::<u64>()
      .map_err(|e| AppError::Config(format!("Invalid NOTES_PAGE_SIZE: {}", e)))?;
    if page_size == 0 {
      return Err(AppError::Config("NOTES_PAGE_SIZE must be at least 1".to_string()));
    }

    let default_sort = parse_sort(&get_env("NOTES_DEFAULT_SORT").unwrap_or_else(|| "updated_at:desc".to_string()))?;
    let log_filter = get_env("RUST_LOG").unwrap_or_else(|| "info,crudflow=debug".to_string());

    Ok(Self {
      seed_count,
      page_size,
      default_sort,
      log_filter,
    })
  }
}

/// Parses `field:dir[,field:dir...]` where `dir` is `asc` or `desc`.
pub fn parse_sort(raw: &str) -> Result<FindSort> {
  let mut sort = FindSort::new();
  for entry in raw.split(',').map(str::trim).filter(|entry| !entry.is_empty()) {
    let (field, direction) = entry
      .split_once(':')
      .ok_or_else(|| AppError::Config(format!("Sort entry '{}' is not 'field:direction'", entry)))?;
    let direction = SortDirection::parse(direction.trim())
      .ok_or_else(|| AppError::Config(format!("Unknown sort direction in '{}'", entry)))?;
    sort.push(field.trim(), direction);
  }
  Ok(sort)
}

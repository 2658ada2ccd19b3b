// demos/notes_app/src/hooks.rs

//! Hooks plugged into the generated note operations.

use crate::errors::AppError;
use crate::models::Note;
use crate::store::NoteStore;
use anyhow::anyhow;
use chrono::Utc;
use crudflow::{
  default_find_sort,
  step,
  CrudError,
  EntityHook,
  FindHook,
  FindResult,
  FindSort,
  GetHook,
  HookPoint,
  Params,
  ParamsHook,
  SortBuilder,
};
use serde_json::Value;

/// before_set: every write refreshes `updated_at`.
pub fn stamp_updated_at() -> EntityHook<NoteStore> {
  step(|mut note: Note| async move {
    note.updated_at = Utc::now();
    Ok::<_, AppError>(note)
  })
}

/// `jane@example.com` becomes `j***@example.com`.
pub fn mask_email(email: &str) -> anyhow::Result<String> {
  let (user, domain) = email
    .split_once('@')
    .ok_or_else(|| anyhow!("'{}' is not an email address", email))?;
  let first = user.chars().next().ok_or_else(|| anyhow!("'{}' has an empty local part", email))?;
  Ok(format!("{}***@{}", first, domain))
}

fn redact(mut note: Note, hook: HookPoint) -> Result<Note, CrudError> {
  if let Some(email) = note.author_email.take() {
    let masked = mask_email(&email).map_err(|e| CrudError::hook(hook, e))?;
    note.author_email = Some(masked);
  }
  Ok(note)
}

/// after_set: the stored note keeps the address, the caller only sees it masked.
pub fn redact_saved_note() -> EntityHook<NoteStore> {
  step(|note: Note| async move { redact(note, HookPoint::AfterSet) })
}

pub fn redact_found_note() -> GetHook<NoteStore> {
  step(|found: Option<Note>| async move { found.map(|note| redact(note, HookPoint::AfterGet)).transpose() })
}

pub fn redact_find_result() -> FindHook<NoteStore> {
  step(|mut result: FindResult<Note>| async move {
    result.items = result
      .items
      .into_iter()
      .map(|note| redact(note, HookPoint::AfterFind))
      .collect::<Result<Vec<_>, _>>()?;
    Ok::<_, CrudError>(result)
  })
}

/// before_find: `limit` is capped at `max` and defaults to it.
pub fn cap_page_size(max: u64) -> ParamsHook<NoteStore> {
  step(move |mut params: Params| async move {
    let limit = params
      .get("limit")
      .and_then(Value::as_f64)
      .map_or(max, |requested| if requested < max as f64 { requested.max(0.0).floor() as u64 } else { max });
    params.insert("limit".to_string(), Value::from(limit));
    Ok::<_, AppError>(params)
  })
}

/// build_find_sort: the standard asc/desc mapping, or `fallback` when it yields nothing.
pub fn sort_or_default(fallback: FindSort) -> SortBuilder<NoteStore> {
  step(move |params: Params| {
    let fallback = fallback.clone();
    async move {
      let sort = default_find_sort(&params);
      Ok::<_, AppError>(if sort.is_empty() { fallback } else { sort })
    }
  })
}

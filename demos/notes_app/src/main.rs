// demos/notes_app/src/main.rs

// Declare modules for the application
mod config;
mod errors;
mod hooks;
mod models;
mod store;

use crate::config::AppConfig;
use crate::store::NoteStore;

use anyhow::Context;
use crudflow::{build_crud_operations, CrudConfig, CrudOperation, CrudOperations, Params};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn params(value: Value) -> Params {
  match value {
    Value::Object(map) => map,
    _ => Params::new(),
  }
}

async fn seed(ops: &CrudOperations<NoteStore>, count: usize) -> anyhow::Result<()> {
  for i in 0..count {
    let tag = if i % 2 == 0 { "work" } else { "home" };
    ops
      .set(params(json!({
        "title": format!("Note #{:02}", i),
        "body": format!("Seeded body {}", i),
        "tags": [tag],
        "pinned": i % 3 == 0,
        "author_email": "seed@notes.local",
      })))
      .await
      .with_context(|| format!("seeding note {}", i))?;
  }
  tracing::info!(count, "Seeded notes.");
  Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Load configuration first so RUST_LOG from .env applies to the subscriber.
  let app_config = AppConfig::from_env()?;

  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::new(&app_config.log_filter))
    .init();

  tracing::info!(config = ?app_config, "Starting notes demo...");

  let store = Arc::new(NoteStore::new());
  let crud_config = CrudConfig::<NoteStore>::new()
    .before_set(hooks::stamp_updated_at())
    .after_set(hooks::redact_saved_note())
    .after_get(hooks::redact_found_note())
    .before_find(hooks::cap_page_size(app_config.page_size))
    .build_find_sort(hooks::sort_or_default(app_config.default_sort.clone()))
    .after_find(hooks::redact_find_result());
  let ops = build_crud_operations(store.clone(), crud_config);

  for operation in [CrudOperation::Set, CrudOperation::Get, CrudOperation::Find, CrudOperation::Remove] {
    tracing::info!(%operation, steps = ?ops.pipeline_steps(operation), "Pipeline ready.");
  }

  seed(&ops, app_config.seed_count).await?;

  // Create, then update by id. Fields not sent keep their values.
  let created = ops
    .set(params(json!({
      "title": "Draft",
      "body": "First version",
      "tags": ["ideas"],
      "author_email": "jane@example.com",
    })))
    .await?;
  tracing::info!(note = %serde_json::to_string(&created)?, "Created note.");

  let updated = ops.set(params(json!({ "id": created.id, "title": "Final" }))).await?;
  tracing::info!(id = %updated.id, title = %updated.title, body = %updated.body, "Updated note.");

  let fetched = ops.get(params(json!({ "id": created.id }))).await?;
  let email = fetched.as_ref().and_then(|note| note.author_email.clone());
  tracing::info!(found = fetched.is_some(), ?email, "Fetched note.");

  let missing = ops.get(params(json!({ "id": "does-not-exist" }))).await?;
  tracing::info!(found = missing.is_some(), "Fetched unknown id.");

  // Page through the work notes.
  let mut skip: u64 = 0;
  loop {
    let page = ops
      .find(params(json!({ "filter": { "tag": "work" }, "skip": skip, "limit": app_config.page_size })))
      .await?;
    let titles: Vec<&str> = page.items.iter().map(|n| n.title.as_str()).collect();
    tracing::info!(skip, total = page.total, filtered_total = page.filtered_total, ?titles, "Work notes page.");
    skip += page.items.len() as u64;
    if page.items.is_empty() || skip >= page.filtered_total {
      break;
    }
  }

  let pinned = ops
    .find(params(json!({ "filter": { "pinned": true }, "sort": { "title": "asc" } })))
    .await?;
  tracing::info!(result = %serde_json::to_string(&pinned)?, "Pinned notes.");

  // Failures surface unchanged.
  if let Err(e) = ops.set(params(json!({ "title": 42 }))).await {
    tracing::warn!(error = %e, field = ?e.invalid_field(), "Rejected note with a numeric title.");
  }
  if let Err(e) = ops.set(params(json!({ "title": "" }))).await {
    tracing::warn!(error = %e, "Store refused a blank title.");
  }
  if let Err(e) = ops.find(params(json!({ "sort": { "body": "asc" } }))).await {
    tracing::warn!(error = %e, "Store refused an unsupported sort.");
  }

  ops.remove(params(json!({ "id": created.id }))).await?;
  ops.remove(params(json!({ "id": created.id }))).await?;
  tracing::info!(remaining = store.len(), "Removed note twice; second remove was a no-op.");

  Ok(())
}

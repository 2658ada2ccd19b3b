// demos/notes_app/src/store.rs

//! In-memory note table implementing `crudflow::Store`.

use crate::errors::AppError;
use crate::models::Note;
use async_trait::async_trait;
use crudflow::{FindFilter, FindQuery, SortDirection, Store};
use parking_lot::RwLock;
use std::cmp::Ordering;
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Debug, Default)]
pub struct NoteStore {
  notes: RwLock<HashMap<String, Note>>,
}

impl NoteStore {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn len(&self) -> usize {
    self.notes.read().len()
  }
}

/// Supported filter keys: `tag` (note carries the tag), `pinned`, `author_email`, `title`.
fn note_matches(note: &Note, filter: &FindFilter) -> bool {
  filter.iter().all(|(key, expected)| match key.as_str() {
    "tag" => expected.as_str().map(|tag| note.has_tag(tag)).unwrap_or(false),
    "pinned" => expected.as_bool() == Some(note.pinned),
    "author_email" => expected.as_str() == note.author_email.as_deref(),
    "title" => expected.as_str() == Some(note.title.as_str()),
    _ => false,
  })
}

fn compare_on(field: &str, a: &Note, b: &Note) -> Ordering {
  match field {
    "title" => a.title.cmp(&b.title),
    "pinned" => a.pinned.cmp(&b.pinned),
    "created_at" => a.created_at.cmp(&b.created_at),
    "updated_at" => a.updated_at.cmp(&b.updated_at),
    _ => Ordering::Equal,
  }
}

#[async_trait]
impl Store for NoteStore {
  type Entity = Note;
  type Error = AppError;

  async fn find_by_id(&self, id: &str) -> Result<Option<Note>, AppError> {
    Ok(self.notes.read().get(id).cloned())
  }

  fn new_entity(&self) -> Note {
    Note::new()
  }

  async fn save(&self, mut note: Note) -> Result<Note, AppError> {
    if note.title.trim().is_empty() {
      return Err(AppError::Store("note title must not be empty".to_string()));
    }
    if note.id.is_empty() {
      note.id = Uuid::new_v4().to_string();
    }
    tracing::debug!(id = %note.id, "Saving note.");
    self.notes.write().insert(note.id.clone(), note.clone());
    Ok(note)
  }

  async fn count(&self, filter: Option<&FindFilter>) -> Result<u64, AppError> {
    let notes = self.notes.read();
    let n = match filter {
      Some(filter) => notes.values().filter(|note| note_matches(note, filter)).count(),
      None => notes.len(),
    };
    Ok(n as u64)
  }

  async fn find_many(&self, query: FindQuery) -> Result<Vec<Note>, AppError> {
    if let Some((field, _)) = query
      .sort
      .iter()
      .find(|(field, _)| !matches!(*field, "title" | "pinned" | "created_at" | "updated_at"))
    {
      return Err(AppError::Store(format!("cannot sort notes by '{}'", field)));
    }

    let mut hits: Vec<Note> = self
      .notes
      .read()
      .values()
      .filter(|note| note_matches(note, &query.filter))
      .cloned()
      .collect();

    // Ids break ties so pages are stable across calls.
    hits.sort_by(|a, b| {
      query
        .sort
        .iter()
        .map(|(field, direction)| match direction {
          SortDirection::Ascending => compare_on(field, a, b),
          SortDirection::Descending => compare_on(field, a, b).reverse(),
        })
        .find(|ord| *ord != Ordering::Equal)
        .unwrap_or_else(|| a.id.cmp(&b.id))
    });

    let skip = query.skip.unwrap_or(0) as usize;
    let page = hits.into_iter().skip(skip);
    Ok(match query.limit {
      Some(limit) => page.take(limit as usize).collect(),
      None => page.collect(),
    })
  }

  async fn remove_by_id(&self, id: &str) -> Result<(), AppError> {
    if self.notes.write().remove(id).is_none() {
      tracing::debug!(%id, "Remove of unknown note ignored.");
    }
    Ok(())
  }
}

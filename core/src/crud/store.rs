// crudflow/src/crud/store.rs

//! The persistence collaborator and the values exchanged with it.

use crate::error::CrudError;
use async_trait::async_trait;
use serde::ser::{Serialize, Serializer};
use serde::Deserialize;
use serde_json::Value;

/// Untyped per-invocation input of every generated operation.
pub type Params = serde_json::Map<String, Value>;

/// Opaque filter descriptor handed to [`Store::count`] and [`Store::find_many`].
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, Deserialize)]
#[serde(transparent)]
pub struct FindFilter(pub Params);

impl FindFilter {
  pub fn new(conditions: Params) -> Self {
    FindFilter(conditions)
  }

  pub fn get(&self, field: &str) -> Option<&Value> {
    self.0.get(field)
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
    self.0.iter()
  }

  pub fn into_inner(self) -> Params {
    self.0
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortDirection {
  Ascending,
  Descending,
}

impl SortDirection {
  /// Accepts exactly `"asc"` and `"desc"`.
  pub fn parse(direction: &str) -> Option<Self> {
    match direction {
      "asc" => Some(SortDirection::Ascending),
      "desc" => Some(SortDirection::Descending),
      _ => None,
    }
  }

  pub fn as_i8(&self) -> i8 {
    match self {
      SortDirection::Ascending => 1,
      SortDirection::Descending => -1,
    }
  }
}

impl Serialize for SortDirection {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_i8(self.as_i8())
  }
}

/// Field to direction pairs in the order they were requested.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FindSort(Vec<(String, SortDirection)>);

impl FindSort {
  pub fn new() -> Self {
    Self::default()
  }

  /// Adds a key, replacing the direction in place if the field is already sorted on.
  pub fn push(&mut self, field: impl Into<String>, direction: SortDirection) {
    let field = field.into();
    match self.0.iter_mut().find(|(existing, _)| *existing == field) {
      Some(entry) => entry.1 = direction,
      None => self.0.push((field, direction)),
    }
  }

  pub fn with(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
    self.push(field, direction);
    self
  }

  pub fn get(&self, field: &str) -> Option<SortDirection> {
    self.0.iter().find(|(name, _)| name == field).map(|(_, direction)| *direction)
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, SortDirection)> {
    self.0.iter().map(|(name, direction)| (name.as_str(), *direction))
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }
}

impl Serialize for FindSort {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_map(self.0.iter().map(|(name, direction)| (name, direction)))
  }
}

/// Everything `find_many` needs for one page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindQuery {
  pub filter: FindFilter,
  pub sort: FindSort,
  /// `None` leaves the store's default paging in place.
  pub skip: Option<u64>,
  pub limit: Option<u64>,
}

/// Result of the Find operation.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FindResult<T> {
  pub items: Vec<T>,
  /// Count without any filter.
  pub total: u64,
  pub filtered_total: u64,
}

/// One persisted record of the managed type.
pub trait Entity: Send + Sync + 'static {
  fn id(&self) -> &str;

  /// Merges `fields` into the entity. Fields not present keep their values.
  fn apply_fields(&mut self, fields: &Params) -> Result<(), CrudError>;
}

/// Persistence backend for one entity type.
///
/// Store errors are surfaced to the caller of a generated operation as-is.
/// `remove_by_id` must succeed when the id does not exist.
#[async_trait]
pub trait Store: Send + Sync + 'static {
  type Entity: Entity;
  type Error: std::error::Error + From<CrudError> + Send + Sync + 'static;

  async fn find_by_id(&self, id: &str) -> Result<Option<Self::Entity>, Self::Error>;

  /// A fresh, unsaved entity.
  fn new_entity(&self) -> Self::Entity;

  async fn save(&self, entity: Self::Entity) -> Result<Self::Entity, Self::Error>;

  /// Number of entities matching `filter`, or all entities for `None`.
  async fn count(&self, filter: Option<&FindFilter>) -> Result<u64, Self::Error>;

  async fn find_many(&self, query: FindQuery) -> Result<Vec<Self::Entity>, Self::Error>;

  async fn remove_by_id(&self, id: &str) -> Result<(), Self::Error>;
}

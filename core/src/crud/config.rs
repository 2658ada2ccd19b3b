// crudflow/src/crud/config.rs

//! Extension points of the generated operations and their defaults.

use crate::core::step::{identity, Step};
use crate::crud::store::{FindFilter, FindResult, FindSort, Params, SortDirection, Store};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Named extension points, in the order they appear across the four operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookPoint {
  BeforeSet,
  AfterSet,
  AfterGet,
  BeforeFind,
  BuildFindFilter,
  BuildFindSort,
  AfterFind,
}

impl HookPoint {
  pub const ALL: [HookPoint; 7] = [
    HookPoint::BeforeSet,
    HookPoint::AfterSet,
    HookPoint::AfterGet,
    HookPoint::BeforeFind,
    HookPoint::BuildFindFilter,
    HookPoint::BuildFindSort,
    HookPoint::AfterFind,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      HookPoint::BeforeSet => "before_set",
      HookPoint::AfterSet => "after_set",
      HookPoint::AfterGet => "after_get",
      HookPoint::BeforeFind => "before_find",
      HookPoint::BuildFindFilter => "build_find_filter",
      HookPoint::BuildFindSort => "build_find_sort",
      HookPoint::AfterFind => "after_find",
    }
  }
}

impl fmt::Display for HookPoint {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Entity to entity: `before_set`, `after_set`.
pub type EntityHook<S> = Step<<S as Store>::Entity, <S as Store>::Entity, <S as Store>::Error>;
/// Runs on the result of `find_by_id`, including a miss.
pub type GetHook<S> = Step<Option<<S as Store>::Entity>, Option<<S as Store>::Entity>, <S as Store>::Error>;
pub type ParamsHook<S> = Step<Params, Params, <S as Store>::Error>;
pub type FilterBuilder<S> = Step<Params, FindFilter, <S as Store>::Error>;
pub type SortBuilder<S> = Step<Params, FindSort, <S as Store>::Error>;
pub type FindHook<S> = Step<FindResult<<S as Store>::Entity>, FindResult<<S as Store>::Entity>, <S as Store>::Error>;

/// Hooks for one entity type. Anything left unset falls back to its default.
///
/// ```ignore
/// let config = CrudConfig::<NoteStore>::new()
///   .before_set(stamp_updated_at())
///   .after_find(redact_find_result());
/// ```
pub struct CrudConfig<S: Store> {
  before_set: Option<EntityHook<S>>,
  after_set: Option<EntityHook<S>>,
  after_get: Option<GetHook<S>>,
  before_find: Option<ParamsHook<S>>,
  build_find_filter: Option<FilterBuilder<S>>,
  build_find_sort: Option<SortBuilder<S>>,
  after_find: Option<FindHook<S>>,
}

impl<S: Store> CrudConfig<S> {
  pub fn new() -> Self {
    Self {
      before_set: None,
      after_set: None,
      after_get: None,
      before_find: None,
      build_find_filter: None,
      build_find_sort: None,
      after_find: None,
    }
  }

  pub fn before_set(mut self, hook: EntityHook<S>) -> Self {
    self.before_set = Some(hook);
    self
  }

  pub fn after_set(mut self, hook: EntityHook<S>) -> Self {
    self.after_set = Some(hook);
    self
  }

  pub fn after_get(mut self, hook: GetHook<S>) -> Self {
    self.after_get = Some(hook);
    self
  }

  pub fn before_find(mut self, hook: ParamsHook<S>) -> Self {
    self.before_find = Some(hook);
    self
  }

  /// Replaces [`default_find_filter`].
  pub fn build_find_filter(mut self, builder: FilterBuilder<S>) -> Self {
    self.build_find_filter = Some(builder);
    self
  }

  /// Replaces [`default_find_sort`].
  pub fn build_find_sort(mut self, builder: SortBuilder<S>) -> Self {
    self.build_find_sort = Some(builder);
    self
  }

  pub fn after_find(mut self, hook: FindHook<S>) -> Self {
    self.after_find = Some(hook);
    self
  }

  /// Extension points that carry a caller-supplied step.
  pub fn configured(&self) -> Vec<HookPoint> {
    HookPoint::ALL
      .into_iter()
      .filter(|point| match point {
        HookPoint::BeforeSet => self.before_set.is_some(),
        HookPoint::AfterSet => self.after_set.is_some(),
        HookPoint::AfterGet => self.after_get.is_some(),
        HookPoint::BeforeFind => self.before_find.is_some(),
        HookPoint::BuildFindFilter => self.build_find_filter.is_some(),
        HookPoint::BuildFindSort => self.build_find_sort.is_some(),
        HookPoint::AfterFind => self.after_find.is_some(),
      })
      .collect()
  }

  pub(crate) fn resolve(self) -> ResolvedHooks<S> {
    ResolvedHooks {
      before_set: self.before_set.unwrap_or_else(identity),
      after_set: self.after_set.unwrap_or_else(identity),
      after_get: self.after_get.unwrap_or_else(identity),
      before_find: self.before_find.unwrap_or_else(identity),
      build_find_filter: self.build_find_filter.unwrap_or_else(default_find_filter_step),
      build_find_sort: self.build_find_sort.unwrap_or_else(default_find_sort_step),
      after_find: self.after_find.unwrap_or_else(identity),
    }
  }
}

impl<S: Store> Default for CrudConfig<S> {
  fn default() -> Self {
    Self::new()
  }
}

impl<S: Store> Clone for CrudConfig<S> {
  fn clone(&self) -> Self {
    Self {
      before_set: self.before_set.clone(),
      after_set: self.after_set.clone(),
      after_get: self.after_get.clone(),
      before_find: self.before_find.clone(),
      build_find_filter: self.build_find_filter.clone(),
      build_find_sort: self.build_find_sort.clone(),
      after_find: self.after_find.clone(),
    }
  }
}

impl<S: Store> fmt::Debug for CrudConfig<S> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("CrudConfig").field("configured", &self.configured()).finish()
  }
}

/// Every extension point with a concrete step.
pub(crate) struct ResolvedHooks<S: Store> {
  pub before_set: EntityHook<S>,
  pub after_set: EntityHook<S>,
  pub after_get: GetHook<S>,
  pub before_find: ParamsHook<S>,
  pub build_find_filter: FilterBuilder<S>,
  pub build_find_sort: SortBuilder<S>,
  pub after_find: FindHook<S>,
}

/// `params.filter` verbatim; an empty filter when it is absent or not an object.
pub fn default_find_filter(params: &Params) -> FindFilter {
  match params.get("filter") {
    Some(Value::Object(conditions)) => FindFilter::new(conditions.clone()),
    _ => FindFilter::default(),
  }
}

/// Maps every `"asc"`/`"desc"` entry of `params.sort` to a direction.
///
/// Entries with any other value are dropped. An absent sort yields an empty one.
pub fn default_find_sort(params: &Params) -> FindSort {
  let mut sort = FindSort::new();
  if let Some(Value::Object(requested)) = params.get("sort") {
    for (field, direction) in requested {
      if let Some(direction) = direction.as_str().and_then(SortDirection::parse) {
        sort.push(field.as_str(), direction);
      }
    }
  }
  sort
}

pub fn default_find_filter_step<E: Send + 'static>() -> Step<Params, FindFilter, E> {
  Arc::new(|params: Params| {
    let filter = default_find_filter(&params);
    Box::pin(async move { Ok(filter) })
  })
}

pub fn default_find_sort_step<E: Send + 'static>() -> Step<Params, FindSort, E> {
  Arc::new(|params: Params| {
    let sort = default_find_sort(&params);
    Box::pin(async move { Ok(sort) })
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn params(value: Value) -> Params {
    value.as_object().cloned().unwrap_or_default()
  }

  #[test]
  fn default_sort_maps_known_directions_and_drops_the_rest() {
    let sort = default_find_sort(&params(json!({
      "sort": { "name": "asc", "age": "desc", "bogus": "up", "rank": 1 }
    })));

    let pairs: Vec<(&str, SortDirection)> = sort.iter().collect();
    assert_eq!(
      pairs,
      vec![("name", SortDirection::Ascending), ("age", SortDirection::Descending)]
    );
  }

  #[test]
  fn default_sort_without_sort_is_empty() {
    assert!(default_find_sort(&params(json!({ "skip": 1 }))).is_empty());
  }

  #[test]
  fn default_filter_copies_params_filter() {
    let filter = default_find_filter(&params(json!({ "filter": { "tag": "work" }, "limit": 3 })));
    assert_eq!(filter, FindFilter::new(params(json!({ "tag": "work" }))));
    assert!(default_find_filter(&Params::new()).is_empty());
  }

  #[test]
  fn hook_points_display_in_snake_case() {
    let names: Vec<String> = HookPoint::ALL.iter().map(ToString::to_string).collect();
    assert_eq!(
      names,
      [
        "before_set",
        "after_set",
        "after_get",
        "before_find",
        "build_find_filter",
        "build_find_sort",
        "after_find"
      ]
    );
  }
}

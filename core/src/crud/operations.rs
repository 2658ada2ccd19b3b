// crudflow/src/crud/operations.rs

//! Builds the Set, Get, Find and Remove pipelines for one store.

use crate::core::context_data::ContextData;
use crate::core::control::OperationState;
use crate::core::step::{identity, map_step, step, Step};
use crate::crud::config::CrudConfig;
use crate::crud::store::{Entity, FindFilter, FindQuery, FindResult, FindSort, Params, Store};
use crate::error::CrudError;
use crate::pipeline::{Chain, Parallel, Sequence};
use crate::validation::{FieldType, Validator};
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tracing::{event, span, Instrument, Level};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrudOperation {
  Set,
  Get,
  Find,
  Remove,
}

impl CrudOperation {
  pub fn as_str(&self) -> &'static str {
    match self {
      CrudOperation::Set => "set",
      CrudOperation::Get => "get",
      CrudOperation::Find => "find",
      CrudOperation::Remove => "remove",
    }
  }
}

impl fmt::Display for CrudOperation {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// The four generated operations for the entity type of `S`.
///
/// Built once and shared; every call runs on its own input and context.
pub struct CrudOperations<S: Store> {
  set: Chain<Params, S::Entity, S::Error>,
  get: Chain<Params, Option<S::Entity>, S::Error>,
  find: Chain<Params, FindResult<S::Entity>, S::Error>,
  remove: Chain<Params, (), S::Error>,
}

/// Wires `store` and the hooks in `config` into the four operations.
pub fn build_crud_operations<S: Store>(store: Arc<S>, config: CrudConfig<S>) -> CrudOperations<S> {
  event!(
    Level::DEBUG,
    entity = std::any::type_name::<S::Entity>(),
    configured = ?config.configured(),
    "Building CRUD operations."
  );
  let hooks = config.resolve();

  let set = Chain::new(CrudOperation::Set.as_str())
    .then("validate", Validator::new().optional("id", FieldType::String).into_step())
    .then("fetch_or_create", fetch_or_create_step(store.clone()))
    .then("before_set", hooks.before_set)
    .then("save", save_step(store.clone()))
    .then("after_set", hooks.after_set);

  let get = Chain::new(CrudOperation::Get.as_str())
    .then("validate", Validator::new().required("id", FieldType::String).into_step())
    .then("project_id", project_id_step())
    .then("find_by_id", find_by_id_step(store.clone()))
    .then("after_get", hooks.after_get);

  let build_query = Parallel::new("build_query")
    .branch(map_step(hooks.build_find_filter, QueryPart::Filter))
    .branch(map_step(hooks.build_find_sort, QueryPart::Sort))
    .branch(map_step(identity(), QueryPart::Params));

  let find_validator = Validator::new()
    .optional("filter", FieldType::Object)
    .optional("sort", FieldType::Object)
    .optional("skip", FieldType::Number)
    .optional("limit", FieldType::Number);

  let find = Chain::new(CrudOperation::Find.as_str())
    .then("validate", find_validator.into_step())
    .then("before_find", hooks.before_find)
    .then("build_query", build_query.into_step())
    .then("run_query", run_query(store.clone()).into_step(assemble_query, QueryContext::into_result))
    .then("after_find", hooks.after_find);

  let remove = Chain::new(CrudOperation::Remove.as_str())
    .then("validate", Validator::new().required("id", FieldType::String).into_step())
    .then("project_id", project_id_step())
    .then("remove_by_id", remove_by_id_step(store));

  CrudOperations { set, get, find, remove }
}

impl<S: Store> CrudOperations<S> {
  /// Creates the entity when `id` is absent or empty, otherwise merges
  /// `params` into the stored one. Returns the saved entity.
  pub async fn set(&self, params: Params) -> Result<S::Entity, S::Error> {
    dispatch::<S, _, _>(CrudOperation::Set, self.set.run(params)).await
  }

  /// `Ok(None)` when no entity has the given id.
  pub async fn get(&self, params: Params) -> Result<Option<S::Entity>, S::Error> {
    dispatch::<S, _, _>(CrudOperation::Get, self.get.run(params)).await
  }

  pub async fn find(&self, params: Params) -> Result<FindResult<S::Entity>, S::Error> {
    dispatch::<S, _, _>(CrudOperation::Find, self.find.run(params)).await
  }

  /// Succeeds for ids that do not exist.
  pub async fn remove(&self, params: Params) -> Result<(), S::Error> {
    dispatch::<S, _, _>(CrudOperation::Remove, self.remove.run(params)).await
  }

  /// Names of the steps the given operation runs, in order.
  pub fn pipeline_steps(&self, operation: CrudOperation) -> &[String] {
    match operation {
      CrudOperation::Set => self.set.step_names(),
      CrudOperation::Get => self.get.step_names(),
      CrudOperation::Find => self.find.step_names(),
      CrudOperation::Remove => self.remove.step_names(),
    }
  }
}

impl<S: Store> fmt::Debug for CrudOperations<S> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("CrudOperations")
      .field("entity", &std::any::type_name::<S::Entity>())
      .field("set", &self.set)
      .field("get", &self.get)
      .field("find", &self.find)
      .field("remove", &self.remove)
      .finish()
  }
}

async fn dispatch<S, T, F>(operation: CrudOperation, pipeline: F) -> Result<T, S::Error>
where
  S: Store,
  F: Future<Output = Result<T, S::Error>>,
{
  let op_span = span!(
    Level::INFO,
    "crud_operation",
    operation = %operation,
    entity = std::any::type_name::<S::Entity>()
  );

  async move {
    let mut state = OperationState::Pending;
    advance(&mut state, OperationState::Running);
    let outcome = pipeline.await;
    match &outcome {
      Ok(_) => advance(&mut state, OperationState::Succeeded),
      Err(e) => {
        event!(Level::WARN, error = %e, "CRUD operation failed.");
        advance(&mut state, OperationState::Failed);
      }
    }
    outcome
  }
  .instrument(op_span)
  .await
}

fn advance(state: &mut OperationState, next: OperationState) {
  event!(Level::DEBUG, from = %state, to = %next, "Operation state changed.");
  *state = next;
}

fn fetch_or_create_step<S: Store>(store: Arc<S>) -> Step<Params, S::Entity, S::Error> {
  step(move |params: Params| {
    let store = store.clone();
    async move { fetch_or_create(store.as_ref(), params).await }
  })
}

async fn fetch_or_create<S: Store>(store: &S, mut params: Params) -> Result<S::Entity, S::Error> {
  let id = match params.get("id") {
    Some(Value::String(id)) if !id.is_empty() => Some(id.clone()),
    _ => None,
  };

  let mut entity = match id {
    Some(id) => match store.find_by_id(&id).await? {
      Some(existing) => existing,
      None => {
        event!(Level::DEBUG, %id, "No entity under the given id; creating one.");
        store.new_entity()
      }
    },
    None => {
      params.remove("id");
      store.new_entity()
    }
  };

  entity.apply_fields(&params)?;
  Ok(entity)
}

fn save_step<S: Store>(store: Arc<S>) -> Step<S::Entity, S::Entity, S::Error> {
  step(move |entity: S::Entity| {
    let store = store.clone();
    async move { store.save(entity).await }
  })
}

fn project_id_step<E>() -> Step<Params, String, E>
where
  E: From<CrudError> + Send + 'static,
{
  step(|params: Params| async move {
    params
      .get("id")
      .and_then(Value::as_str)
      .map(str::to_owned)
      .ok_or_else(|| CrudError::Internal("validated params lost their id".to_string()))
  })
}

fn find_by_id_step<S: Store>(store: Arc<S>) -> Step<String, Option<S::Entity>, S::Error> {
  step(move |id: String| {
    let store = store.clone();
    async move { store.find_by_id(&id).await }
  })
}

fn remove_by_id_step<S: Store>(store: Arc<S>) -> Step<String, (), S::Error> {
  step(move |id: String| {
    let store = store.clone();
    async move { store.remove_by_id(&id).await }
  })
}

/// One branch result of the `build_query` fan-out.
enum QueryPart {
  Filter(FindFilter),
  Sort(FindSort),
  Params(Params),
}

/// Accumulators shared by the `run_query` stages.
struct QueryContext<T> {
  query: FindQuery,
  total: u64,
  filtered_total: u64,
  items: Vec<T>,
}

impl<T> QueryContext<T> {
  fn into_result(self) -> FindResult<T> {
    FindResult {
      items: self.items,
      total: self.total,
      filtered_total: self.filtered_total,
    }
  }
}

fn assemble_query<T, E>(parts: Vec<QueryPart>) -> Result<QueryContext<T>, E>
where
  E: From<CrudError>,
{
  let mut parts = parts.into_iter();
  match (parts.next(), parts.next(), parts.next()) {
    (Some(QueryPart::Filter(filter)), Some(QueryPart::Sort(sort)), Some(QueryPart::Params(params))) => {
      Ok(QueryContext {
        query: FindQuery {
          filter,
          sort,
          skip: page_bound(&params, "skip"),
          limit: page_bound(&params, "limit"),
        },
        total: 0,
        filtered_total: 0,
        items: Vec::new(),
      })
    }
    _ => Err(E::from(CrudError::Internal(
      "build_query did not yield filter, sort and params in order".to_string(),
    ))),
  }
}

/// Floors a numeric paging parameter; negatives become zero.
fn page_bound(params: &Params, key: &str) -> Option<u64> {
  let raw = params.get(key)?;
  if let Some(n) = raw.as_u64() {
    return Some(n);
  }
  raw.as_f64().map(|n| if n > 0.0 { n.floor() as u64 } else { 0 })
}

fn run_query<S: Store>(store: Arc<S>) -> Sequence<QueryContext<S::Entity>, S::Error> {
  let count_total = store.clone();
  let count_filtered = store.clone();
  let find_items = store;

  Sequence::new("run_query")
    .stage("count_total", move |ctx: ContextData<QueryContext<S::Entity>>| {
      let store = count_total.clone();
      async move {
        let total = store.count(None).await?;
        ctx.write().total = total;
        Ok::<_, S::Error>(())
      }
    })
    .stage("count_filtered", move |ctx: ContextData<QueryContext<S::Entity>>| {
      let store = count_filtered.clone();
      async move {
        let filter = ctx.read().query.filter.clone();
        let filtered_total = store.count(Some(&filter)).await?;
        ctx.write().filtered_total = filtered_total;
        Ok::<_, S::Error>(())
      }
    })
    .stage("find_items", move |ctx: ContextData<QueryContext<S::Entity>>| {
      let store = find_items.clone();
      async move {
        let query = ctx.read().query.clone();
        let items = store.find_many(query).await?;
        ctx.write().items = items;
        Ok::<_, S::Error>(())
      }
    })
}

// src/lib.rs

//! Crudflow: async step combinators and generated CRUD operations for Rust.
//!
//! Crudflow composes asynchronous steps into request-scoped pipelines with:
//!  - `Chain`: sequential steps, first error aborts.
//!  - `Parallel`: fan-out over one input, results in branch order.
//!  - `Sequence`: ordered stages sharing a per-run mutable context.
//!  - `Validator`: ordered field/type rules over untyped params.
//!  - `build_crud_operations`: Set, Get, Find and Remove over any `Store`,
//!    with hooks at fixed extension points.

pub mod core;
pub mod crud;
pub mod error;
pub mod pipeline;
pub mod validation;

// --- Re-exports for the Public API ---

pub use crate::core::context_data::ContextData;
pub use crate::core::control::{OperationState, SequenceControl, SequenceResult};
pub use crate::core::step::{identity, map_step, step, BoxFuture, Step};

pub use crate::pipeline::{Chain, Parallel, Sequence, Stage};

pub use crate::validation::{FieldRule, FieldType, ValueKind, Validator};

pub use crate::crud::{
  build_crud_operations,
  default_find_filter,
  default_find_filter_step,
  default_find_sort,
  default_find_sort_step,
  CrudConfig,
  CrudOperation,
  CrudOperations,
  Entity,
  EntityHook,
  FilterBuilder,
  FindFilter,
  FindHook,
  FindQuery,
  FindResult,
  FindSort,
  GetHook,
  HookPoint,
  Params,
  ParamsHook,
  SortBuilder,
  SortDirection,
  Store,
};

pub use crate::error::{CrudError, CrudResult};

/*
    Typical use:
    1. Implement `Entity` for the record type and `Store` for its backend.
    2. Write hooks as `Step`s (usually with `step(|x| async move { ... })`).
    3. Register them on a `CrudConfig<MyStore>`; unset hooks keep their defaults.
    4. `build_crud_operations(Arc::new(store), config)` once at startup.
    5. Call `ops.set(params)`, `ops.get(params)`, `ops.find(params)` or
       `ops.remove(params)` per request.
*/

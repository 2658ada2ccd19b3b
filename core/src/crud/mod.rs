// crudflow/src/crud/mod.rs

//! Generated Set/Get/Find/Remove operations over a [`Store`].

pub mod config;
pub mod operations;
pub mod store;

pub use config::{
  default_find_filter,
  default_find_filter_step,
  default_find_sort,
  default_find_sort_step,
  CrudConfig,
  EntityHook,
  FilterBuilder,
  FindHook,
  GetHook,
  HookPoint,
  ParamsHook,
  SortBuilder,
};
pub use operations::{build_crud_operations, CrudOperation, CrudOperations};
pub use store::{Entity, FindFilter, FindQuery, FindResult, FindSort, Params, SortDirection, Store};

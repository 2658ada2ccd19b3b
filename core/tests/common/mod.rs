// tests/common/mod.rs
#![allow(dead_code)] // Allow unused code in this common test module

use async_trait::async_trait;
use crudflow::{CrudError, Entity, FindFilter, FindQuery, Params, SortDirection, Store};
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::cmp::Ordering as CmpOrdering;
use std::sync::{
  atomic::{AtomicUsize, Ordering},
  Arc,
};
use tracing::Level;

// --- Common Error Type for Tests ---
#[derive(Debug, thiserror::Error)]
pub enum TestError {
  #[error("Crudflow error: {0}")]
  Crud(#[from] CrudError),

  #[error("Test store failed: {0}")]
  Store(String),

  #[error("Test hook failed: {0}")]
  Hook(String),

  #[error("Test step failed: {0}")]
  Step(String),
}

// --- Entity used by the CRUD tests ---
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Record {
  pub id: String,
  pub fields: Params,
}

impl Record {
  pub fn field(&self, name: &str) -> Option<&Value> {
    self.fields.get(name)
  }
}

impl Entity for Record {
  fn id(&self) -> &str {
    &self.id
  }

  fn apply_fields(&mut self, fields: &Params) -> Result<(), CrudError> {
    for (key, value) in fields {
      if key == "id" {
        if let Some(id) = value.as_str() {
          self.id = id.to_string();
        }
        continue;
      }
      self.fields.insert(key.clone(), value.clone());
    }
    Ok(())
  }
}

/// Every collaborator call the engine makes, in order.
#[derive(Clone, Debug, PartialEq)]
pub enum StoreCall {
  FindById(String),
  NewEntity,
  Save(String),
  Count(Option<FindFilter>),
  FindMany(FindQuery),
  RemoveById(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailOn {
  FindById,
  Save,
  Count,
  FindMany,
  RemoveById,
}

// --- In-memory store that records its calls ---
#[derive(Default)]
pub struct RecordingStore {
  records: Mutex<Vec<Record>>,
  calls: Mutex<Vec<StoreCall>>,
  fail_on: Mutex<Option<FailOn>>,
  next_id: AtomicUsize,
}

impl RecordingStore {
  pub fn new() -> Arc<Self> {
    Arc::new(Self::default())
  }

  /// Store pre-filled with `n` records `rec-0..rec-{n-1}`, each with `rank` and `even`.
  pub fn seeded(n: usize) -> Arc<Self> {
    let store = Self::default();
    {
      let mut records = store.records.lock();
      for i in 0..n {
        let fields = json!({ "name": format!("record {}", i), "rank": i, "even": i % 2 == 0 });
        records.push(Record {
          id: format!("rec-{}", i),
          fields: fields.as_object().cloned().unwrap_or_default(),
        });
      }
    }
    store.next_id.store(n, Ordering::SeqCst);
    Arc::new(store)
  }

  pub fn fail_on(&self, call: FailOn) {
    *self.fail_on.lock() = Some(call);
  }

  pub fn calls(&self) -> Vec<StoreCall> {
    self.calls.lock().clone()
  }

  pub fn clear_calls(&self) {
    self.calls.lock().clear();
  }

  pub fn records(&self) -> Vec<Record> {
    self.records.lock().clone()
  }

  pub fn get(&self, id: &str) -> Option<Record> {
    self.records.lock().iter().find(|r| r.id == id).cloned()
  }

  fn record(&self, call: StoreCall) {
    self.calls.lock().push(call);
  }

  fn check(&self, call: FailOn) -> Result<(), TestError> {
    if *self.fail_on.lock() == Some(call) {
      return Err(TestError::Store(format!("{:?} unavailable", call)));
    }
    Ok(())
  }
}

fn matches_filter(record: &Record, filter: &FindFilter) -> bool {
  filter.iter().all(|(key, expected)| {
    if key == "id" {
      return expected.as_str() == Some(record.id.as_str());
    }
    record.fields.get(key) == Some(expected)
  })
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> CmpOrdering {
  match (a, b) {
    (Some(Value::Number(x)), Some(Value::Number(y))) => {
      let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
      x.partial_cmp(&y).unwrap_or(CmpOrdering::Equal)
    }
    (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
    (Some(_), None) => CmpOrdering::Greater,
    (None, Some(_)) => CmpOrdering::Less,
    _ => CmpOrdering::Equal,
  }
}

#[async_trait]
impl Store for RecordingStore {
  type Entity = Record;
  type Error = TestError;

  async fn find_by_id(&self, id: &str) -> Result<Option<Record>, TestError> {
    self.record(StoreCall::FindById(id.to_string()));
    self.check(FailOn::FindById)?;
    Ok(self.get(id))
  }

  fn new_entity(&self) -> Record {
    self.record(StoreCall::NewEntity);
    Record::default()
  }

  async fn save(&self, mut entity: Record) -> Result<Record, TestError> {
    self.record(StoreCall::Save(entity.id.clone()));
    self.check(FailOn::Save)?;
    if entity.id.is_empty() {
      entity.id = format!("rec-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
    }
    let mut records = self.records.lock();
    match records.iter_mut().find(|r| r.id == entity.id) {
      Some(existing) => *existing = entity.clone(),
      None => records.push(entity.clone()),
    }
    Ok(entity)
  }

  async fn count(&self, filter: Option<&FindFilter>) -> Result<u64, TestError> {
    self.record(StoreCall::Count(filter.cloned()));
    self.check(FailOn::Count)?;
    let records = self.records.lock();
    let n = match filter {
      Some(filter) => records.iter().filter(|r| matches_filter(r, filter)).count(),
      None => records.len(),
    };
    Ok(n as u64)
  }

  async fn find_many(&self, query: FindQuery) -> Result<Vec<Record>, TestError> {
    self.record(StoreCall::FindMany(query.clone()));
    self.check(FailOn::FindMany)?;
    let mut hits: Vec<Record> = self
      .records
      .lock()
      .iter()
      .filter(|r| matches_filter(r, &query.filter))
      .cloned()
      .collect();

    hits.sort_by(|a, b| {
      query
        .sort
        .iter()
        .map(|(field, direction)| {
          let ord = compare_values(a.field(field), b.field(field));
          match direction {
            SortDirection::Ascending => ord,
            SortDirection::Descending => ord.reverse(),
          }
        })
        .find(|ord| *ord != CmpOrdering::Equal)
        .unwrap_or(CmpOrdering::Equal)
    });

    let skip = query.skip.unwrap_or(0) as usize;
    let limit = query.limit.map(|l| l as usize).unwrap_or(usize::MAX);
    Ok(hits.into_iter().skip(skip).take(limit).collect())
  }

  async fn remove_by_id(&self, id: &str) -> Result<(), TestError> {
    self.record(StoreCall::RemoveById(id.to_string()));
    self.check(FailOn::RemoveById)?;
    self.records.lock().retain(|r| r.id != id);
    Ok(())
  }
}

pub fn params(value: Value) -> Params {
  value.as_object().cloned().unwrap_or_default()
}

// --- Helper for Tracing Setup (call once per test run if needed) ---
static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer() // Important for tests to capture output
    .try_init()
    .ok(); // Allow multiple initializations in tests (ok if fails)
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}

// --- Atomic counters for checking hook invocations ---
pub static HOOK_EXEC_COUNTER: Lazy<Arc<AtomicUsize>> = Lazy::new(|| Arc::new(AtomicUsize::new(0)));

pub fn reset_counters() {
  HOOK_EXEC_COUNTER.store(0, Ordering::SeqCst);
}

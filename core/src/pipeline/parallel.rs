// crudflow/src/pipeline/parallel.rs

//! Fan-out/fan-in: one input, N independent branches, results in branch order.

use crate::core::step::Step;
use crate::error::CrudError;
use futures_util::stream::{FuturesUnordered, StreamExt};
use std::fmt;
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::{event, instrument, Level};

/// Runs every branch concurrently against a clone of the same input.
///
/// Each branch is spawned as its own task, so it runs to completion even when
/// a sibling has already failed; late results of such branches are dropped.
/// Outside a Tokio runtime `run` fails with `CrudError::Internal`.
pub struct Parallel<I, O, E> {
  name: String,
  branches: Vec<Step<I, O, E>>,
}

impl<I, O, E> Parallel<I, O, E>
where
  I: Clone + Send + 'static,
  O: Send + 'static,
  E: std::error::Error + From<CrudError> + Send + Sync + 'static,
{
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      branches: Vec::new(),
    }
  }

  pub fn branch(mut self, branch: Step<I, O, E>) -> Self {
    self.branches.push(branch);
    self
  }

  pub fn len(&self) -> usize {
    self.branches.len()
  }

  pub fn is_empty(&self) -> bool {
    self.branches.is_empty()
  }

  /// Resolves to every branch's output, ordered like the branches were added,
  /// or to the first error observed.
  #[instrument(
    name = "Parallel::run",
    skip_all,
    fields(parallel = %self.name, num_branches = self.branches.len())
  )]
  pub async fn run(&self, input: I) -> Result<Vec<O>, E> {
    let runtime = Handle::try_current().map_err(|e| {
      event!(Level::ERROR, error = %e, "No Tokio runtime to spawn parallel branches on.");
      E::from(CrudError::Internal(format!(
        "parallel '{}' must run inside a Tokio runtime: {}",
        self.name, e
      )))
    })?;

    event!(Level::DEBUG, "Dispatching parallel branches.");

    let mut in_flight: FuturesUnordered<_> = self
      .branches
      .iter()
      .enumerate()
      .map(|(branch_index, branch)| {
        let handle = runtime.spawn(branch(input.clone()));
        async move { (branch_index, handle.await) }
      })
      .collect();

    let mut slots: Vec<Option<O>> = self.branches.iter().map(|_| None).collect();

    while let Some((branch_index, joined)) = in_flight.next().await {
      match joined {
        Ok(Ok(value)) => {
          event!(Level::TRACE, branch_index, "Parallel branch succeeded.");
          slots[branch_index] = Some(value);
        }
        Ok(Err(e)) => {
          // Dropping `in_flight` detaches the remaining tasks; they keep running.
          event!(Level::ERROR, branch_index, error = %e, "Parallel branch failed.");
          return Err(e);
        }
        Err(join_err) => {
          event!(Level::ERROR, branch_index, error = %join_err, "Parallel branch did not complete.");
          return Err(E::from(CrudError::Internal(format!(
            "branch {} of parallel '{}' did not complete: {}",
            branch_index, self.name, join_err
          ))));
        }
      }
    }

    let results: Option<Vec<O>> = slots.into_iter().collect();
    results.ok_or_else(|| {
      E::from(CrudError::Internal(format!(
        "parallel '{}' finished with a branch result missing",
        self.name
      )))
    })
  }

  pub fn into_step(self) -> Step<I, Vec<O>, E> {
    let parallel = Arc::new(self);
    Arc::new(move |input| {
      let parallel = parallel.clone();
      Box::pin(async move { parallel.run(input).await })
    })
  }
}

impl<I, O, E> fmt::Debug for Parallel<I, O, E> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Parallel")
      .field("name", &self.name)
      .field("branches", &self.branches.len())
      .finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::core::step::step;

  #[tokio::test]
  async fn empty_parallel_yields_empty_vec() {
    let parallel = Parallel::<u8, u8, CrudError>::new("nothing");
    assert!(parallel.is_empty());
    assert!(parallel.run(1).await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn every_branch_sees_same_input() {
    let parallel = Parallel::<i64, i64, CrudError>::new("arith")
      .branch(step(|n: i64| async move { Ok::<_, CrudError>(n + 1) }))
      .branch(step(|n: i64| async move { Ok::<_, CrudError>(n * 10) }))
      .branch(step(|n: i64| async move { Ok::<_, CrudError>(-n) }));
    assert_eq!(parallel.len(), 3);
    assert_eq!(parallel.run(4).await.unwrap(), vec![5, 40, -4]);
  }

  #[test]
  fn run_without_runtime_is_an_internal_error() {
    use futures_util::FutureExt;

    let parallel = Parallel::<u8, u8, CrudError>::new("no_runtime").branch(step(|n: u8| async move { Ok::<_, CrudError>(n) }));
    let outcome = parallel.run(1).now_or_never().expect("fails on first poll");
    assert!(matches!(outcome, Err(CrudError::Internal(ref msg)) if msg.contains("Tokio runtime")));
  }
}

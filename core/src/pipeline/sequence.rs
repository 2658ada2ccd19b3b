// crudflow/src/pipeline/sequence.rs

//! Contains the `Sequence<C, E>` combinator: ordered stages sharing one mutable
//! context for the duration of a single run.

use crate::core::context_data::ContextData;
use crate::core::control::{SequenceControl, SequenceResult};
use crate::core::step::{BoxFuture, Step};
use crate::error::CrudError;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tracing::{event, instrument, span, Instrument, Level};

/// A single stage of a Sequence.
///
/// A stage receives the run's `ContextData<C>` and resolves to either a
/// `SequenceControl` (continue or stop) or an error that ends the run.
pub type Stage<C, E> = Box<dyn Fn(ContextData<C>) -> BoxFuture<Result<SequenceControl, E>> + Send + Sync>;

/// Ordered, imperative-style list of stages.
///
/// A fresh context is created for every [`Sequence::run`], so accumulators
/// written by one stage are visible to later stages of the same run only.
/// Stage N+1 is not started before stage N has resolved.
pub struct Sequence<C, E>
where
  C: Send + Sync + 'static,
{
  name: String,
  stages: Vec<(String, Stage<C, E>)>,
}

impl<C, E> Sequence<C, E>
where
  C: Send + Sync + 'static,
  E: std::error::Error + From<CrudError> + Send + Sync + 'static,
{
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      stages: Vec::new(),
    }
  }

  /// Adds a stage whose only job on success is to continue.
  ///
  /// Any error it returns is forwarded to the caller of `run` and no later
  /// stage executes, so the stage body can use `?` on every store call.
  pub fn stage<F, Fut, UserErr>(mut self, stage_name: impl Into<String>, stage_fn: F) -> Self
  where
    F: Fn(ContextData<C>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), UserErr>> + Send + 'static,
    UserErr: Into<E> + Send + Sync + 'static,
  {
    let stage: Stage<C, E> = Box::new(move |ctx_data| {
      let user_fut = stage_fn(ctx_data);
      Box::pin(async move {
        match user_fut.await {
          Ok(()) => Ok(SequenceControl::Continue),
          Err(e) => Err(e.into()),
        }
      })
    });
    self.stages.push((stage_name.into(), stage));
    self
  }

  /// Adds a stage that decides explicitly whether the Sequence goes on.
  pub fn stage_with_control<F, Fut, UserErr>(mut self, stage_name: impl Into<String>, stage_fn: F) -> Self
  where
    F: Fn(ContextData<C>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<SequenceControl, UserErr>> + Send + 'static,
    UserErr: Into<E> + Send + Sync + 'static,
  {
    let stage: Stage<C, E> = Box::new(move |ctx_data| {
      let user_fut = stage_fn(ctx_data);
      Box::pin(async move { user_fut.await.map_err(Into::into) })
    });
    self.stages.push((stage_name.into(), stage));
    self
  }

  pub fn stage_names(&self) -> Vec<&str> {
    self.stages.iter().map(|(name, _)| name.as_str()).collect()
  }

  pub fn len(&self) -> usize {
    self.stages.len()
  }

  pub fn is_empty(&self) -> bool {
    self.stages.is_empty()
  }

  /// Runs every stage in declaration order against a context built from `ctx`.
  ///
  /// Returns the final context together with whether the run completed or was
  /// stopped by a stage. The first stage error is returned unchanged.
  #[instrument(
    name = "Sequence::run",
    skip_all,
    fields(
      sequence = %self.name,
      context_type = %std::any::type_name::<C>(),
      num_stages = self.stages.len(),
    )
  )]
  pub async fn run(&self, ctx: C) -> Result<(C, SequenceResult), E> {
    event!(Level::DEBUG, "Sequence execution starting.");
    let ctx_data = ContextData::new(ctx);
    let mut outcome = SequenceResult::Completed;

    for (stage_idx, (stage_name, stage_fn)) in self.stages.iter().enumerate() {
      let stage_span = span!(
        Level::DEBUG,
        "sequence_stage",
        stage_name = stage_name.as_str(),
        stage_index = stage_idx
      );

      match stage_fn(ctx_data.clone()).instrument(stage_span.clone()).await {
        Ok(SequenceControl::Continue) => {}
        Ok(SequenceControl::Stop) => {
          stage_span.in_scope(|| event!(Level::INFO, "Sequence stopped by a stage."));
          outcome = SequenceResult::Stopped;
          break;
        }
        Err(e) => {
          stage_span.in_scope(|| event!(Level::ERROR, error = %e, "Sequence stage failed."));
          return Err(e);
        }
      }
    }

    let data = ctx_data.into_inner().ok_or_else(|| {
      event!(Level::ERROR, "A stage kept a handle to the sequence context.");
      E::from(CrudError::Internal(format!(
        "context of sequence '{}' is still shared after its last stage",
        self.name
      )))
    })?;

    event!(Level::DEBUG, ?outcome, "Sequence execution finished.");
    Ok((data, outcome))
  }

  /// Adapts the Sequence into a step.
  ///
  /// `init` builds the per-run context from the step input and may reject it;
  /// `finish` projects the step output from the final context.
  pub fn into_step<I, O>(
    self,
    init: impl Fn(I) -> Result<C, E> + Send + Sync + 'static,
    finish: impl Fn(C) -> O + Send + Sync + 'static,
  ) -> Step<I, O, E>
  where
    I: 'static,
    O: Send + 'static,
  {
    let sequence = Arc::new(self);
    let finish = Arc::new(finish);
    Arc::new(move |input| {
      let sequence = sequence.clone();
      let finish = finish.clone();
      let ctx = init(input);
      Box::pin(async move {
        let (final_ctx, _) = sequence.run(ctx?).await?;
        Ok::<O, E>(finish(final_ctx))
      })
    })
  }
}

impl<C, E> fmt::Debug for Sequence<C, E>
where
  C: Send + Sync + 'static,
{
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Sequence")
      .field("name", &self.name)
      .field("stages", &self.stages.iter().map(|(name, _)| name).collect::<Vec<_>>())
      .finish()
  }
}

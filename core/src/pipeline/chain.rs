// crudflow/src/pipeline/chain.rs

//! Sequential composition: each step's output is the next step's input and the
//! first failure ends the chain.

use crate::core::step::{identity, Step};
use std::fmt;
use std::sync::Arc;
use tracing::{event, instrument, span, Instrument, Level};

/// An ordered, typed list of steps threading one value from `I` to `O`.
///
/// Links are appended with [`Chain::then`]; the output type of the chain so far
/// becomes the input type of the next link. A chain with no links returns its
/// input. A chain can be turned back into a [`Step`] and nested inside another
/// chain, a `Parallel` or a `Sequence`.
pub struct Chain<I, O, E> {
  name: String,
  step_names: Vec<String>,
  run: Step<I, O, E>,
}

impl<I, E> Chain<I, I, E>
where
  I: Send + 'static,
  E: std::error::Error + Send + Sync + 'static,
{
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      step_names: Vec::new(),
      run: identity(),
    }
  }

  /// Builds a chain from steps that all map `I` to `I`.
  ///
  /// Links are named `<chain name>[<index>]`.
  pub fn of(name: impl Into<String>, steps: impl IntoIterator<Item = Step<I, I, E>>) -> Self {
    let name = name.into();
    let mut chain = Self::new(name.clone());
    for (idx, link) in steps.into_iter().enumerate() {
      chain = chain.then(format!("{}[{}]", name, idx), link);
    }
    chain
  }
}

impl<I, O, E> Chain<I, O, E>
where
  I: Send + 'static,
  O: Send + 'static,
  E: std::error::Error + Send + Sync + 'static,
{
  /// Appends `next`, which only runs once every earlier link has succeeded.
  pub fn then<P>(self, step_name: impl Into<String>, next: Step<O, P, E>) -> Chain<I, P, E>
  where
    P: Send + 'static,
  {
    let step_name = step_name.into();
    let step_index = self.step_names.len();
    let chain_name = self.name.clone();
    let label = step_name.clone();
    let prev = self.run;

    let run: Step<I, P, E> = Arc::new(move |input| {
      let prev_fut = prev(input);
      let next = next.clone();
      let step_span = span!(
        Level::DEBUG,
        "chain_step",
        chain = %chain_name,
        step_name = %label,
        step_index = step_index
      );

      Box::pin(async move {
        let value = prev_fut.await?;
        let outcome = async {
          event!(Level::TRACE, "Running chain step.");
          next(value).await
        }
        .instrument(step_span.clone())
        .await;
        if let Err(e) = &outcome {
          step_span.in_scope(|| {
            event!(Level::ERROR, error = %e, "Chain step failed; remaining steps skipped.");
          });
        }
        outcome
      })
    });

    let mut step_names = self.step_names;
    step_names.push(step_name);
    Chain {
      name: self.name,
      step_names,
      run,
    }
  }

  #[instrument(
    name = "Chain::run",
    skip_all,
    fields(chain = %self.name, num_steps = self.step_names.len())
  )]
  pub async fn run(&self, input: I) -> Result<O, E> {
    event!(Level::DEBUG, "Chain execution starting.");
    let output = (self.run)(input).await?;
    event!(Level::DEBUG, "Chain execution completed.");
    Ok(output)
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn step_names(&self) -> &[String] {
    &self.step_names
  }

  pub fn len(&self) -> usize {
    self.step_names.len()
  }

  pub fn is_empty(&self) -> bool {
    self.step_names.is_empty()
  }

  /// Turns the chain into a step so it can be nested.
  pub fn into_step(self) -> Step<I, O, E> {
    self.run
  }
}

impl<I, O, E> fmt::Debug for Chain<I, O, E> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Chain")
      .field("name", &self.name)
      .field("steps", &self.step_names)
      .finish()
  }
}

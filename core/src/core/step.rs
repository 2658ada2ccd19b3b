// crudflow/src/core/step.rs

//! Defines `Step<I, O, E>`, the unit every combinator composes.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// A boxed, sendable future with no borrowed state.
pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

/// An asynchronous function from `I` to `Result<O, E>`.
///
/// Steps are shared (`Arc`) and stateless from the engine's point of view: any
/// state a step needs is captured when the closure is built. Invoking a step
/// only creates its future; nothing runs until that future is polled.
pub type Step<I, O, E> = Arc<dyn Fn(I) -> BoxFuture<Result<O, E>> + Send + Sync>;

/// Wraps an async closure into a `Step`.
///
/// The closure may fail with any error convertible into the pipeline's `E`,
/// mirroring how handlers adapt their own error types elsewhere in the crate.
pub fn step<I, O, E, F, Fut, UserErr>(f: F) -> Step<I, O, E>
where
  I: 'static,
  O: 'static,
  E: 'static,
  F: Fn(I) -> Fut + Send + Sync + 'static,
  Fut: Future<Output = Result<O, UserErr>> + Send + 'static,
  UserErr: Into<E> + 'static,
{
  Arc::new(move |input| {
    let user_fut = f(input);
    Box::pin(async move { user_fut.await.map_err(Into::into) })
  })
}

/// A step that returns its input unchanged. Default for every unset hook.
pub fn identity<T, E>() -> Step<T, T, E>
where
  T: Send + 'static,
  E: Send + 'static,
{
  Arc::new(|input| Box::pin(async move { Ok(input) }))
}

/// Post-processes the success value of `inner` with `f`.
pub fn map_step<I, O, P, E>(inner: Step<I, O, E>, f: impl Fn(O) -> P + Send + Sync + 'static) -> Step<I, P, E>
where
  I: 'static,
  O: 'static,
  P: 'static,
  E: 'static,
{
  let f = Arc::new(f);
  Arc::new(move |input| {
    let fut = inner(input);
    let f = f.clone();
    Box::pin(async move { fut.await.map(|value| f(value)) })
  })
}

// crudflow/src/pipeline/mod.rs

//! Step combinators: `Chain`, `Parallel` and `Sequence`.

pub mod chain;
pub mod parallel;
pub mod sequence;

pub use chain::Chain;
pub use parallel::Parallel;
pub use sequence::{Sequence, Stage};

pub mod context_data;
pub mod control;
pub mod step;

pub use context_data::ContextData;
pub use control::{OperationState, SequenceControl, SequenceResult};
pub use step::{identity, map_step, step, BoxFuture, Step};

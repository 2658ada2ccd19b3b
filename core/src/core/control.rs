// crudflow/src/core/control.rs

//! Signals for controlling Sequence flow and the lifecycle of a generated operation.

use std::fmt;

/// Signal from a Sequence stage indicating whether the Sequence should continue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceControl {
  /// Advance to the next stage.
  Continue,
  /// End the Sequence successfully. Later stages are not executed.
  Stop,
}

/// Outcome of a full Sequence run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceResult {
  /// Every stage ran.
  Completed,
  /// A stage returned `SequenceControl::Stop`.
  Stopped,
}

/// Lifecycle of one invocation of a generated CRUD operation.
///
/// `Pending -> Running -> {Succeeded, Failed}`; the last two are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationState {
  Pending,
  Running,
  Succeeded,
  Failed,
}

impl OperationState {
  pub fn is_terminal(&self) -> bool {
    matches!(self, OperationState::Succeeded | OperationState::Failed)
  }
}

impl fmt::Display for OperationState {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let label = match self {
      OperationState::Pending => "pending",
      OperationState::Running => "running",
      OperationState::Succeeded => "succeeded",
      OperationState::Failed => "failed",
    };
    f.write_str(label)
  }
}

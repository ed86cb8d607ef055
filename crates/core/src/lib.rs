pub mod evaluator;
pub mod events;
pub mod pipeline;
pub mod proctor;
pub mod report;
pub mod session;
pub mod speech;
pub mod timer;

use report::SessionReport;

/// Represents commands that the core logic (`InterviewSession`) issues to the runtime.
///
/// This enum is the primary API for decoupling the session's decision-making
/// from the runtime's execution of side effects (rendering questions, showing
/// transient notices, presenting the final report).
#[derive(Debug, Clone)]
pub enum Command {
    /// Present the question at `index` to the candidate and begin its cycle.
    AskQuestion { index: usize, question: String },
    /// Show a transient proctoring warning.
    ShowWarning(String),
    /// Clear a previously shown proctoring warning.
    ClearWarning,
    /// Show a transient, non-fatal notice (e.g. a capture failure).
    Notice(String),
    /// The session was terminated by proctoring, with a human-readable reason.
    Terminated(String),
    /// The session ran to completion; render the results view.
    Completed(Box<SessionReport>),
}

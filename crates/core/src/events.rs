use crate::speech::SpeechEvent;

/// Every asynchronous source in the system feeds this single event type into
/// one mpsc queue, and one loop applies events to the session in order. The
/// state machine therefore processes one event at a time by construction;
/// there is no overlapping mutation of session state.
#[derive(Debug)]
pub enum SessionEvent {
    /// The candidate asked to start the interview with the given document
    /// (resume text or chosen subject).
    StartRequested { document: String },
    /// A one-second tick from the active countdown. Ticks carry the epoch of
    /// the countdown that produced them; the session drops ticks from any
    /// epoch other than the current one, so a countdown that was cancelled by
    /// a phase change can never act late.
    Tick { epoch: u64 },
    /// An event from the speech capture engine. Events carry the generation
    /// of the capture window that produced them (handed to `start()`); the
    /// session drops events from any generation other than the current one,
    /// so a window that was stopped by a re-record can never act late — in
    /// particular the `Ended` that `stop()` guarantees.
    Speech {
        generation: u64,
        event: SpeechEvent,
    },
    /// The candidate manually ended the current recording.
    StopRecording,
    /// The candidate asked to re-record the current answer. Valid only while
    /// Recording: discards the accumulated transcript and restarts capture
    /// with a fresh recording window.
    RestartRecording,
    /// The proctoring source reports the subject absent from the frame.
    SubjectAbsent,
    /// The transient proctoring warning has been displayed long enough.
    WarningExpired,
}

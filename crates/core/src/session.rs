use crate::{
    Command,
    evaluator::Evaluator,
    events::SessionEvent,
    pipeline,
    proctor::AbsenceDetector,
    report::SessionReport,
    speech::{SpeechCapture, SpeechErrorKind, SpeechEvent},
    timer::Countdown,
};
use std::time::Duration;
use tokio::sync::mpsc::Sender;

/// Seconds the candidate gets to think before recording opens.
pub const THINKING_SECS: u32 = 10;
/// Seconds the recording window stays open.
pub const RECORDING_SECS: u32 = 30;
/// How long the first-violation warning stays on screen.
pub const WARNING_CLEAR_AFTER: Duration = Duration::from_secs(5);

const FIRST_VIOLATION_WARNING: &str =
    "You appear to have left the camera frame. This is your first and only warning.";
const TERMINATION_REASON: &str =
    "The interview was terminated: you left the camera frame a second time.";
const GENERATION_FAILED_NOTICE: &str =
    "Interview questions could not be generated. Check your material and try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Upload,
    Generating,
    InProgress,
    Evaluating,
    Summarizing,
    Results,
    Terminated,
}

/// Sub-state of `Phase::InProgress`: what the countdown currently measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    Thinking,
    Recording,
}

/// One complete attempt at the timed question-and-answer flow.
///
/// The session owns its collaborators (capture engine, proctoring source) for
/// its whole lifetime; there are no shared singletons. All mutation happens
/// inside `handle_event`, which the runtime calls from a single loop draining
/// one event queue, so transitions never overlap. `advance_lock` and the
/// `terminated` latch are kept as explicit gates inside the advance critical
/// section on top of that serialization.
pub struct InterviewSession {
    pub phase: Phase,
    pub stage: Stage,
    /// Fixed once generated.
    pub questions: Vec<String>,
    /// Always the same length as `questions` from InProgress entry on. Each
    /// slot is committed exactly once by Advance, overwritten only by an
    /// explicit re-record before advancing.
    pub answers: Vec<String>,
    /// Monotonic; never decreases.
    pub current_index: usize,
    /// Seconds remaining in the current sub-phase.
    pub timer_value: u32,
    /// True only transiently during a single advancement; released before the
    /// next question's sub-phase begins.
    pub advance_lock: bool,
    pub violation_count: u32,
    /// Irreversible latch. Once set, no further transition is permitted.
    pub terminated: bool,
    pub termination_reason: Option<String>,
    transcript: crate::speech::TranscriptBuffer,
    countdown: Option<Countdown>,
    epoch_counter: u64,
    capture_generation: u64,
    capture: Box<dyn SpeechCapture>,
    proctor: Box<dyn AbsenceDetector>,
    event_tx: Sender<SessionEvent>,
}

impl InterviewSession {
    pub fn new(
        capture: Box<dyn SpeechCapture>,
        proctor: Box<dyn AbsenceDetector>,
        event_tx: Sender<SessionEvent>,
    ) -> Self {
        Self {
            phase: Phase::Upload,
            stage: Stage::Idle,
            questions: vec![],
            answers: vec![],
            current_index: 0,
            timer_value: 0,
            advance_lock: false,
            violation_count: 0,
            terminated: false,
            termination_reason: None,
            transcript: crate::speech::TranscriptBuffer::new(),
            countdown: None,
            epoch_counter: 0,
            capture_generation: 0,
            capture,
            proctor,
            event_tx,
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.phase, Phase::Results | Phase::Terminated)
    }

    /// Epoch of the currently running countdown, if any. Used by tests and by
    /// the tick handler to drop stale ticks.
    pub fn timer_epoch(&self) -> Option<u64> {
        self.countdown.as_ref().map(|c| c.epoch())
    }

    /// Generation of the current capture window; bumped on every capture
    /// start so events from a stopped window can be recognized and dropped.
    pub fn capture_generation(&self) -> u64 {
        self.capture_generation
    }

    /// Apply one event. This is the single entry point for every asynchronous
    /// source; the runtime must call it from one loop only.
    pub async fn handle_event<E: Evaluator + Send + Sync>(
        session: &mut InterviewSession,
        evaluator: &E,
        event: SessionEvent,
        command_tx: Sender<Command>,
    ) {
        // The terminated latch gates every deferred callback.
        if session.terminated {
            return;
        }
        match event {
            SessionEvent::StartRequested { document } => {
                Self::start(session, evaluator, &document, &command_tx).await;
            }
            SessionEvent::Tick { epoch } => {
                Self::on_tick(session, evaluator, epoch, &command_tx).await;
            }
            SessionEvent::Speech { generation, event } => {
                Self::on_speech(session, evaluator, generation, event, &command_tx).await;
            }
            SessionEvent::StopRecording => {
                Self::advance(session, evaluator, &command_tx).await;
            }
            SessionEvent::RestartRecording => {
                Self::restart_recording(session, evaluator, &command_tx).await;
            }
            SessionEvent::SubjectAbsent => {
                Self::on_violation(session, &command_tx).await;
            }
            SessionEvent::WarningExpired => {
                send(&command_tx, Command::ClearWarning).await;
            }
        }
    }

    async fn start<E: Evaluator + Send + Sync>(
        session: &mut InterviewSession,
        evaluator: &E,
        document: &str,
        command_tx: &Sender<Command>,
    ) {
        if session.phase != Phase::Upload {
            tracing::warn!("Ignoring start request while in {:?}", session.phase);
            return;
        }
        if document.trim().is_empty() {
            send(
                command_tx,
                Command::Notice("Provide a resume or pick a subject first.".to_string()),
            )
            .await;
            return;
        }

        session.phase = Phase::Generating;
        match evaluator.generate_questions(document).await {
            Ok(questions) if !questions.is_empty() => {
                tracing::info!("Generated {} interview questions", questions.len());
                session.answers = vec![String::new(); questions.len()];
                session.questions = questions;
                session.current_index = 0;
                session.phase = Phase::InProgress;
                session.proctor.enable();
                Self::enter_thinking(session, command_tx).await;
            }
            Ok(_) => {
                tracing::warn!("Question generation returned an empty list");
                session.phase = Phase::Upload;
                send(command_tx, Command::Notice(GENERATION_FAILED_NOTICE.to_string())).await;
            }
            Err(e) => {
                tracing::warn!("Question generation failed: {e:?}");
                session.phase = Phase::Upload;
                send(command_tx, Command::Notice(GENERATION_FAILED_NOTICE.to_string())).await;
            }
        }
    }

    async fn on_tick<E: Evaluator + Send + Sync>(
        session: &mut InterviewSession,
        evaluator: &E,
        epoch: u64,
        command_tx: &Sender<Command>,
    ) {
        if session.phase != Phase::InProgress {
            return;
        }
        // A tick from a countdown that has since been replaced is an orphan;
        // it must not act.
        if session.timer_epoch() != Some(epoch) {
            return;
        }
        session.timer_value = session.timer_value.saturating_sub(1);
        if session.timer_value > 0 {
            return;
        }
        match session.stage {
            Stage::Thinking => Self::enter_recording(session, evaluator, command_tx).await,
            Stage::Recording => Self::advance(session, evaluator, command_tx).await,
            Stage::Idle => {}
        }
    }

    async fn on_speech<E: Evaluator + Send + Sync>(
        session: &mut InterviewSession,
        evaluator: &E,
        generation: u64,
        speech: SpeechEvent,
        command_tx: &Sender<Command>,
    ) {
        // Speech events only matter while a recording window is open; late
        // engine callbacks after stop() land here and fall through.
        if session.phase != Phase::InProgress || session.stage != Stage::Recording {
            return;
        }
        // An event from a window that was already stopped (a re-record keeps
        // the stage at Recording) is stale; in particular the Ended that
        // stop() guarantees must not close the fresh window.
        if generation != session.capture_generation {
            return;
        }
        match speech {
            SpeechEvent::Interim(text) => session.transcript.set_interim(&text),
            SpeechEvent::Final(text) => session.transcript.push_final(&text),
            SpeechEvent::Error(kind) => {
                Self::on_capture_failure(session, evaluator, kind, command_tx).await;
            }
            SpeechEvent::Ended => {
                // The engine gave up mid-window on its own; treat it like an
                // expiry and move on with what we have.
                Self::advance(session, evaluator, command_tx).await;
            }
        }
    }

    async fn on_capture_failure<E: Evaluator + Send + Sync>(
        session: &mut InterviewSession,
        evaluator: &E,
        kind: SpeechErrorKind,
        command_tx: &Sender<Command>,
    ) {
        tracing::warn!("Speech capture failed during recording: {kind:?}");
        send(command_tx, Command::Notice(kind.message().to_string())).await;
        Self::advance(session, evaluator, command_tx).await;
    }

    async fn enter_thinking(session: &mut InterviewSession, command_tx: &Sender<Command>) {
        session.stage = Stage::Thinking;
        session.timer_value = THINKING_SECS;
        session.advance_lock = false;
        session.transcript.clear();
        session.start_countdown();
        send(
            command_tx,
            Command::AskQuestion {
                index: session.current_index,
                question: session.questions[session.current_index].clone(),
            },
        )
        .await;
    }

    async fn enter_recording<E: Evaluator + Send + Sync>(
        session: &mut InterviewSession,
        evaluator: &E,
        command_tx: &Sender<Command>,
    ) {
        session.stage = Stage::Recording;
        Self::open_recording_window(session, evaluator, command_tx).await;
    }

    /// Arms a fresh 30s window and starts the capture engine. Shared by the
    /// Thinking→Recording transition and re-record.
    async fn open_recording_window<E: Evaluator + Send + Sync>(
        session: &mut InterviewSession,
        evaluator: &E,
        command_tx: &Sender<Command>,
    ) {
        session.timer_value = RECORDING_SECS;
        session.start_countdown();
        session.capture_generation += 1;
        if let Err(e) = session.capture.start(session.capture_generation) {
            tracing::warn!("Speech capture failed to start: {e:?}");
            Self::on_capture_failure(session, evaluator, SpeechErrorKind::HardwareFailure, command_tx)
                .await;
        }
    }

    async fn restart_recording<E: Evaluator + Send + Sync>(
        session: &mut InterviewSession,
        evaluator: &E,
        command_tx: &Sender<Command>,
    ) {
        if session.phase != Phase::InProgress || session.stage != Stage::Recording {
            return;
        }
        session.capture.stop();
        session.transcript.clear();
        Self::open_recording_window(session, evaluator, command_tx).await;
    }

    /// The critical section: commit the current answer and move forward.
    ///
    /// Timer expiry, capture errors, natural engine end, and manual stop all
    /// funnel here, possibly back to back in the queue; the gates below make
    /// every call after the first a no-op for the same question.
    async fn advance<E: Evaluator + Send + Sync>(
        session: &mut InterviewSession,
        evaluator: &E,
        command_tx: &Sender<Command>,
    ) {
        if session.advance_lock || session.terminated {
            return;
        }
        if session.phase != Phase::InProgress || session.stage != Stage::Recording {
            return;
        }
        session.advance_lock = true;
        session.stop_countdown();
        session.capture.stop();

        let answer = session.transcript.text().trim().to_string();
        session.answers[session.current_index] = answer;

        if session.current_index + 1 == session.questions.len() {
            Self::finish_interview(session, evaluator, command_tx).await;
        } else {
            session.current_index += 1;
            // enter_thinking releases the advance lock for the new index.
            Self::enter_thinking(session, command_tx).await;
        }
    }

    /// Evaluating → Summarizing → Results. Every collaborator failure on this
    /// path degrades to a fallback, so the session always reaches Results.
    async fn finish_interview<E: Evaluator + Send + Sync>(
        session: &mut InterviewSession,
        evaluator: &E,
        command_tx: &Sender<Command>,
    ) {
        session.stage = Stage::Idle;
        session.proctor.disable();
        session.phase = Phase::Evaluating;
        let results = pipeline::evaluate_all(evaluator, &session.questions, &session.answers).await;

        session.phase = Phase::Summarizing;
        let summary = pipeline::summarize(evaluator, &results).await;

        session.phase = Phase::Results;
        send(
            command_tx,
            Command::Completed(Box::new(SessionReport { results, summary })),
        )
        .await;
    }

    async fn on_violation(session: &mut InterviewSession, command_tx: &Sender<Command>) {
        if session.phase != Phase::InProgress {
            return;
        }
        session.violation_count += 1;
        if session.violation_count == 1 {
            tracing::info!("First proctoring violation: warning the candidate");
            send(command_tx, Command::ShowWarning(FIRST_VIOLATION_WARNING.to_string())).await;
            let event_tx = session.event_tx.clone();
            tokio::spawn(async move {
                tokio::time::sleep(WARNING_CLEAR_AFTER).await;
                let _ = event_tx.send(SessionEvent::WarningExpired).await;
            });
        } else {
            tracing::info!("Second proctoring violation: terminating the session");
            Self::terminate(session, TERMINATION_REASON, command_tx).await;
        }
    }

    async fn terminate(
        session: &mut InterviewSession,
        reason: &str,
        command_tx: &Sender<Command>,
    ) {
        session.terminated = true;
        session.phase = Phase::Terminated;
        session.stage = Stage::Idle;
        session.termination_reason = Some(reason.to_string());
        session.stop_countdown();
        session.capture.stop();
        session.proctor.disable();
        send(command_tx, Command::Terminated(reason.to_string())).await;
    }

    fn start_countdown(&mut self) {
        self.epoch_counter += 1;
        self.countdown = Some(Countdown::start(self.epoch_counter, self.event_tx.clone()));
    }

    fn stop_countdown(&mut self) {
        if let Some(countdown) = self.countdown.take() {
            countdown.cancel();
        }
    }
}

async fn send(command_tx: &Sender<Command>, command: Command) {
    if let Err(e) = command_tx.send(command).await {
        tracing::warn!("Failed to deliver command to runtime: {e:?}");
    }
}

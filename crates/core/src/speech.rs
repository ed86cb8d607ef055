/// Coarse failure reasons reported by a capture engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeechErrorKind {
    NoSpeech,
    PermissionDenied,
    HardwareFailure,
    Unknown,
}

impl SpeechErrorKind {
    pub fn message(&self) -> &'static str {
        match self {
            SpeechErrorKind::NoSpeech => "No speech was detected; moving on.",
            SpeechErrorKind::PermissionDenied => "Microphone permission was revoked; moving on.",
            SpeechErrorKind::HardwareFailure => "The microphone stopped working; moving on.",
            SpeechErrorKind::Unknown => "Speech capture failed; moving on.",
        }
    }
}

/// Events a capture engine delivers while running.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeechEvent {
    /// A provisional transcript for the segment currently being spoken. May be
    /// revised; display-only, never committed.
    Interim(String),
    /// A finalized transcript fragment. Final fragments arrive in order and
    /// are never revised.
    Final(String),
    /// The engine failed. The session advances with whatever transcript it
    /// has rather than blocking the question.
    Error(SpeechErrorKind),
    /// The engine stopped delivering events, either because `stop()` was
    /// requested or on its own.
    Ended,
}

/// Contract for a continuous speech-to-text engine.
///
/// The session owns one instance per session (no shared singleton) and
/// restarts it for every question's recording window. `stop()` requests
/// termination and guarantees an eventual `SpeechEvent::Ended`; events are
/// delivered out-of-band into the session's event queue by the implementation.
///
/// `start()` receives the generation of the window it opens; every event the
/// engine emits for that window (including the `Ended` that follows `stop()`)
/// must be stamped with it, so the session can drop events from windows it
/// has already discarded.
pub trait SpeechCapture: Send {
    fn start(&mut self, generation: u64) -> anyhow::Result<()>;
    fn stop(&mut self);
}

/// Accumulates one question's transcript from capture events.
///
/// Finalized fragments are kept in arrival order and joined with single
/// spaces; the interim text rides alongside for display and is dropped on
/// commit.
#[derive(Debug, Default)]
pub struct TranscriptBuffer {
    finals: Vec<String>,
    interim: String,
}

impl TranscriptBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_final(&mut self, fragment: &str) {
        let fragment = fragment.trim();
        if !fragment.is_empty() {
            self.finals.push(fragment.to_string());
        }
        self.interim.clear();
    }

    pub fn set_interim(&mut self, text: &str) {
        self.interim = text.trim().to_string();
    }

    pub fn interim(&self) -> &str {
        &self.interim
    }

    /// The committed transcript so far: finalized fragments only.
    pub fn text(&self) -> String {
        self.finals.join(" ")
    }

    /// Reset between questions (and on re-record).
    pub fn clear(&mut self) {
        self.finals.clear();
        self.interim.clear();
    }
}

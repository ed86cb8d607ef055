use crate::events::SessionEvent;
use std::time::Duration;
use rand::Rng;
use tokio::task::JoinHandle;

/// Contract for a proctoring source: something that can watch the candidate
/// and report them absent from the camera frame.
///
/// The provided `SimulatedProctor` is explicitly a stand-in for a real
/// perception model; a real detector only has to implement this trait to be
/// substituted without touching the state machine.
pub trait AbsenceDetector: Send {
    fn enable(&mut self);
    fn disable(&mut self);
}

/// Tuning for the simulated proctor.
#[derive(Debug, Clone)]
pub struct ProctorConfig {
    /// Delay before the first absence event may fire.
    pub warmup: Duration,
    /// Uniform range between subsequent events.
    pub min_interval: Duration,
    pub max_interval: Duration,
}

impl Default for ProctorConfig {
    fn default() -> Self {
        Self {
            warmup: Duration::from_secs(20),
            min_interval: Duration::from_secs(15),
            max_interval: Duration::from_secs(60),
        }
    }
}

/// Emits `SubjectAbsent` events at randomized intervals while enabled.
pub struct SimulatedProctor {
    config: ProctorConfig,
    tx: tokio::sync::mpsc::Sender<SessionEvent>,
    task: Option<JoinHandle<()>>,
}

impl SimulatedProctor {
    pub fn new(config: ProctorConfig, tx: tokio::sync::mpsc::Sender<SessionEvent>) -> Self {
        Self {
            config,
            tx,
            task: None,
        }
    }
}

impl AbsenceDetector for SimulatedProctor {
    fn enable(&mut self) {
        if self.task.is_some() {
            return;
        }
        let config = self.config.clone();
        let tx = self.tx.clone();
        self.task = Some(tokio::spawn(async move {
            tokio::time::sleep(config.warmup).await;
            loop {
                if tx.send(SessionEvent::SubjectAbsent).await.is_err() {
                    break;
                }
                // ThreadRng is not Send; keep it off the await point.
                let interval = {
                    let mut rng = rand::thread_rng();
                    rng.gen_range(config.min_interval..=config.max_interval)
                };
                tokio::time::sleep(interval).await;
            }
        }));
    }

    fn disable(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for SimulatedProctor {
    fn drop(&mut self) {
        self.disable();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ProctorConfig {
        ProctorConfig {
            warmup: Duration::from_millis(100),
            min_interval: Duration::from_millis(50),
            max_interval: Duration::from_millis(100),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn emits_absence_events_after_warmup() {
        let (tx, mut rx) = tokio::sync::mpsc::channel(16);
        let mut proctor = SimulatedProctor::new(config(), tx);
        proctor.enable();

        assert!(matches!(rx.recv().await, Some(SessionEvent::SubjectAbsent)));
        assert!(matches!(rx.recv().await, Some(SessionEvent::SubjectAbsent)));
        proctor.disable();
    }

    #[tokio::test(start_paused = true)]
    async fn no_events_after_disable() {
        let (tx, mut rx) = tokio::sync::mpsc::channel(16);
        let mut proctor = SimulatedProctor::new(config(), tx);
        proctor.enable();
        assert!(matches!(rx.recv().await, Some(SessionEvent::SubjectAbsent)));
        proctor.disable();
        drop(proctor);

        // Producer task is aborted and its sender dropped; after draining any
        // in-flight event the channel closes.
        while let Some(event) = rx.recv().await {
            assert!(matches!(event, SessionEvent::SubjectAbsent));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn enable_is_idempotent() {
        let (tx, mut rx) = tokio::sync::mpsc::channel(16);
        let mut proctor = SimulatedProctor::new(config(), tx);
        proctor.enable();
        proctor.enable();

        // A doubled enable must not double the event stream: exactly one
        // event per interval window.
        assert!(matches!(rx.recv().await, Some(SessionEvent::SubjectAbsent)));
        assert!(
            rx.try_recv().is_err(),
            "a second enable must not spawn a second emitter"
        );
        proctor.disable();
    }
}

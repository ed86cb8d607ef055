use mockmate_core::events::SessionEvent;
use mockmate_core::speech::{SpeechCapture, SpeechErrorKind, SpeechEvent};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::Sender;
use tokio::task::JoinHandle;

/// A stdin-backed stand-in for a browser speech-to-text engine, so the whole
/// session can be exercised from a terminal: every line the candidate types
/// during a recording window is delivered as a finalized transcript fragment,
/// EOF as the engine's natural end, and a read failure as a hardware error.
pub struct ConsoleCapture {
    tx: Sender<SessionEvent>,
    task: Option<JoinHandle<()>>,
    generation: u64,
}

impl ConsoleCapture {
    pub fn new(tx: Sender<SessionEvent>) -> Self {
        Self {
            tx,
            task: None,
            generation: 0,
        }
    }
}

impl SpeechCapture for ConsoleCapture {
    fn start(&mut self, generation: u64) -> anyhow::Result<()> {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.generation = generation;
        let tx = self.tx.clone();
        self.task = Some(tokio::spawn(async move {
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            loop {
                let event = match lines.next_line().await {
                    Ok(Some(line)) => SpeechEvent::Final(line),
                    Ok(None) => SpeechEvent::Ended,
                    Err(e) => {
                        tracing::warn!("stdin capture failed: {e:?}");
                        SpeechEvent::Error(SpeechErrorKind::HardwareFailure)
                    }
                };
                let done = !matches!(event, SpeechEvent::Final(_));
                if tx
                    .send(SessionEvent::Speech { generation, event })
                    .await
                    .is_err()
                    || done
                {
                    break;
                }
            }
        }));
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        // Honor the contract: stop() guarantees an eventual end signal,
        // stamped with the window it closes so the session can discard it.
        let tx = self.tx.clone();
        let generation = self.generation;
        tokio::spawn(async move {
            let _ = tx
                .send(SessionEvent::Speech {
                    generation,
                    event: SpeechEvent::Ended,
                })
                .await;
        });
    }
}

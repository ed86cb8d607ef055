use crate::events::SessionEvent;
use std::time::Duration;
use tokio::task::JoinHandle;

/// One-second tick source for the active sub-phase.
///
/// Every countdown carries an epoch; the session bumps the epoch on each
/// sub-phase change and drops ticks from older epochs. Combined with the
/// abort-on-drop handle this gives the cancellation contract: a tick that was
/// already scheduled when the phase changed can reach the queue, but it can
/// never act.
#[derive(Debug)]
pub struct Countdown {
    epoch: u64,
    handle: JoinHandle<()>,
}

impl Countdown {
    pub fn start(epoch: u64, tx: tokio::sync::mpsc::Sender<SessionEvent>) -> Self {
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(1));
            // The first tick of a tokio interval fires immediately; swallow it
            // so ticks land at one-second marks after start.
            interval.tick().await;
            loop {
                interval.tick().await;
                if tx.send(SessionEvent::Tick { epoch }).await.is_err() {
                    // Session loop is gone.
                    break;
                }
            }
        });
        Self { epoch, handle }
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn cancel(&self) {
        self.handle.abort();
    }
}

impl Drop for Countdown {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

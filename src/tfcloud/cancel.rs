use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::Duration;

use log::debug;

use crate::error::{Result, Tf2d2Error};

/// How often blocked callers look at the token
pub const CANCEL_POLL: Duration = Duration::from_millis(100);

/// Shared flag telling a running poll to stop
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// `Err(Cancelled)` once cancelled
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(Tf2d2Error::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Run blocking `work` on a worker thread and wait for it, returning
/// `Cancelled` as soon as the token fires.
///
/// A cancelled worker is left to finish on its own; its result is dropped.
pub fn run_cancellable<T, F>(cancel: &CancellationToken, work: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    cancel.check()?;

    let (tx, rx) = mpsc::channel();
    std::thread::Builder::new()
        .name("tf2d2-request".to_string())
        .spawn(move || {
            let _ = tx.send(work());
        })
        .map_err(|e| Tf2d2Error::Network(format!("error starting request worker: {}", e)))?;

    loop {
        match rx.recv_timeout(CANCEL_POLL) {
            Ok(result) => {
                if result.is_err() {
                    cancel.check()?;
                }
                return result;
            }
            Err(RecvTimeoutError::Timeout) => {
                if cancel.is_cancelled() {
                    debug!("abandoning in-flight request after cancellation");
                    return Err(Tf2d2Error::Cancelled);
                }
            }
            Err(RecvTimeoutError::Disconnected) => {
                return Err(Tf2d2Error::Network(
                    "request worker exited without a result".to_string(),
                ));
            }
        }
    }
}

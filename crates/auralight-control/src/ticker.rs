//! Fixed-delay periodic tick on a dedicated thread.

use crossbeam_channel::{bounded, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, warn};

use crate::Result;

/// Handle to a running tick thread.
///
/// The callback runs once immediately, then again each time the delay it
/// returned has elapsed. Returning `None` ends the thread. Dropping the
/// handle cancels without waiting.
pub struct Ticker {
    name: String,
    cancel_tx: Sender<()>,
    handle: Option<JoinHandle<()>>,
}

impl Ticker {
    /// Spawn a tick thread named `name`
    pub fn spawn<F>(name: &str, mut tick: F) -> Result<Self>
    where
        F: FnMut() -> Option<Duration> + Send + 'static,
    {
        let (cancel_tx, cancel_rx) = bounded::<()>(1);
        let thread_name = name.to_string();

        let handle = thread::Builder::new()
            .name(thread_name.clone())
            .spawn(move || {
                debug!("{} started", thread_name);
                while let Some(delay) = tick() {
                    match cancel_rx.recv_timeout(delay) {
                        Err(RecvTimeoutError::Timeout) => continue,
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                debug!("{} exited", thread_name);
            })?;

        Ok(Self {
            name: name.to_string(),
            cancel_tx,
            handle: Some(handle),
        })
    }

    /// Thread name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Ask the thread to exit after its current activation
    pub fn cancel(&self) {
        let _ = self.cancel_tx.try_send(());
    }

    /// Cancel and wait for the thread to exit. Does not wait when called
    /// from the tick thread itself.
    pub fn join(mut self) {
        self.cancel();
        if let Some(handle) = self.handle.take() {
            if handle.thread().id() == thread::current().id() {
                return;
            }
            if handle.join().is_err() {
                warn!("{} panicked", self.name);
            }
        }
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl std::fmt::Debug for Ticker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ticker")
            .field("name", &self.name)
            .field("running", &self.handle.as_ref().map(|h| !h.is_finished()))
            .finish()
    }
}

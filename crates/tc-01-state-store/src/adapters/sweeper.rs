//! # Periodic Sweeper
//!
//! A tokio task that runs a blocking job on a fixed interval until stopped.
//! Each pass runs on the blocking pool; stopping cancels the loop and waits
//! for a pass already in progress, after which no further pass starts.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

pub struct PeriodicSweeper {
    name: String,
    cancel: CancellationToken,
    /// Held for the duration of every pass.
    pass: Arc<Mutex<()>>,
    handle: Option<JoinHandle<()>>,
}

impl PeriodicSweeper {
    /// Start the loop on the current tokio runtime.
    ///
    /// Returns `None` when called outside a runtime; nothing is scheduled.
    pub fn spawn<F>(name: &str, interval: Duration, job: F) -> Option<Self>
    where
        F: Fn() + Send + Sync + 'static,
    {
        let Ok(runtime) = Handle::try_current() else {
            warn!("[tc-01] No tokio runtime, {} not scheduled", name);
            return None;
        };

        let cancel = CancellationToken::new();
        let pass = Arc::new(Mutex::new(()));
        let job = Arc::new(job);

        let handle = runtime.spawn({
            let cancel = cancel.clone();
            let pass = Arc::clone(&pass);
            let name = name.to_string();
            async move {
                let mut ticker = tokio::time::interval(interval);
                // the first tick completes immediately
                ticker.tick().await;
                loop {
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = ticker.tick() => {}
                    }
                    let job = Arc::clone(&job);
                    let pass = Arc::clone(&pass);
                    let token = cancel.clone();
                    let run = tokio::task::spawn_blocking(move || {
                        let _pass = pass.lock();
                        if !token.is_cancelled() {
                            job();
                        }
                    });
                    if let Err(e) = run.await {
                        warn!("[tc-01] {} pass failed: {}", name, e);
                    }
                }
                debug!("[tc-01] {} stopped", name);
            }
        });

        Some(Self {
            name: name.to_string(),
            cancel,
            pass,
            handle: Some(handle),
        })
    }

    /// Cancel the loop and wait for any pass in progress.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };
        self.cancel.cancel();
        handle.abort();
        drop(self.pass.lock());
        debug!("[tc-01] Sweeper {} shut down", self.name);
    }
}

impl Drop for PeriodicSweeper {
    fn drop(&mut self) {
        self.shutdown();
    }
}

//! Interrupt handling
//!
//! A watcher thread runs a single-threaded tokio runtime that waits for
//! Ctrl-C and cancels the run's token. Workers poll the token between
//! artifacts and between checks.

use std::thread::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Watches for SIGINT while alive; stops watching when dropped
pub struct InterruptWatcher {
    stop: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl InterruptWatcher {
    /// Cancel `token` on the first interrupt signal
    pub fn install(token: CancellationToken) -> std::io::Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let stop = CancellationToken::new();
        let stopped = stop.clone();

        let handle = std::thread::Builder::new()
            .name("rpmlint-interrupt".into())
            .spawn(move || {
                runtime.block_on(async move {
                    tokio::select! {
                        result = tokio::signal::ctrl_c() => match result {
                            Ok(()) => {
                                debug!("Interrupt received, cancelling run");
                                token.cancel();
                            }
                            Err(e) => warn!("Cannot listen for interrupts: {}", e),
                        },
                        _ = stopped.cancelled() => {}
                    }
                });
            })?;

        Ok(Self {
            stop,
            handle: Some(handle),
        })
    }
}

impl Drop for InterruptWatcher {
    fn drop(&mut self) {
        self.stop.cancel();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_watcher_stops_on_drop() {
        let token = CancellationToken::new();
        let watcher = InterruptWatcher::install(token.clone()).unwrap();
        drop(watcher);
        assert!(!token.is_cancelled());
    }
}

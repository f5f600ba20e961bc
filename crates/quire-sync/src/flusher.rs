//! Background thread that drives debounced writes.

use std::sync::mpsc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, warn};

/// Handle to a running flusher thread.
///
/// Uses the RAII pattern: dropping the handle stops the thread. Shutdown is
/// signalled by dropping the internal channel sender.
pub struct Flusher {
    shutdown: Option<mpsc::Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl Flusher {
    /// Spawn a thread calling `tick` every `interval` until the handle is dropped.
    ///
    /// `tick` typically calls `flush_ready()` on the cache store and the
    /// autosave buffer.
    pub fn spawn<F>(interval: Duration, mut tick: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

        let thread = thread::spawn(move || {
            loop {
                match shutdown_rx.recv_timeout(interval) {
                    Ok(()) | Err(mpsc::RecvTimeoutError::Disconnected) => break,
                    Err(mpsc::RecvTimeoutError::Timeout) => tick(),
                }
            }
            debug!("flusher stopped");
        });

        Self {
            shutdown: Some(shutdown_tx),
            thread: Some(thread),
        }
    }

    /// Stop the thread and wait for its current tick to finish.
    ///
    /// A panic inside `tick` is logged, not propagated.
    pub fn stop(mut self) {
        self.shutdown.take();
        if let Some(thread) = self.thread.take()
            && let Err(panic) = thread.join()
        {
            let reason = panic
                .downcast_ref::<&str>()
                .copied()
                .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
                .unwrap_or("unknown cause");
            warn!("flusher thread panicked: {reason}");
        }
    }
}

impl Drop for Flusher {
    fn drop(&mut self) {
        self.shutdown.take();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[test]
    fn test_flusher_ticks_until_stopped() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&ticks);

        let flusher = Flusher::spawn(Duration::from_millis(5), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        thread::sleep(Duration::from_millis(60));
        flusher.stop();

        let stopped_at = ticks.load(Ordering::SeqCst);
        assert!(stopped_at > 0);

        thread::sleep(Duration::from_millis(30));
        assert_eq!(ticks.load(Ordering::SeqCst), stopped_at);
    }

    #[test]
    fn test_drop_stops_thread() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&ticks);

        let flusher = Flusher::spawn(Duration::from_millis(5), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        drop(flusher);
        thread::sleep(Duration::from_millis(30));

        let after_drop = ticks.load(Ordering::SeqCst);
        thread::sleep(Duration::from_millis(30));
        assert_eq!(ticks.load(Ordering::SeqCst), after_drop);
    }

    #[test]
    fn test_stop_after_panicking_tick() {
        let flusher = Flusher::spawn(Duration::from_millis(1), || panic!("store exploded"));
        thread::sleep(Duration::from_millis(30));

        flusher.stop();
    }
}

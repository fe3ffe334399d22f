//! Periodic reconciliation loop.
//!
//! # Responsibility
//! - Run `TimerService::tick` at a fixed interval on a background thread.
//! - Serialize all access to the snapshot through one mutex.
//!
//! # Invariants
//! - After `TickHandle::stop` (or drop) returns, no further tick runs.
//! - Tick failures are logged and handed to the callback, never dropped.

use crate::clock::Clock;
use crate::service::timer_service::{ServiceError, TickReport, TimerService};
use crate::store::SnapshotStore;
use log::{error, info};
use std::io;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Single-writer handle shared between the host and its tick loop.
pub type SharedTimerService<S> = Arc<Mutex<TimerService<S>>>;

pub fn shared<S: SnapshotStore>(service: TimerService<S>) -> SharedTimerService<S> {
    Arc::new(Mutex::new(service))
}

/// Runs one reconciliation under the shared lock.
pub fn run_tick<S: SnapshotStore>(
    service: &SharedTimerService<S>,
    now: i64,
) -> Result<TickReport, ServiceError> {
    let mut guard = service.lock().map_err(|_| ServiceError::LockPoisoned)?;
    guard.tick(now)
}

/// Starts a tick loop; the returned handle stops it.
///
/// The first tick fires one `interval` after start.
///
/// # Errors
/// - `InvalidInput` for a zero `interval`.
/// - Any error from spawning the loop thread.
pub fn start<S, C, F>(
    service: SharedTimerService<S>,
    clock: C,
    interval: Duration,
    mut on_tick: F,
) -> io::Result<TickHandle>
where
    S: SnapshotStore + Send + 'static,
    C: Clock + 'static,
    F: FnMut(Result<TickReport, ServiceError>) + Send + 'static,
{
    if interval.is_zero() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "tick interval must be greater than zero",
        ));
    }
    let (stop_tx, stop_rx) = mpsc::channel::<()>();
    let interval_ms = interval.as_millis();

    let thread = thread::Builder::new()
        .name("clantimer-tick".to_string())
        .spawn(move || {
            info!("event=tick_loop module=ticker status=start interval_ms={interval_ms}");
            loop {
                match stop_rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => {}
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }

                let result = run_tick(&service, clock.now_epoch_ms());
                if let Err(err) = &result {
                    error!("event=tick module=ticker status=error error={err}");
                }
                on_tick(result);
            }
            info!("event=tick_loop module=ticker status=stopped");
        })?;

    Ok(TickHandle {
        stop_tx: Some(stop_tx),
        thread: Some(thread),
    })
}

/// Owner of a running tick loop.
#[derive(Debug)]
pub struct TickHandle {
    stop_tx: Option<Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl TickHandle {
    /// Stops the loop and waits for an in-flight tick to finish.
    pub fn stop(mut self) {
        self.shutdown();
    }

    pub fn is_running(&self) -> bool {
        self.thread
            .as_ref()
            .is_some_and(|thread| !thread.is_finished())
    }

    fn shutdown(&mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            // Receiver is gone if the thread already exited.
            let _ = stop_tx.send(());
        }
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                error!("event=tick_loop module=ticker status=error error_code=thread_panicked");
            }
        }
    }
}

impl Drop for TickHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

use clantimer_core::ticker::{self, run_tick};
use clantimer_core::{
    ManualClock, MemorySnapshotStore, ServiceError, SnapshotStore, TimerDuration, TimerService,
};
use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

const NOW: i64 = 1_760_000_000_000;
const MINUTE: i64 = 60_000;

fn running_service(
    store: Arc<MemorySnapshotStore>,
) -> ticker::SharedTimerService<Arc<MemorySnapshotStore>> {
    let mut service = TimerService::open(store).unwrap();
    let account_id = service.create_account("Main").unwrap();
    let timer_id = service.snapshot().accounts[0].timers[0].id;
    service
        .set_timer(account_id, timer_id, TimerDuration::new(0, 0, 1), NOW)
        .unwrap();
    ticker::shared(service)
}

#[test]
fn loop_reconciles_on_interval_and_reports_completion() {
    let store = Arc::new(MemorySnapshotStore::new());
    let service = running_service(Arc::clone(&store));
    let clock = Arc::new(ManualClock::new(NOW + 2 * MINUTE));
    let (tx, rx) = mpsc::channel();

    let handle = ticker::start(
        Arc::clone(&service),
        Arc::clone(&clock),
        Duration::from_millis(10),
        move |result| {
            let _ = tx.send(result.map(|report| report.completed.len()));
        },
    )
    .unwrap();

    let first = rx.recv_timeout(Duration::from_secs(5)).unwrap().unwrap();
    assert_eq!(first, 1);
    let second = rx.recv_timeout(Duration::from_secs(5)).unwrap().unwrap();
    assert_eq!(second, 0);

    handle.stop();
    let guard = service.lock().unwrap();
    assert_eq!(guard.snapshot().accounts[0].timers[0].end_timestamp, None);
    let persisted: Vec<Option<i64>> = store.load().unwrap().accounts[0]
        .timers
        .iter()
        .map(|timer| timer.end_timestamp)
        .collect();
    assert_eq!(persisted, vec![None; 7]);
}

#[test]
fn no_tick_fires_after_stop() {
    let store = Arc::new(MemorySnapshotStore::new());
    let service = running_service(Arc::clone(&store));
    let clock = Arc::new(ManualClock::new(NOW));
    let (tx, rx) = mpsc::channel::<()>();

    let handle = ticker::start(
        Arc::clone(&service),
        Arc::clone(&clock),
        Duration::from_millis(10),
        move |_| {
            let _ = tx.send(());
        },
    )
    .unwrap();
    rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert!(handle.is_running());

    drop(handle);
    while rx.try_recv().is_ok() {}

    clock.set(NOW + 10 * MINUTE);
    std::thread::sleep(Duration::from_millis(50));
    // Sender dropped with the loop thread.
    assert!(matches!(
        rx.try_recv(),
        Err(mpsc::TryRecvError::Disconnected)
    ));
    let guard = service.lock().unwrap();
    assert_eq!(
        guard.snapshot().accounts[0].timers[0].end_timestamp,
        Some(NOW + MINUTE)
    );
}

#[test]
fn run_tick_returns_save_failure_and_retries() {
    let store = Arc::new(MemorySnapshotStore::new());
    let service = running_service(Arc::clone(&store));
    store.set_fail_saves(true);

    let err = run_tick(&service, NOW + 2 * MINUTE).unwrap_err();
    assert!(matches!(err, ServiceError::Store(_)));

    store.set_fail_saves(false);
    let report = run_tick(&service, NOW + 2 * MINUTE).unwrap();
    assert_eq!(report.completed.len(), 1);
}

#[test]
fn loop_hands_save_failures_to_callback() {
    let store = Arc::new(MemorySnapshotStore::new());
    let service = running_service(Arc::clone(&store));
    store.set_fail_saves(true);
    let clock = Arc::new(ManualClock::new(NOW + 2 * MINUTE));
    let (tx, rx) = mpsc::channel();

    let handle = ticker::start(
        Arc::clone(&service),
        Arc::clone(&clock),
        Duration::from_millis(10),
        move |result| {
            let _ = tx.send(result);
        },
    )
    .unwrap();

    let result = rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert!(matches!(result, Err(ServiceError::Store(_))));
    handle.stop();

    let guard = service.lock().unwrap();
    assert_eq!(
        guard.snapshot().accounts[0].timers[0].end_timestamp,
        Some(NOW + MINUTE)
    );
}

#[test]
fn zero_interval_is_rejected() {
    let store = Arc::new(MemorySnapshotStore::new());
    let service = running_service(store);
    let clock = ManualClock::new(NOW);

    let err = ticker::start(service, clock, Duration::ZERO, |_| {}).unwrap_err();
    assert_eq!(err.kind(), std::io::ErrorKind::InvalidInput);
}

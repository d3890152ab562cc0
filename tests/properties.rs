//! Idempotence and boundary-behaviour properties from the invariants
//! list, each isolated from the full scenarios.

use std::time::Duration;

use workforce::scheduler::TaskQueue;
use workforce::worker::{self, WorkerState};
use workforce::DelayedStart;

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn close_is_idempotent() {
    init();
    let queue = TaskQueue::new();
    queue.close();
    assert!(queue.is_closed());
    queue.close();
    assert!(queue.is_closed());
}

#[test]
fn request_state_noop_when_unchanged() {
    init();
    let queue = TaskQueue::new();
    let w = worker::r#async(queue.scheduler(), None);
    // requested already defaults to Work; this must not disturb anything.
    w.request_state(WorkerState::Work);
    assert_eq!(w.get_requested_state(), WorkerState::Work);
    queue.close();
    w.wait();
}

#[test]
fn delayed_start_empty_start_is_noop() {
    init();
    let d = DelayedStart::new();
    assert!(d.is_empty());
    d.start();
    assert!(d.is_empty());
}

#[test]
fn submit_after_close_observes_cancelled() {
    init();
    let queue = TaskQueue::new();
    queue.close();
    let future = queue.submit(|| 1);
    assert!(future.peek().is_cancelled());
}

#[test]
fn wait_on_already_terminated_worker_returns_promptly() {
    init();
    let queue = TaskQueue::new();
    let w = worker::r#async(queue.scheduler(), None);
    queue.close();
    w.wait();
    // already terminated; a second wait must not block.
    w.wait();
    assert_eq!(w.get_state(), WorkerState::Terminate);
}

#[test]
fn cancel_does_not_abort_an_in_flight_task() {
    init();
    let queue = TaskQueue::new();
    let future = queue.submit(|| {
        std::thread::sleep(Duration::from_millis(100));
        7
    });
    let w = worker::r#async(queue.scheduler(), None);
    std::thread::sleep(Duration::from_millis(20));
    queue.cancel();
    assert_eq!(future.peek().value(), Some(&7));
    queue.close();
    w.wait();
}

#[test]
fn future_is_cloneable_and_repeated_observations_agree() {
    init();
    let queue = TaskQueue::new();
    let future = queue.submit(|| 5);
    let clone = future.clone();
    let w = worker::r#async(queue.scheduler(), None);
    queue.close();
    w.wait();

    assert_eq!(future.peek().value(), Some(&5));
    assert_eq!(clone.peek().value(), Some(&5));
    assert_eq!(future.peek().value(), future.peek().value());
}

//! A FIFO [`Scheduler`]: tasks are admitted at the tail and begin
//! execution in submission order.

use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex};

use super::Scheduler;
use crate::task::Task;

/// Type-erases a [`Task<R>`] down to "can be launched", so a single
/// queue can hold tasks of differing return types.
trait Runnable: Send {
    fn run(&mut self);
}

impl<R: 'static> Runnable for Task<R> {
    fn run(&mut self) {
        self.launch();
    }
}

struct State {
    queue: VecDeque<Box<dyn Runnable>>,
    open: bool,
    working: usize,
    completed: bool,
}

/// Re-evaluates and latches the completion flag:
/// `completed <=> !open && queue empty && working == 0`.
///
/// Once `true`, stays `true` — the check is a no-op once latched.
fn recompute_completed(state: &mut State) -> bool {
    if !state.completed && !state.open && state.queue.is_empty() && state.working == 0 {
        state.completed = true;
        log::debug!("scheduler reached completion");
    }
    state.completed
}

struct Inner {
    state: Mutex<State>,
    cv: Condvar,
}

/// A FIFO task queue, the concrete [`Scheduler`] this crate ships.
///
/// The front-end (`TaskQueue` itself) and every [`crate::worker::Worker`]
/// pulling from it share ownership of the same [`Inner`] state via
/// [`TaskQueue::scheduler`]'s `Arc<dyn Scheduler>` — dropping the
/// front-end closes the queue but does not stop workers still draining
/// it, since they hold their own reference to the shared state.
pub struct TaskQueue {
    inner: Arc<Inner>,
}

impl Default for TaskQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskQueue {
    /// Creates a new, open, empty queue.
    pub fn new() -> Self {
        TaskQueue {
            inner: Arc::new(Inner {
                state: Mutex::new(State {
                    queue: VecDeque::new(),
                    open: true,
                    working: 0,
                    completed: false,
                }),
                cv: Condvar::new(),
            }),
        }
    }

    /// A shared handle to this queue's [`Scheduler`] capability, the
    /// form a [`crate::worker::Worker`] is given.
    pub fn scheduler(&self) -> Arc<dyn Scheduler> {
        Arc::clone(&self.inner) as Arc<dyn Scheduler>
    }

    /// Admits a pre-constructed [`Task`]. Returns nothing — the
    /// submitter already holds the task's [`crate::future::Future`].
    ///
    /// If the queue is closed, the task is dropped immediately, which
    /// publishes [`crate::outcome::Outcome::Cancelled`] on its future
    /// (per `Task`'s drop-cancels-if-not-started rule) rather than
    /// losing it silently.
    pub fn add_task<R: 'static>(&self, task: Task<R>) {
        let mut state = self.inner.state.lock().unwrap();
        if state.open {
            log::trace!("task admitted to queue");
            state.queue.push_back(Box::new(task));
            drop(state);
            self.inner.cv.notify_one();
        } else {
            log::warn!("task dropped: queue is closed");
            drop(state);
            drop(task);
        }
    }

    /// Convenience wrapper: packages `callable` into a [`Task`],
    /// submits it, and returns the resulting
    /// [`crate::future::Future`].
    pub fn submit<F, R>(&self, callable: F) -> crate::future::Future<R>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        let (task, future) = Task::create(callable);
        self.add_task(task);
        future
    }

    /// Stops admitting new tasks. Idempotent. Wakes every waiter so a
    /// worker parked with an empty queue can observe completion.
    pub fn close(&self) {
        let mut state = self.inner.state.lock().unwrap();
        if !state.open {
            return;
        }
        state.open = false;
        log::debug!("queue closed with {} pending task(s)", state.queue.len());
        recompute_completed(&mut state);
        drop(state);
        self.inner.cv.notify_all();
    }

    /// Drops every currently pending task, publishing `Cancelled` on
    /// each of their futures. Does not affect `open`, and does not
    /// touch a task a worker has already popped and is executing.
    pub fn cancel(&self) {
        let mut state = self.inner.state.lock().unwrap();
        log::debug!("queue cancelled, dropping {} pending task(s)", state.queue.len());
        let pending = std::mem::take(&mut state.queue);
        recompute_completed(&mut state);
        drop(state);
        drop(pending);
        self.inner.cv.notify_all();
    }

    /// `true` once [`TaskQueue::close`] has been called.
    pub fn is_closed(&self) -> bool {
        !self.inner.state.lock().unwrap().open
    }
}

impl Drop for TaskQueue {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn close_latches_completion_on_an_empty_queue() {
        let queue = TaskQueue::new();
        assert!(!queue.scheduler().is_completed());
        queue.close();
        assert!(queue.scheduler().is_completed());
    }

    #[test]
    fn add_task_after_close_cancels_the_task() {
        let queue = TaskQueue::new();
        queue.close();
        let future = queue.submit(|| 1);
        assert!(future.peek().is_cancelled());
    }

    #[test]
    fn cancel_drains_the_queue_without_closing_it() {
        let queue = TaskQueue::new();
        let pending = queue.submit(|| 1);
        queue.cancel();
        assert!(pending.peek().is_cancelled());
        assert!(!queue.is_closed());
        assert!(!queue.scheduler().is_completed());
    }
}

impl Scheduler for Inner {
    fn start_scheduled_work(&self, predicate: &mut dyn FnMut(bool) -> bool) {
        let mut state = self.state.lock().unwrap();
        loop {
            if state.completed {
                return;
            }
            let work_available = !state.queue.is_empty();
            if !predicate(work_available) {
                return;
            }
            if work_available {
                state.working += 1;
                let mut task = state
                    .queue
                    .pop_front()
                    .expect("work_available implies a non-empty queue");
                drop(state);
                task.run();
                drop(task);
                state = self.state.lock().unwrap();
                state.working -= 1;
                if recompute_completed(&mut state) {
                    drop(state);
                    self.cv.notify_all();
                    return;
                }
            } else {
                state = self.cv.wait(state).unwrap();
            }
        }
    }

    fn check_waiting_predicates(&self) {
        // Taking and releasing the lock before notifying (mirroring
        // `close`/`cancel`) is what makes this safe: a worker that has
        // evaluated its predicate as `true` holds this same lock
        // continuously until it actually calls `self.cv.wait`, so
        // acquiring the lock here cannot succeed until that worker has
        // either returned or is already parked on the condition —
        // never in the gap between the two, where a notify would be
        // silently dropped.
        drop(self.state.lock().unwrap());
        self.cv.notify_all();
    }

    fn is_completed(&self) -> bool {
        self.state.lock().unwrap().completed
    }

    fn wait_until_completed(&self) {
        let mut state = self.state.lock().unwrap();
        while !state.completed {
            state = self.cv.wait(state).unwrap();
        }
    }
}

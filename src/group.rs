//! Task groups: counting barriers over a set of submissions.

use crate::{
    pool::WorkerPool,
    submit::{submit_with, CompletionHook},
    sync::{Arc, Condvar, Mutex},
    task::{Dependency, Task, TaskValue},
};

#[cfg(feature = "tracing")]
use tracing::debug;

struct Barrier {
    /// Number of submitted-but-not-yet-completed tasks in the group.
    active: Mutex<usize>,
    all_done: Condvar,
}

impl Barrier {
    fn new() -> Self {
        Self {
            active: Mutex::new(0),
            all_done: Condvar::new(),
        }
    }

    fn enter(&self) {
        *self.active.lock().expect("Barrier::enter: [1]") += 1;
    }

    fn leave(&self) {
        let all_done = {
            let mut active = self.active.lock().expect("Barrier::leave: [1]");
            *active = active.checked_sub(1).expect("Barrier::leave: [2]");
            *active == 0
        };
        // Signalled outside the critical section, like every other
        // wake-up in the engine.
        if all_done {
            self.all_done.notify_all();
        }
    }

    fn wait_empty(&self) {
        let mut active = self.active.lock().expect("Barrier::wait_empty: [1]");
        while *active > 0 {
            active = self
                .all_done
                .wait(active)
                .expect("Barrier::wait_empty: [2]");
        }
    }
}

/// Ties a set of submissions to a scope: the destructor blocks until every
/// task submitted through the group has finished.
///
/// Groups own none of their tasks; the returned [`Task`] handles may outlive
/// the group for value retrieval, but no new work can be scheduled through a
/// dropped group. Groups are not clonable.
#[must_use]
pub struct TaskGroup<P: WorkerPool> {
    pool: Arc<P>,
    barrier: Arc<Barrier>,
}

impl<P: WorkerPool> TaskGroup<P> {
    /// Create a group submitting to `pool`.
    pub fn new(pool: Arc<P>) -> Self {
        Self {
            pool,
            barrier: Arc::new(Barrier::new()),
        }
    }

    /// Submit a computation that participates in the group barrier.
    /// Semantics are otherwise identical to the free [`submit`](crate::submit).
    pub fn submit<F, R>(&self, dependencies: &[&dyn Dependency], computation: F) -> Task<R>
    where
        F: FnOnce() -> R + Send + 'static,
        R: TaskValue,
    {
        self.submit_iter(dependencies.iter().copied(), computation)
    }

    /// Like [`submit`](Self::submit), with the dependencies supplied by an
    /// iterator.
    pub fn submit_iter<'a, I, F, R>(&self, dependencies: I, computation: F) -> Task<R>
    where
        I: IntoIterator<Item = &'a dyn Dependency>,
        F: FnOnce() -> R + Send + 'static,
        R: TaskValue,
    {
        // Counted before the submit action is installed, so the barrier can
        // never observe zero while this task is in flight.
        self.barrier.enter();
        let hook: CompletionHook = {
            let barrier = self.barrier.clone();
            Box::new(move || barrier.leave())
        };
        submit_with(&self.pool, dependencies, computation, Some(hook))
    }

    /// Block until every task submitted through this group has finished.
    pub fn join(&self) {
        #[cfg(feature = "tracing")]
        debug!("joining task group");

        self.barrier.wait_empty();
    }
}

impl<P: WorkerPool> Drop for TaskGroup<P> {
    fn drop(&mut self) {
        self.join();
    }
}

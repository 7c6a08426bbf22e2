//! Vertices of the dependency graph.
//!
//! A [`Handle`] records everything the engine needs to know about one
//! submitted computation: its lifecycle state, how many predecessors are
//! still outstanding, which successors to release once it finishes, and the
//! deferred action that hands the packaged computation to the worker pool.
//!
//! Every method follows the same discipline: decide under the handle's mutex,
//! act after unlocking. In particular the submit action is never invoked, and
//! the pool is never called, while any handle lock is held.

use crate::{
    pool::Job,
    sync::{Arc, Mutex, MutexGuard},
};
use derive_more::Debug;

/// Shared reference to a [`Handle`].
pub type HandleRef = Arc<Handle>;

/// Lifecycle of a graph vertex. Transitions are forward-only:
/// `Preparing → (Waiting →)? Submitted → Finished`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Still collecting dependencies and the submit action.
    Preparing,
    /// Wiring is complete but not all dependencies have resolved yet.
    Waiting,
    /// Handed over to the worker pool.
    Submitted,
    /// The computation has completed and all dependents were notified.
    Finished,
}

#[derive(Debug)]
struct Inner {
    state: State,
    /// Number of predecessors that have not finished yet.
    dependencies_left: usize,
    /// Successors to release when this vertex finishes. Cleared by
    /// [`Handle::finish`], which also breaks the reference cycle between a
    /// vertex and the tasks of its dependents.
    dependents: Vec<HandleRef>,
    /// Single-shot action that enqueues the packaged computation on the
    /// worker pool. Taken exactly once, under the lock.
    #[debug(skip)]
    submit_task: Option<Job>,
}

impl Inner {
    /// Take the submit action and mark the vertex submitted. The returned
    /// action must be invoked by the caller after releasing the lock.
    fn take_for_submit(&mut self) -> Job {
        let submit_task = self.submit_task.take().expect("Inner::take_for_submit: [1]");
        self.state = State::Submitted;
        submit_task
    }
}

/// A vertex of the dependency graph.
///
/// Handles are reference-counted; the edges of the graph are the
/// [`HandleRef`]s stored in each vertex's dependent list, plus the references
/// held by the tasks handed back to callers.
#[must_use]
#[derive(Debug)]
pub struct Handle {
    inner: Mutex<Inner>,
}

impl Handle {
    /// Create a fresh vertex in the preparing state.
    pub fn new() -> HandleRef {
        Arc::new(Self {
            inner: Mutex::new(Inner {
                state: State::Preparing,
                dependencies_left: 0,
                dependents: Vec::new(),
                submit_task: None,
            }),
        })
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().expect("Handle::lock: poisoned")
    }

    /// Enlist `dependent` to be released when this vertex finishes.
    ///
    /// Returns `false` if this vertex has already finished, in which case the
    /// dependent must not count this edge as outstanding.
    fn add_dependent(&self, dependent: HandleRef) -> bool {
        let mut inner = self.lock();
        if inner.state == State::Finished {
            false
        } else {
            inner.dependents.push(dependent);
            true
        }
    }

    /// Register `dependency` as a predecessor of `this`.
    ///
    /// Must only be called while `this` is still being wired by the
    /// submitting caller. The outstanding count is raised *before* `this`
    /// becomes visible through the predecessor's dependent list, so a
    /// predecessor finishing concurrently can never drive the count below
    /// zero; if the predecessor turns out to have finished already, the
    /// provisional edge is taken back.
    ///
    /// # Panics
    /// If `this` has left the preparing state.
    pub fn add_dependency(this: &HandleRef, dependency: &HandleRef) {
        {
            let mut inner = this.lock();
            assert_eq!(
                inner.state,
                State::Preparing,
                "dependency registered after preparation finished"
            );
            inner.dependencies_left += 1;
        }
        if !dependency.add_dependent(Arc::clone(this)) {
            // Already finished: there is nothing to wait for.
            let mut inner = this.lock();
            inner.dependencies_left -= 1;
        }
    }

    /// Install the action that hands the packaged computation to the worker
    /// pool. Called exactly once, while preparing.
    ///
    /// # Panics
    /// If called twice or after preparation finished.
    pub fn set_submit_task(&self, submit_task: Job) {
        let mut inner = self.lock();
        assert!(
            inner.state == State::Preparing && inner.submit_task.is_none(),
            "submit action installed twice or after preparation finished"
        );
        inner.submit_task = Some(submit_task);
    }

    /// End the preparatory phase.
    ///
    /// If every registered dependency has already resolved (including the
    /// postponed case where the count returned to zero while still
    /// preparing), the submit action runs now; otherwise the vertex starts
    /// waiting for its predecessors to finish.
    ///
    /// # Panics
    /// If called outside the preparing state.
    pub fn finish_preparation(&self) {
        let submit = {
            let mut inner = self.lock();
            assert_eq!(
                inner.state,
                State::Preparing,
                "preparation finished twice"
            );
            if inner.dependencies_left == 0 {
                Some(inner.take_for_submit())
            } else {
                inner.state = State::Waiting;
                None
            }
        };
        if let Some(submit) = submit {
            submit();
        }
    }

    /// Invoked by a predecessor when it finishes.
    ///
    /// Decrements the outstanding count; the vertex whose count reaches zero
    /// while waiting is submitted. Reaching zero while still preparing is
    /// deliberately a no-op: `finish_preparation` will observe the zero and
    /// enqueue.
    fn remove_dependency(&self) {
        let submit = {
            let mut inner = self.lock();
            inner.dependencies_left = inner
                .dependencies_left
                .checked_sub(1)
                .expect("Handle::remove_dependency: [1]");
            if inner.dependencies_left > 0 {
                None
            } else {
                match inner.state {
                    State::Preparing => None, // postponed
                    State::Waiting => Some(inner.take_for_submit()),
                    State::Submitted | State::Finished => {
                        unreachable!("Handle::remove_dependency: [2]")
                    }
                }
            }
        };
        if let Some(submit) = submit {
            submit();
        }
    }

    /// Mark the vertex finished and move its dependent list out.
    ///
    /// The returned [`Notifier`] must be run *after* the result slot has been
    /// fulfilled; dependents released by it may immediately read the value.
    /// Keeping notification out of the critical section (and out of this
    /// method) is what guarantees that ordering.
    ///
    /// # Panics
    /// If the vertex has not been submitted.
    pub fn finish(&self) -> Notifier {
        let mut inner = self.lock();
        assert_eq!(inner.state, State::Submitted, "Handle::finish: [1]");
        inner.state = State::Finished;
        Notifier(core::mem::take(&mut inner.dependents))
    }
}

impl Drop for Handle {
    fn drop(&mut self) {
        // A handle is kept alive by its task, by predecessors' dependent
        // lists and by the closures of the packaged computation; it can only
        // be released once the computation has run to completion.
        if std::thread::panicking() {
            return;
        }
        debug_assert_eq!(
            self.lock().state,
            State::Finished,
            "handle dropped before its computation finished"
        );
    }
}

/// Deferred dependent notification produced by [`Handle::finish`].
///
/// Running it decrements each former dependent's outstanding count,
/// submitting those that become ready.
#[must_use]
#[derive(Debug)]
pub struct Notifier(Vec<HandleRef>);

impl Notifier {
    /// Release every dependent captured at finish time.
    pub fn run(self) {
        for dependent in self.0 {
            dependent.remove_dependency();
        }
    }
}

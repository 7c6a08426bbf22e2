//! Submission front-ends.
//!
//! Packaging of a user computation into worker-pool jobs, in one fixed
//! sequence: run the computation, fulfil the result slot, finish the vertex,
//! hand the dependent notification to the pool as its own job, then run the
//! optional completion hook. Fulfilling before finishing is what lets a
//! dependent read its predecessors' values without ever blocking; notifying
//! on a fresh job keeps a long dependency chain from being serviced as one
//! ever-deepening call chain on a single worker.

use crate::{
    handle::Handle,
    pool::WorkerPool,
    result::{Outcome, ResultCell, TaskPanic},
    sync::Arc,
    task::{Dependency, Task, TaskValue},
};
use std::panic::{catch_unwind, AssertUnwindSafe};

#[cfg(feature = "tracing")]
use tracing::trace;

/// Hook run on the worker after a computation has completed and its
/// dependents have been handed off; used by task groups to maintain their
/// barrier count.
pub(crate) type CompletionHook = Box<dyn FnOnce() + Send + 'static>;

/// Submit `computation` to `pool`, to run once every task in `dependencies`
/// has finished.
///
/// Dependencies may be of heterogeneous value types; pass the tasks by
/// reference: `submit(&pool, &[&a, &b], move || ...)`. The returned task can
/// be waited on, read, and used as a dependency of later submissions. If the
/// computation's return type is itself a task, dependents of the returned
/// task wait for the *inner* completion, and
/// [`get_value`](Task::get_value) resolves to the innermost value.
pub fn submit<P, F, R>(pool: &Arc<P>, dependencies: &[&dyn Dependency], computation: F) -> Task<R>
where
    P: WorkerPool,
    F: FnOnce() -> R + Send + 'static,
    R: TaskValue,
{
    submit_iter(pool, dependencies.iter().copied(), computation)
}

/// Like [`submit`], with the dependencies supplied by an iterator.
pub fn submit_iter<'a, P, I, F, R>(pool: &Arc<P>, dependencies: I, computation: F) -> Task<R>
where
    P: WorkerPool,
    I: IntoIterator<Item = &'a dyn Dependency>,
    F: FnOnce() -> R + Send + 'static,
    R: TaskValue,
{
    submit_with(pool, dependencies, computation, None)
}

pub(crate) fn submit_with<'a, P, I, F, R>(
    pool: &Arc<P>,
    dependencies: I,
    computation: F,
    completion_hook: Option<CompletionHook>,
) -> Task<R>
where
    P: WorkerPool,
    I: IntoIterator<Item = &'a dyn Dependency>,
    F: FnOnce() -> R + Send + 'static,
    R: TaskValue,
{
    let result = Arc::new(ResultCell::new());
    let handle = Handle::new();

    for dependency in dependencies {
        Handle::add_dependency(&handle, &dependency.wiring_handle());
    }

    handle.set_submit_task({
        let pool = pool.clone();
        let handle = handle.clone();
        let result = result.clone();
        Box::new(move || {
            #[cfg(feature = "tracing")]
            trace!("handing task to the worker pool");

            let notify_pool = pool.clone();
            pool.submit(Box::new(move || {
                let outcome = match catch_unwind(AssertUnwindSafe(computation)) {
                    Ok(value) => Outcome::Returned(value),
                    Err(payload) => Outcome::Panicked(TaskPanic::from_payload(payload.as_ref())),
                };
                result.fulfil(outcome);
                let notify = handle.finish();
                notify_pool.submit(Box::new(move || notify.run()));
                if let Some(hook) = completion_hook {
                    hook();
                }
            }));
        })
    });
    handle.finish_preparation();

    Task::new(pool, handle, result)
}

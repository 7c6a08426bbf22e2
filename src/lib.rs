//! Dependency-aware task submission on top of a worker pool.
//!
//! This crate layers deferred, dependency-driven scheduling over any
//! fixed-size worker pool. Callers build a directed acyclic graph one
//! submission at a time: each task names the previously submitted tasks it
//! depends on, and its computation is handed to the pool only once every one
//! of them has finished. It:
//! - Tracks each task through an explicit four-state lifecycle guarded by a
//!   per-task mutex, guaranteeing the packaged computation is enqueued
//!   exactly once and only after all predecessors completed.
//! - Delivers results through one-shot, multi-reader slots, with the
//!   fulfil-then-notify ordering that lets a dependent read its
//!   predecessors' values without ever blocking a worker.
//! - Flattens task-valued tasks, so dependents of a `Task<Task<T>>` wait on
//!   the innermost completion and `get_value` resolves transitively.
//! - Provides counting-barrier task groups whose destructor waits for every
//!   task submitted through them.
//!
//! Key modules:
//! - `pool`: the single-capability [`WorkerPool`] seam (implemented for
//!   `rayon::ThreadPool` and by the deterministic [`InlinePool`]).
//! - `handle`: graph vertices holding the per-task state machine, the
//!   dependency counts and the deferred submit action.
//! - `task`: the caller-visible [`Task`], value resolution via
//!   [`TaskValue`], and the nested-task fixup.
//! - `group`: [`TaskGroup`] counting barriers.
//!
//! Quick start:
//! 1. Build a pool, e.g. `rayon::ThreadPoolBuilder::new().num_threads(4)
//!    .build()`, and wrap it in an `Arc`.
//! 2. Call [`submit`] with the tasks the new computation depends on; inside
//!    the computation read their values with [`Task::get_value`]; it is
//!    guaranteed not to block there.
//! 3. Wait for and read any task's value with [`Task::get_value`] /
//!    [`Task::get`] / [`Task::wait`], from as many threads as you like.
//!
//! ```
//! use deptask::submit;
//! use std::sync::Arc;
//!
//! let pool = Arc::new(deptask::InlinePool);
//! let a = submit(&pool, &[], || 7);
//! let b = submit(&pool, &[], || 22);
//! let sum = submit(&pool, &[&a, &b], {
//!     let (a, b) = (a.clone(), b.clone());
//!     move || *a.get_value() + *b.get_value()
//! });
//! assert_eq!(*sum.get_value(), 29);
//! ```
//!
//! The engine never blocks inside its own machinery and spawns no threads;
//! the only blocking operations are the waits on tasks and groups. Cycles
//! cannot be expressed through this interface (a submission can only depend
//! on tasks that already exist), so no runtime cycle detection is performed.

pub mod group;
// Internal machinery, exposed for the concurrency model tests; not part of
// the supported API surface.
#[doc(hidden)]
pub mod handle;
pub mod pool;
mod result;
mod submit;
mod sync;
pub mod task;
mod types;

pub use group::TaskGroup;
pub use pool::{InlinePool, Job, WorkerPool};
pub use result::TaskPanic;
pub use submit::{submit, submit_iter};
pub use task::{Dependency, Task, TaskValue};

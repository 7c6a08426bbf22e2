//! Caller-facing tasks and the value-resolution seam.
//!
//! A [`Task`] pairs the graph vertex of a computation with the one-shot slot
//! its value lands in. The [`TaskValue`] trait is what makes task-valued
//! tasks work: it tells the engine which vertex a dependent should actually
//! register against (for a plain value, the producing vertex; for a task
//! value, a vertex that only finishes once the *inner* task has), and it
//! resolves `get_value` transitively through any nesting depth.

use crate::{
    handle::{Handle, HandleRef},
    pool::WorkerPool,
    result::{Outcome, ResultCell, TaskPanic},
    sync::Arc,
};
use core::fmt;

/// A value a task computation may produce.
///
/// Plain value types resolve to themselves and carry no completion of their
/// own; implement the trait for your own types with [`task_value!`]:
///
/// ```
/// use deptask::task_value;
///
/// struct Temperature(f64);
/// task_value!(Temperature);
/// ```
///
/// `Task<R>` implements the trait too, which is what gives nested
/// submissions (a task whose value is itself a task) their flattened
/// semantics.
pub trait TaskValue: Send + Sync + 'static {
    /// The innermost type this value resolves to. `Self` for plain values;
    /// for `Task<R>` it is whatever `R` resolves to.
    type Resolved: Send + Sync + 'static;

    /// Borrow the fully resolved value, blocking on any nested completion.
    fn resolved(&self) -> &Self::Resolved;

    /// Block until the value itself has fully completed. No-op for plain
    /// values.
    fn wait_resolved(&self) {}

    /// The vertex a dependent must wait for once this value has been
    /// produced. `None` for values that carry no completion of their own.
    #[doc(hidden)]
    fn completion_handle(&self) -> Option<HandleRef> {
        None
    }

    /// Whether values of this type carry their own completion, i.e. whether
    /// the submission front-end must build the flattening fixup.
    #[doc(hidden)]
    const NESTED: bool = false;
}

/// Implements [`TaskValue`] for plain value types that resolve to
/// themselves.
#[macro_export]
macro_rules! task_value {
    ($($ty:ty),+ $(,)?) => {$(
        impl $crate::TaskValue for $ty {
            type Resolved = Self;

            fn resolved(&self) -> &Self {
                self
            }
        }
    )+};
}

task_value!(
    (),
    bool,
    char,
    i8,
    i16,
    i32,
    i64,
    i128,
    isize,
    u8,
    u16,
    u32,
    u64,
    u128,
    usize,
    f32,
    f64,
    String,
    &'static str,
);

impl<T: Send + Sync + 'static> TaskValue for Vec<T> {
    type Resolved = Self;

    fn resolved(&self) -> &Self {
        self
    }
}

impl<T: Send + Sync + 'static> TaskValue for Option<T> {
    type Resolved = Self;

    fn resolved(&self) -> &Self {
        self
    }
}

/// Anything a new submission may declare a happens-before edge on.
///
/// Implemented by every [`Task`]; the trait is object-safe so that
/// heterogeneously-typed tasks can share one dependency list:
/// `&[&a, &b]` where `a: Task<i32>` and `b: Task<()>`.
pub trait Dependency {
    /// The graph vertex a dependent must wait for.
    #[doc(hidden)]
    fn wiring_handle(&self) -> HandleRef;
}

impl<R: TaskValue> Dependency for Task<R> {
    fn wiring_handle(&self) -> HandleRef {
        self.nested.clone()
    }
}

/// A submitted computation paired with its one-shot result slot.
///
/// Tasks are cheap to clone and may be held, waited on and read by any
/// number of threads. The handle backing a task stays alive for as long as
/// any clone of the task (or any unfinished dependent) references it.
#[must_use]
pub struct Task<R> {
    /// Vertex of the computation that produces this task's value.
    handle: HandleRef,
    /// Vertex dependents register against. Equal to `handle` except for
    /// task-valued tasks, where it refers to the flattening fixup's inner
    /// vertex and thus finishes only once the innermost value exists.
    nested: HandleRef,
    result: Arc<ResultCell<R>>,
}

impl<R> Clone for Task<R> {
    fn clone(&self) -> Self {
        Self {
            handle: self.handle.clone(),
            nested: self.nested.clone(),
            result: self.result.clone(),
        }
    }
}

impl<R> fmt::Debug for Task<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("handle", &self.handle)
            .finish_non_exhaustive()
    }
}

impl<R: TaskValue> Task<R> {
    pub(crate) fn new<P: WorkerPool>(
        pool: &Arc<P>,
        handle: HandleRef,
        result: Arc<ResultCell<R>>,
    ) -> Self {
        let nested = if R::NESTED {
            flattened_handle(pool, &handle, &result)
        } else {
            handle.clone()
        };
        Self {
            handle,
            nested,
            result,
        }
    }

    /// Block until the computation, and any nested task it produced, has
    /// completed. Returns normally even if the computation panicked; the
    /// panic resurfaces on [`get`](Self::get).
    pub fn wait(&self) {
        if let Outcome::Returned(value) = self.result.outcome() {
            value.wait_resolved();
        }
    }

    /// Wait for the computation and borrow the produced value.
    ///
    /// For a task-valued task this is the *outer* value, i.e. the inner task
    /// itself; use [`get_value`](Self::get_value) for the resolved value.
    ///
    /// # Panics
    /// Resurfaces the panic of a failed computation.
    pub fn get(&self) -> &R {
        match self.result.outcome() {
            Outcome::Returned(value) => value,
            Outcome::Panicked(panic) => panic.resurface(),
        }
    }

    /// Wait transitively through any nesting and borrow the innermost value.
    ///
    /// # Panics
    /// Resurfaces the panic of a failed computation at any nesting level.
    pub fn get_value(&self) -> &R::Resolved {
        self.get().resolved()
    }

    /// Like [`get`](Self::get), but reports a captured panic as an error
    /// instead of resuming it.
    pub fn try_get(&self) -> Result<&R, &TaskPanic> {
        match self.result.outcome() {
            Outcome::Returned(value) => Ok(value),
            Outcome::Panicked(panic) => Err(panic),
        }
    }
}

impl<R: TaskValue> TaskValue for Task<R> {
    type Resolved = R::Resolved;

    fn resolved(&self) -> &R::Resolved {
        self.get().resolved()
    }

    fn wait_resolved(&self) {
        self.wait();
    }

    fn completion_handle(&self) -> Option<HandleRef> {
        Some(self.nested.clone())
    }

    const NESTED: bool = true;
}

/// Builds the auxiliary vertex pair for a task whose value is itself a task.
///
/// Dependents of such a task must not become eligible when the *outer*
/// computation returns (its value, the inner task, may still be running) but
/// only once the innermost value exists. Two auxiliary vertices arrange
/// that:
///
/// * an outer vertex depends on the origin computation; once that has
///   finished, its submit action schedules a worker job that registers the
///   produced task's own completion vertex as a dependency of the inner
///   vertex and then ends the inner vertex's preparation;
/// * the inner vertex does no work of its own and finishes as soon as the
///   produced task has. It is the vertex handed out by
///   [`Dependency::wiring_handle`].
///
/// Because the produced task's completion vertex is itself a `nested`
/// handle, arbitrary nesting depths compose through this fixup.
fn flattened_handle<P: WorkerPool, R: TaskValue>(
    pool: &Arc<P>,
    origin: &HandleRef,
    result: &Arc<ResultCell<R>>,
) -> HandleRef {
    let outer = Handle::new();
    let inner = Handle::new();

    inner.set_submit_task({
        let inner = inner.clone();
        let pool = pool.clone();
        Box::new(move || {
            let notify = inner.finish();
            pool.submit(Box::new(move || notify.run()));
        })
    });

    Handle::add_dependency(&outer, origin);
    outer.set_submit_task({
        let outer = outer.clone();
        let inner = inner.clone();
        let pool = pool.clone();
        let result = result.clone();
        Box::new(move || {
            pool.submit(Box::new(move || {
                // The origin computation has finished, so its slot is
                // already fulfilled and this read does not block. A panicked
                // computation produced no task: the inner vertex then
                // finishes immediately and dependents fail on their own
                // reads.
                if let Outcome::Returned(value) = result.outcome() {
                    if let Some(produced) = value.completion_handle() {
                        Handle::add_dependency(&inner, &produced);
                    }
                }
                inner.finish_preparation();
                outer.finish().run();
            }));
        })
    });
    outer.finish_preparation();

    inner
}

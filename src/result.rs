//! One-shot result slots.
//!
//! A [`ResultCell`] is fulfilled exactly once by the worker that ran the
//! computation and may be waited on by any number of threads, before or after
//! fulfilment. Fulfilment stores either the returned value or the captured
//! panic of the computation.

use crate::{
    sync::{Condvar, Mutex},
    types::SyncUnsafeCell,
};
use std::any::Any;
use thiserror::Error;

/// A panic captured from a task computation.
///
/// Stored in the task's result slot in place of a value; resurfaces when the
/// result is read. Only the panic message is retained: panic payloads are not
/// shareable across the multiple readers of a result slot.
#[derive(Debug, Clone, Error)]
#[error("task panicked: {message}")]
pub struct TaskPanic {
    message: Box<str>,
}

impl TaskPanic {
    pub(crate) fn from_payload(payload: &(dyn Any + Send)) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_owned()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic".to_owned()
        };
        Self {
            message: message.into_boxed_str(),
        }
    }

    /// The message of the captured panic.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Re-raise the captured panic on the calling thread.
    pub(crate) fn resurface(&self) -> ! {
        std::panic::panic_any(self.message.to_string())
    }
}

/// Outcome of a finished computation.
pub(crate) enum Outcome<T> {
    Returned(T),
    Panicked(TaskPanic),
}

/// Single-producer, multi-consumer one-shot value cell.
///
/// The value lives outside the mutex so that readers can hold `&` borrows of
/// it without keeping the cell locked. Soundness relies on the write-once
/// protocol: the cell is written only while `fulfilled` is still false and
/// the flag is flipped under the same critical section, so any reader that
/// has observed the flag reads an immutable, fully published value.
pub(crate) struct ResultCell<T> {
    fulfilled: Mutex<bool>,
    cond: Condvar,
    value: SyncUnsafeCell<Option<Outcome<T>>>,
}

impl<T> ResultCell<T> {
    pub(crate) fn new() -> Self {
        Self {
            fulfilled: Mutex::new(false),
            cond: Condvar::new(),
            value: SyncUnsafeCell::new(None),
        }
    }

    /// Store the outcome and wake every waiter.
    ///
    /// # Panics
    /// If the cell has already been fulfilled.
    pub(crate) fn fulfil(&self, outcome: Outcome<T>) {
        {
            let mut fulfilled = self.fulfilled.lock().expect("ResultCell::fulfil: [1]");
            assert!(!*fulfilled, "ResultCell::fulfil: [2]");
            // SAFETY: the flag is still false, so no reader dereferences the
            // cell yet, and this is the only write ever performed.
            self.value.with_mut(|slot| unsafe { *slot = Some(outcome) });
            *fulfilled = true;
        }
        self.cond.notify_all();
    }

    /// Block until the outcome has been stored.
    pub(crate) fn wait(&self) {
        let mut fulfilled = self.fulfilled.lock().expect("ResultCell::wait: [1]");
        while !*fulfilled {
            fulfilled = self.cond.wait(fulfilled).expect("ResultCell::wait: [2]");
        }
    }

    /// Wait for fulfilment, then borrow the stored outcome.
    pub(crate) fn outcome(&self) -> &Outcome<T> {
        self.wait();
        // SAFETY: `fulfilled` was observed true under the mutex, so the
        // single write happened-before this read and no further write occurs
        // for the lifetime of the cell.
        self.value
            .with(|slot| unsafe { (*slot).as_ref().expect("ResultCell::outcome: [1]") })
    }
}

#[cfg(feature = "loom")]
mod imp {
    pub(crate) use loom::{
        cell::UnsafeCell,
        sync::{Arc, Condvar, Mutex, MutexGuard},
    };
}

#[cfg(not(feature = "loom"))]
mod imp {
    pub(crate) use core::cell::UnsafeCell;
    pub(crate) use std::sync::{Arc, Condvar, Mutex, MutexGuard};
}

pub(crate) use imp::*;

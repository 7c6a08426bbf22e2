#![cfg(not(feature = "loom"))]

mod common;

use common::pool;
use deptask::TaskGroup;
use std::sync::{
    atomic::{AtomicI32, AtomicUsize, Ordering},
    Arc,
};

#[test]
fn group_scope_exit_waits_for_all() {
    let tp = pool(2);
    let a_val = Arc::new(AtomicI32::new(0));
    let b_val = Arc::new(AtomicI32::new(0));
    let c_val = Arc::new(AtomicI32::new(0));
    let d_val = Arc::new(AtomicI32::new(0));
    let e_val = Arc::new(AtomicI32::new(0));

    {
        let group = TaskGroup::new(tp.clone());
        let a = group.submit(&[], {
            let a_val = a_val.clone();
            move || a_val.store(7, Ordering::Relaxed)
        });
        let b = group.submit(&[], {
            let b_val = b_val.clone();
            move || b_val.store(22, Ordering::Relaxed)
        });
        let c = group.submit(&[&a, &b], {
            let (a_val, b_val, c_val) = (a_val.clone(), b_val.clone(), c_val.clone());
            move || {
                c_val.store(
                    a_val.load(Ordering::Relaxed) + b_val.load(Ordering::Relaxed),
                    Ordering::Relaxed,
                );
            }
        });
        let d = group.submit(&[], {
            let d_val = d_val.clone();
            move || d_val.store(13, Ordering::Relaxed)
        });
        let _e = group.submit(&[&c, &d], {
            let (c_val, d_val, e_val) = (c_val.clone(), d_val.clone(), e_val.clone());
            move || {
                e_val.store(
                    c_val.load(Ordering::Relaxed) + d_val.load(Ordering::Relaxed),
                    Ordering::Relaxed,
                );
            }
        });
        // Leaving the scope joins the group.
    }

    assert_eq!(e_val.load(Ordering::Relaxed), 42);
}

#[test]
fn join_observes_every_submission_finished() {
    let tp = pool(4);
    let finished = Arc::new(AtomicUsize::new(0));

    let group = TaskGroup::new(tp);
    for _ in 0..32 {
        let _ = group.submit(&[], {
            let finished = finished.clone();
            move || {
                finished.fetch_add(1, Ordering::Relaxed);
            }
        });
    }

    group.join();
    assert_eq!(finished.load(Ordering::Relaxed), 32);

    // Joining again (and once more from the destructor) is harmless.
    group.join();
}

#[test]
fn group_tasks_can_outlive_the_group_for_retrieval() {
    let tp = pool(2);
    let task = {
        let group = TaskGroup::new(tp);
        group.submit(&[], || 6 * 7)
    };
    // The group has been joined; the value stays retrievable.
    assert_eq!(*task.get_value(), 42);
}

#![cfg(not(feature = "loom"))]

mod common;

use common::pool;
use deptask::{submit, Task};
use std::sync::Arc;

fn fib_task(pool: &Arc<rayon::ThreadPool>, n: u32) -> Task<u32> {
    if n <= 1 {
        return submit(pool, &[], move || n);
    }
    let a = fib_task(pool, n - 1);
    let b = fib_task(pool, n - 2);
    submit(pool, &[&a, &b], {
        let (a, b) = (a.clone(), b.clone());
        move || *a.get_value() + *b.get_value()
    })
}

#[test]
fn recursive_fibonacci() {
    let expected = [0u32, 1, 1, 2, 3, 5, 8];
    for workers in [4, 2, 1] {
        for (n, want) in expected.iter().enumerate() {
            let tp = pool(workers);
            // The whole graph is built from inside a worker, so the result is
            // a task-valued task.
            let res = {
                let inner = tp.clone();
                submit(&tp, &[], move || fib_task(&inner, n as u32))
            };
            assert_eq!(*res.get_value(), *want);
        }
    }
}

#[test]
fn nested_task_as_dependency_waits_for_inner() {
    // A single worker makes the flattening observable: if the dependent were
    // released when the outer computation returned, reading the inner value
    // would block the only worker forever.
    let tp = pool(1);
    let nested = {
        let inner = tp.clone();
        submit(&tp, &[], move || submit(&inner, &[], || 21))
    };
    let doubled = submit(&tp, &[&nested], {
        let nested = nested.clone();
        move || *nested.get_value() * 2
    });
    assert_eq!(*doubled.get_value(), 42);
}

#[test]
fn doubly_nested_values_resolve_transitively() {
    let tp = pool(2);
    let deep = {
        let mid = tp.clone();
        submit(&tp, &[], move || {
            let leaf = mid.clone();
            submit(&mid, &[], move || submit(&leaf, &[], || 5))
        })
    };
    assert_eq!(*deep.get_value(), 5);

    let inc = submit(&tp, &[&deep], {
        let deep = deep.clone();
        move || *deep.get_value() + 1
    });
    assert_eq!(*inc.get_value(), 6);
}

#[test]
fn get_returns_the_inner_task() {
    let tp = pool(2);
    let nested = {
        let inner = tp.clone();
        submit(&tp, &[], move || submit(&inner, &[], || 7))
    };
    // The outer value is the inner task itself; the resolved value is its
    // result.
    let inner_task: &Task<i32> = nested.get();
    assert_eq!(*inner_task.get_value(), 7);
    assert_eq!(*nested.get_value(), 7);
}

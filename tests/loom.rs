#![allow(missing_docs)]
#![cfg(feature = "loom")]

use deptask::handle::Handle;
use loom::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

#[test]
fn loom_submit_action_runs_once_when_wiring_races_with_finish() {
    loom::model(|| {
        // One predecessor, already submitted; its completion races against
        // the wiring of a successor. This covers every timing of the
        // postponed-zero case: the predecessor may finish before the edge is
        // registered, between registration and the end of preparation, or
        // after the successor started waiting.
        let predecessor = Handle::new();
        predecessor.set_submit_task(Box::new(|| {}));
        predecessor.finish_preparation();

        let invocations = Arc::new(AtomicUsize::new(0));
        let successor = Handle::new();
        successor.set_submit_task({
            let invocations = invocations.clone();
            Box::new(move || {
                invocations.fetch_add(1, Ordering::Relaxed);
            })
        });

        let finisher = {
            let predecessor = predecessor.clone();
            loom::thread::spawn(move || {
                predecessor.finish().run();
            })
        };

        Handle::add_dependency(&successor, &predecessor);
        successor.finish_preparation();

        finisher.join().unwrap();

        assert_eq!(invocations.load(Ordering::Relaxed), 1);

        // Drive the successor to rest before the model drops it.
        successor.finish().run();
    });
}

#[test]
fn loom_two_predecessors_release_one_successor_exactly_once() {
    loom::model(|| {
        let submitted = || {
            let handle = Handle::new();
            handle.set_submit_task(Box::new(|| {}));
            handle.finish_preparation();
            handle
        };
        let first = submitted();
        let second = submitted();

        let invocations = Arc::new(AtomicUsize::new(0));
        let successor = Handle::new();
        successor.set_submit_task({
            let invocations = invocations.clone();
            Box::new(move || {
                invocations.fetch_add(1, Ordering::Relaxed);
            })
        });
        Handle::add_dependency(&successor, &first);
        Handle::add_dependency(&successor, &second);

        let finishers = [first, second].map(|predecessor| {
            loom::thread::spawn(move || {
                predecessor.finish().run();
            })
        });

        successor.finish_preparation();

        for finisher in finishers {
            finisher.join().unwrap();
        }

        assert_eq!(invocations.load(Ordering::Relaxed), 1);

        successor.finish().run();
    });
}

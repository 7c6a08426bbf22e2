// Shared helpers for the integration test suite.

use std::sync::Arc;

/// Fixed-size rayon pool, wrapped for submission.
pub fn pool(workers: usize) -> Arc<rayon::ThreadPool> {
    Arc::new(
        rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .build()
            .unwrap(),
    )
}

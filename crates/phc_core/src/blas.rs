//! BLAS/thread-pool pinning (C12, `spec.md` §5, §9).
//!
//! Because the inner linear algebra of a single path is called from
//! within outer (per-path) parallelism, `track!` must pin its linear
//! algebra to a single thread for the duration of the call, restoring
//! the previous thread count on every exit path including panics.
//!
//! Grounded on `rayon`'s documented scoped-pool pattern, the same tool
//! the pack uses for bounding parallel linear-algebra concurrency
//! (Ariadne's `faer`+`rayon` solver, thermoflow's `tf-solver`, and
//! nyx-space's batch propagation all reach for `rayon` rather than
//! mutating a process-global thread count). A dedicated local pool
//! (rather than `rayon::ThreadPoolBuilder::build_global`, which can
//! only be installed once per process) sidesteps the "restore on
//! exit" requirement entirely: nothing process-global is ever mutated,
//! so a panic inside the closure can never leave a stale global thread
//! count behind.

use rayon::{ThreadPool, ThreadPoolBuilder};

/// Builds a scoped thread pool pinned to `num_threads` and runs `f`
/// inside it via [`rayon::ThreadPool::install`]. Nested calls (e.g. the
/// Cauchy endgame driving `CoreTracker::track!` from within
/// `PathTracker::track!`, itself already inside a guard) install
/// safely — `rayon` pools nest without deadlocking.
pub fn with_pinned_threads<R>(num_threads: usize, f: impl FnOnce() -> R) -> R {
    match build_pool(num_threads) {
        Ok(pool) => pool.install(f),
        Err(_) => f(),
    }
}

fn build_pool(num_threads: usize) -> Result<ThreadPool, rayon::ThreadPoolBuildError> {
    ThreadPoolBuilder::new()
        .num_threads(num_threads.max(1))
        .build()
}

/// Convenience wrapper used by `track!`: pins to a single thread.
pub fn with_single_thread<R>(f: impl FnOnce() -> R) -> R {
    with_pinned_threads(1, f)
}

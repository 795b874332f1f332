use std::cmp::Ordering;
use std::thread::available_parallelism;

use eyre::Result;
use rayon::{ThreadPool, ThreadPoolBuilder};

// 0 -> single thread, negative -> all but |requested| - 1 threads, positive -> capped at max
fn _normalize(requested: isize, max: isize) -> usize {
    match requested.cmp(&0) {
        Ordering::Less => (max + requested + 1).max(1) as usize,
        Ordering::Equal => 1,
        Ordering::Greater => requested.min(max) as usize,
    }
}

pub fn available(requested: isize) -> Result<usize> {
    let max = available_parallelism()?.get() as isize;
    Ok(_normalize(requested, max))
}

/// Dedicated rayon pool that also runs work on the calling thread.
pub fn pool(requested: isize) -> Result<ThreadPool> {
    let pool = ThreadPoolBuilder::new()
        .num_threads(available(requested)?)
        .use_current_thread()
        .build()?;
    Ok(pool)
}

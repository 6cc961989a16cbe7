//! Identifier allocation for incomplete keys
//!
//! New ids are sampled from the wall clock in 100ns ticks since the Unix
//! epoch, so ids of successively written entities roughly follow write time.
//! Allocation is serialized through one atomic per engine: every id is
//! strictly greater than the previous one, even when many threads sample the
//! same clock tick. Ids are unique within one engine instance only; two
//! processes writing to the same storage can still collide.

use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Monotonic id source
#[derive(Debug, Default)]
pub struct IdAllocator {
    last: AtomicI64,
}

impl IdAllocator {
    /// Create an allocator
    pub fn new() -> Self {
        Self::default()
    }

    fn clock_sample() -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| (d.as_nanos() / 100) as i64)
            .unwrap_or(0)
    }

    /// Allocate the next id
    pub fn next_id(&self) -> i64 {
        let mut last = self.last.load(Ordering::SeqCst);
        loop {
            let next = Self::clock_sample().max(last.saturating_add(1)).max(1);
            match self
                .last
                .compare_exchange(last, next, Ordering::SeqCst, Ordering::SeqCst)
            {
                Ok(_) => return next,
                Err(current) => last = current,
            }
        }
    }
}

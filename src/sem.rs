//! Counting semaphores.
//!
//! Semaphores live in a fixed pool inside the kernel state; the public
//! [`Semaphore`] handle is an opaque pool index with stable identity for
//! the whole run (there is no destroy operation). A negative count means
//! `-count` threads are waiting; the waiters themselves are recorded in
//! their own control blocks, not here.

use crate::config::{MAX_SEMAPHORES, QUEUE_SEM_SLOTS};
use crate::critical;
use crate::error::Error;
use crate::kernel::KERNEL;

/// Handle to a pool semaphore. Cheap to copy, valid forever.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Semaphore(pub(crate) usize);

/// The semaphore pool. Slots below `QUEUE_SEM_SLOTS` are owned by the
/// queues; `create` hands out the rest and never reuses a slot.
pub(crate) struct SemTable {
    counts: [i32; MAX_SEMAPHORES],
    next_free: usize,
}

impl SemTable {
    pub(crate) const fn new() -> Self {
        SemTable {
            counts: [0; MAX_SEMAPHORES],
            next_free: QUEUE_SEM_SLOTS,
        }
    }

    pub(crate) fn create(&mut self, initial: i32) -> Result<Semaphore, Error> {
        if self.next_free == MAX_SEMAPHORES {
            return Err(Error::SemaphoreLimitReached);
        }
        let s = Semaphore(self.next_free);
        self.next_free += 1;
        self.counts[s.0] = initial;
        Ok(s)
    }

    pub(crate) fn set(&mut self, s: Semaphore, value: i32) {
        self.counts[s.0] = value;
    }

    pub(crate) fn decrement(&mut self, s: Semaphore) -> i32 {
        self.counts[s.0] -= 1;
        self.counts[s.0]
    }

    pub(crate) fn increment(&mut self, s: Semaphore) -> i32 {
        self.counts[s.0] += 1;
        self.counts[s.0]
    }

    pub(crate) fn value(&self, s: Semaphore) -> i32 {
        self.counts[s.0]
    }
}

/// Allocate a semaphore with the given initial count.
pub fn create(initial: i32) -> Result<Semaphore, Error> {
    critical::with(|| KERNEL.lock().sem_create(initial))
}

/// Acquire `s`, suspending the calling thread while the count is exhausted.
///
/// Must not be called from interrupt context (tick, periodic callbacks,
/// aperiodic ISRs): there is no thread to suspend there.
pub fn wait(s: Semaphore) {
    let must_yield = critical::with(|| KERNEL.lock().sem_wait(s));
    if must_yield {
        crate::arch::trigger_context_switch();
        // Resumes here once a signal has unblocked this thread and the
        // scheduler has picked it again.
    }
}

/// Release `s`, waking at most one waiter. Safe from interrupt context;
/// the waker never yields (the woken thread runs when next selected).
pub fn signal(s: Semaphore) {
    critical::with(|| KERNEL.lock().sem_signal(s));
}

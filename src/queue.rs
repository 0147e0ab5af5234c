//! Bounded inter-thread word queues.
//!
//! Each queue is a fixed ring of `QUEUE_CAP` 32-bit words with head/tail
//! cursors, permanently paired with two reserved pool semaphores: a mutex
//! (init 1) serializing readers and a count (init 0) tracking stored
//! words. Writers never take the mutex, so a reader blocked on an empty
//! queue stalls other readers but never a writer.
//!
//! All functions here expect `ix < MAX_QUEUES` and panic otherwise.

use crate::config::{MAX_QUEUES, QUEUE_CAP};
use crate::critical;
use crate::error::Error;
use crate::kernel::KERNEL;
use crate::sem::{self, Semaphore};

/// Mutex semaphore of queue `ix`; fixed pool slot.
pub(crate) fn mutex_sem(ix: usize) -> Semaphore {
    Semaphore(2 * ix)
}

/// Count semaphore of queue `ix`; fixed pool slot.
pub(crate) fn count_sem(ix: usize) -> Semaphore {
    Semaphore(2 * ix + 1)
}

pub(crate) struct Fifo {
    buf: [u32; QUEUE_CAP],
    head: usize,
    tail: usize,
    lost: u32,
}

impl Fifo {
    pub(crate) const EMPTY: Fifo = Fifo {
        buf: [0; QUEUE_CAP],
        head: 0,
        tail: 0,
        lost: 0,
    };

    pub(crate) fn reset(&mut self) {
        self.head = 0;
        self.tail = 0;
        self.lost = 0;
    }

    pub(crate) fn push(&mut self, word: u32) {
        self.buf[self.tail] = word;
        self.tail = (self.tail + 1) % QUEUE_CAP;
    }

    pub(crate) fn pop(&mut self) -> u32 {
        let word = self.buf[self.head];
        self.head = (self.head + 1) % QUEUE_CAP;
        word
    }

    pub(crate) fn drop_one(&mut self) {
        self.lost += 1;
    }

    pub(crate) fn lost(&self) -> u32 {
        self.lost
    }
}

pub(crate) struct FifoTable {
    fifos: [Fifo; MAX_QUEUES],
}

impl FifoTable {
    pub(crate) const fn new() -> Self {
        FifoTable {
            fifos: [Fifo::EMPTY; MAX_QUEUES],
        }
    }

    pub(crate) fn get_mut(&mut self, ix: usize) -> &mut Fifo {
        &mut self.fifos[ix]
    }

    pub(crate) fn get(&self, ix: usize) -> &Fifo {
        &self.fifos[ix]
    }
}

/// Reset queue `ix`: cursors and lost-data counter to zero, mutex
/// semaphore to 1, count semaphore to 0.
pub fn init(ix: usize) {
    assert!(ix < MAX_QUEUES);
    critical::with(|| KERNEL.lock().queue_init(ix));
}

/// Read the oldest word from queue `ix`, blocking until one is present.
///
/// The reader mutex is taken before the count semaphore, so at most one
/// reader progresses at a time and a reader that finds the queue empty
/// holds the mutex while it waits for data.
pub fn read(ix: usize) -> u32 {
    assert!(ix < MAX_QUEUES);
    sem::wait(mutex_sem(ix));
    sem::wait(count_sem(ix));
    let word = critical::with(|| KERNEL.lock().queue_pop(ix));
    sem::signal(mutex_sem(ix));
    word
}

/// Append `word` to queue `ix` without blocking.
///
/// A full queue drops the word, bumps the lost-data counter, and returns
/// [`Error::QueueFull`]. Safe from interrupt context.
pub fn write(ix: usize, word: u32) -> Result<(), Error> {
    assert!(ix < MAX_QUEUES);
    critical::with(|| KERNEL.lock().queue_write(ix, word))
}

/// Words dropped so far by writes to a full queue `ix`.
pub fn lost(ix: usize) -> u32 {
    assert!(ix < MAX_QUEUES);
    critical::with(|| KERNEL.lock().queue_lost(ix))
}

//! Periodic events.
//!
//! Callbacks fired from the tick handler, not threads: they run at the
//! tick's interrupt priority, must be short, and must never wait on a
//! semaphore. Entries are appended in registration order and scanned in
//! that order on every tick.

use heapless::Vec;

use crate::config::MAX_PERIODIC;
use crate::error::Error;

#[derive(Clone, Copy)]
struct PeriodicEvent {
    handler: fn(),
    /// Ticks between firings.
    period: u32,
    /// Absolute tick of the next firing.
    execute_at: u32,
    /// Stagger offset, folded into every advance of `execute_at`.
    phase: u32,
}

fn unregistered() {}

pub(crate) struct PeriodicTable {
    slots: [PeriodicEvent; MAX_PERIODIC],
    count: usize,
}

impl PeriodicTable {
    pub(crate) const fn new() -> Self {
        PeriodicTable {
            slots: [PeriodicEvent {
                handler: unregistered,
                period: 0,
                execute_at: 0,
                phase: 0,
            }; MAX_PERIODIC],
            count: 0,
        }
    }

    /// Register `handler` to fire every `period` ticks, starting one
    /// period (plus stagger) from `now`.
    ///
    /// An entry whose period equals an already-registered period is phase
    /// shifted by its slot index so the two never land on the same tick;
    /// distinct periods are left untouched.
    pub(crate) fn add(&mut self, handler: fn(), period: u32, now: u32) -> Result<(), Error> {
        if self.count == MAX_PERIODIC {
            return Err(Error::PeriodicLimitReached);
        }
        let phase = if self.slots[..self.count].iter().any(|e| e.period == period) {
            self.count as u32
        } else {
            0
        };
        self.slots[self.count] = PeriodicEvent {
            handler,
            period,
            execute_at: now.wrapping_add(period).wrapping_add(phase),
            phase,
        };
        self.count += 1;
        Ok(())
    }

    /// Collect the handlers due at tick `now`, advancing each entry by
    /// its period plus phase. The caller invokes them outside the kernel
    /// lock so a callback may itself signal semaphores or write queues.
    pub(crate) fn collect_due(&mut self, now: u32) -> Vec<fn(), MAX_PERIODIC> {
        let mut due = Vec::new();
        for e in &mut self.slots[..self.count] {
            if e.execute_at == now {
                e.execute_at = now.wrapping_add(e.period).wrapping_add(e.phase);
                // Table capacity bounds the vec; push cannot fail.
                let _ = due.push(e.handler);
            }
        }
        due
    }
}

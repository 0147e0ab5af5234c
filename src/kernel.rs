//! Kernel state and the public scheduling API.
//!
//! All process-wide state lives in one [`Kernel`] value with a
//! compile-time-sized interior: the thread table, the periodic table,
//! the semaphore pool, and the queues. `Kernel`'s methods are the
//! portable state machine; the free functions below wrap the global
//! instance in a critical section and pend the context-switch trap where
//! a scheduling point follows.

use heapless::Vec;
use log::{debug, info, warn};
use spin::Mutex;

use crate::arch;
use crate::config::{
    APERIODIC_MIN_PRIORITY, IDLE_PRIORITY, MAX_PERIODIC, MAX_SLEEP_TICKS, NUM_IRQS, QUEUE_CAP,
    TICK_HZ,
};
use crate::critical;
use crate::error::Error;
use crate::periodic::PeriodicTable;
use crate::queue::{self, FifoTable};
use crate::sem::{SemTable, Semaphore};
use crate::tcb::ThreadId;
use crate::thread::ThreadTable;

pub(crate) static KERNEL: Mutex<Kernel> = Mutex::new(Kernel::new());

/// The whole kernel: tables, tick counter, running-thread slot.
///
/// The global instance behind the free functions is what runs a board;
/// standalone instances drive the same state machine directly, which is
/// how the scheduling logic is exercised off-target.
pub struct Kernel {
    threads: ThreadTable,
    periodic: PeriodicTable,
    sems: SemTable,
    fifos: FifoTable,
    system_time: u32,
}

impl Kernel {
    pub const fn new() -> Self {
        Kernel {
            threads: ThreadTable::new(),
            periodic: PeriodicTable::new(),
            sems: SemTable::new(),
            fifos: FifoTable::new(),
            system_time: 0,
        }
    }

    // --- Threads ---

    pub fn add_thread(&mut self, entry: fn(), priority: u8, name: &str) -> Result<ThreadId, Error> {
        let id = self.threads.add(entry, priority, name)?;
        debug!("added thread {:#010x} '{}' prio {}", id.as_u32(), name, priority);
        Ok(id)
    }

    /// Kill by id. `Ok(true)` means the victim was running and the
    /// caller must request a context switch.
    pub fn kill_thread(&mut self, id: ThreadId) -> Result<bool, Error> {
        let was_running = self.threads.kill(id)?;
        debug!("killed thread {:#010x}", id.as_u32());
        Ok(was_running)
    }

    pub fn kill_self(&mut self) -> Result<(), Error> {
        let id = self.threads.current_id();
        self.threads.kill_running()?;
        debug!("thread {:#010x} killed itself", id.as_u32());
        Ok(())
    }

    pub fn sleep_current(&mut self, ticks: u32) {
        let wake_at = self.system_time.wrapping_add(ticks);
        self.threads.sleep_running(wake_at);
    }

    pub fn current_id(&self) -> ThreadId {
        self.threads.current_id()
    }

    /// Name of the running thread.
    pub fn current_name(&self) -> &str {
        self.threads.current_name()
    }

    pub fn thread_count(&self) -> usize {
        self.threads.count()
    }

    pub fn system_time(&self) -> u32 {
        self.system_time
    }

    /// Audit the alive ring against the alive flags and slot order.
    pub fn check(&self) -> Result<(), Error> {
        self.threads.audit()
    }

    // --- Tick and context switch ---

    /// One full tick, in order: advance time, fire due periodic
    /// callbacks, wake expired sleepers. A scheduling point follows
    /// every tick; on hardware that is the pended switch trap, and this
    /// sequence is split across the SysTick handler so the callbacks run
    /// outside the kernel lock.
    pub fn tick(&mut self) {
        let due = self.tick_advance();
        for handler in due {
            handler();
        }
        self.tick_wake();
    }

    pub(crate) fn tick_advance(&mut self) -> Vec<fn(), MAX_PERIODIC> {
        self.system_time = self.system_time.wrapping_add(1);
        self.periodic.collect_due(self.system_time)
    }

    pub(crate) fn tick_wake(&mut self) {
        self.threads.wake_sleepers(self.system_time);
    }

    /// Scheduling decision: make the best runnable thread current and
    /// return its slot.
    pub fn reschedule(&mut self) -> usize {
        let next = self.threads.select();
        self.threads.set_running(next);
        next
    }

    /// Context-switch bookkeeping for the switch trap: store the
    /// outgoing stack pointer, reschedule, hand back the incoming one.
    pub fn switch_context(&mut self, outgoing_sp: usize) -> usize {
        self.threads.save_sp(outgoing_sp);
        let next = self.reschedule();
        self.threads.sp_of(next)
    }

    // --- Semaphores ---

    pub fn sem_create(&mut self, initial: i32) -> Result<Semaphore, Error> {
        self.sems.create(initial)
    }

    /// Decrement `s`. `true` means the caller went negative and has been
    /// marked blocked; it must yield and will own the semaphore when it
    /// next runs.
    pub fn sem_wait(&mut self, s: Semaphore) -> bool {
        if self.sems.decrement(s) < 0 {
            self.threads.block_running(s);
            true
        } else {
            false
        }
    }

    /// Increment `s` and, if threads are waiting, clear the blocked mark
    /// of the first waiter in ring order after the running thread.
    pub fn sem_signal(&mut self, s: Semaphore) {
        if self.sems.increment(s) <= 0 {
            self.threads.unblock_one(s);
        }
    }

    /// Current count of `s`; negative means threads are waiting.
    pub fn sem_value(&self, s: Semaphore) -> i32 {
        self.sems.value(s)
    }

    /// Number of threads suspended on `s`.
    pub fn blocked_on(&self, s: Semaphore) -> usize {
        self.threads.blocked_on(s)
    }

    // --- Queues ---

    pub fn queue_init(&mut self, ix: usize) {
        self.fifos.get_mut(ix).reset();
        self.sems.set(queue::mutex_sem(ix), 1);
        self.sems.set(queue::count_sem(ix), 0);
    }

    /// Non-blocking append; a full queue drops the word and counts it.
    pub fn queue_write(&mut self, ix: usize, word: u32) -> Result<(), Error> {
        let count = queue::count_sem(ix);
        if self.sems.value(count) >= QUEUE_CAP as i32 {
            self.fifos.get_mut(ix).drop_one();
            return Err(Error::QueueFull);
        }
        self.fifos.get_mut(ix).push(word);
        self.sem_signal(count);
        Ok(())
    }

    /// Take the head word. The caller has already consumed one count
    /// credit via `sem_wait` on the queue's count semaphore.
    pub fn queue_pop(&mut self, ix: usize) -> u32 {
        self.fifos.get_mut(ix).pop()
    }

    pub fn queue_lost(&self, ix: usize) -> u32 {
        self.fifos.get(ix).lost()
    }

    /// The (mutex, count) semaphore pair guarding queue `ix`.
    pub fn queue_sems(&self, ix: usize) -> (Semaphore, Semaphore) {
        (queue::mutex_sem(ix), queue::count_sem(ix))
    }

    // --- Periodic events ---

    pub fn add_periodic(&mut self, handler: fn(), period: u32) -> Result<(), Error> {
        self.periodic.add(handler, period, self.system_time)?;
        debug!("added periodic event, period {} ticks", period);
        Ok(())
    }

    // --- Launch ---

    /// Validate the table, create the idle thread, audit the ring, and
    /// make the highest-priority thread current.
    pub fn prepare_launch(&mut self) -> Result<(), Error> {
        if self.threads.count() == 0 {
            return Err(Error::NoThreadsScheduled);
        }
        self.threads.add(idle, IDLE_PRIORITY, "idle")?;
        self.threads.audit()?;
        let first = match self.threads.highest_priority_slot() {
            Some(ix) => ix,
            None => return Err(Error::InconsistentAlive),
        };
        self.threads.set_running(first);
        Ok(())
    }

    /// Saved stack pointer of the thread selected to run first.
    pub fn first_sp(&self) -> usize {
        self.threads.sp_of(self.threads.running_slot())
    }
}

impl Default for Kernel {
    fn default() -> Self {
        Kernel::new()
    }
}

/// The kernel-created lowest-priority thread: parks the core between
/// interrupts so something is always runnable.
fn idle() {
    loop {
        arch::wait_for_interrupt();
    }
}

/// Left in every initial frame's LR: a thread whose entry function
/// returns kills itself and parks until the scheduler moves on.
pub(crate) fn thread_exit() -> ! {
    let _ = kill_self();
    loop {
        arch::wait_for_interrupt();
    }
}

// --- Public free-function API over the global kernel ---

/// Prepare the kernel for use: relocate the vector table to RAM so
/// aperiodic handlers can be installed later. Call once, before adding
/// threads.
pub fn init() {
    arch::init_vectors();
    info!("rondo: vector table relocated, tick {} Hz", TICK_HZ);
}

/// Register a thread. Its stack is seeded so the first switch into it
/// lands at `entry`; if `entry` ever returns, the thread kills itself.
pub fn add_thread(entry: fn(), priority: u8, name: &str) -> Result<ThreadId, Error> {
    critical::with(|| KERNEL.lock().add_thread(entry, priority, name))
}

/// Remove the thread with id `id` from the scheduler. Killing the
/// running thread takes effect at the next scheduling point; killing a
/// thread blocked on a semaphore leaves that semaphore's count
/// decremented.
pub fn kill_thread(id: ThreadId) -> Result<(), Error> {
    let was_running = critical::with(|| KERNEL.lock().kill_thread(id))?;
    if was_running {
        arch::trigger_context_switch();
    }
    Ok(())
}

/// Remove the calling thread. Returns (with an error) only when this is
/// the last thread in the table.
pub fn kill_self() -> Result<(), Error> {
    critical::with(|| KERNEL.lock().kill_self())?;
    arch::trigger_context_switch();
    Ok(())
}

/// Suspend the calling thread for at least `ticks` ticks. A zero
/// duration returns immediately; durations beyond the wakeable range are
/// rejected.
pub fn sleep(ticks: u32) {
    if ticks == 0 {
        return;
    }
    if ticks > MAX_SLEEP_TICKS {
        warn!("sleep of {} ticks exceeds the wakeable range, ignored", ticks);
        return;
    }
    critical::with(|| KERNEL.lock().sleep_current(ticks));
    arch::trigger_context_switch();
}

/// Voluntarily hand the processor to the next runnable thread.
pub fn yield_now() {
    arch::trigger_context_switch();
}

/// Id of the calling thread.
pub fn current_id() -> ThreadId {
    critical::with(|| KERNEL.lock().current_id())
}

/// Ticks since launch. Wraps after roughly 49.7 days at 1 kHz; the
/// wrap is not an event, but intervals spanning it must be computed
/// with wrapping arithmetic.
pub fn system_time() -> u32 {
    critical::with(|| KERNEL.lock().system_time())
}

/// Threads currently in the table, idle included.
pub fn thread_count() -> usize {
    critical::with(|| KERNEL.lock().thread_count())
}

/// Register `handler` to run in tick context every `period` ticks.
/// Handlers must be short and must never wait on a semaphore; signaling
/// and queue writes are fine.
pub fn add_periodic(handler: fn(), period: u32) -> Result<(), Error> {
    critical::with(|| KERNEL.lock().add_periodic(handler, period))
}

/// Install `isr` as the handler for hardware interrupt `irq` at NVIC
/// priority `priority` and enable the line.
///
/// Priorities 0..=5 are reserved for the kernel traps. The handler runs
/// in interrupt context: it may signal semaphores and write queues, must
/// never wait, and must clear its own device-pending state.
pub fn add_aperiodic(isr: extern "C" fn(), priority: u8, irq: u8) -> Result<(), Error> {
    if irq >= NUM_IRQS {
        return Err(Error::IrqOutOfRange);
    }
    if priority < APERIODIC_MIN_PRIORITY {
        return Err(Error::HwiPriorityInvalid);
    }
    critical::with(|| arch::install_isr(irq, isr, priority));
    info!("aperiodic isr installed on irq {} at priority {}", irq, priority);
    Ok(())
}

/// Start scheduling: create the idle thread, pick the highest-priority
/// thread, configure the tick from `core_clock_hz`, and switch into the
/// first thread. Returns only on failure.
#[cfg(all(target_arch = "arm", target_os = "none"))]
pub fn launch(core_clock_hz: u32) -> Error {
    let mask = critical::enter();
    let (sp, count) = {
        let mut k = KERNEL.lock();
        match k.prepare_launch() {
            Ok(()) => (k.first_sp(), k.thread_count()),
            Err(e) => {
                drop(k);
                critical::leave(mask);
                return e;
            }
        }
    };
    info!("launching {} threads", count);
    arch::setup_systick(core_clock_hz);
    arch::set_trap_priorities();
    // Does not return; the first thread starts with interrupts enabled.
    unsafe { arch::start_first_thread(sp) }
}

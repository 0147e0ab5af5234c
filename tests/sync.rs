// Semaphore accounting, FIFO unblocking, and the word queues.

use rondo::config::QUEUE_CAP;
use rondo::{Error, Kernel, ThreadId};

fn noop() {}

struct XorShift(u32);

impl XorShift {
    fn next(&mut self) -> u32 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.0 = x;
        x
    }
}

fn launched(prios: &[u8]) -> (Kernel, Vec<ThreadId>) {
    let mut k = Kernel::new();
    let ids = prios
        .iter()
        .enumerate()
        .map(|(i, &p)| k.add_thread(noop, p, &format!("t{}", i)).unwrap())
        .collect();
    k.prepare_launch().unwrap();
    (k, ids)
}

#[test]
fn semaphore_count_tracks_waits_and_signals() {
    let (mut k, ids) = launched(&[100, 100, 100]);
    let s = k.sem_create(1).unwrap();

    // A takes the only unit without blocking.
    assert_eq!(k.current_id(), ids[0]);
    assert!(!k.sem_wait(s));
    assert_eq!(k.sem_value(s), 0);
    assert_eq!(k.blocked_on(s), 0);

    // B and C go negative and suspend.
    k.reschedule();
    assert_eq!(k.current_id(), ids[1]);
    assert!(k.sem_wait(s));
    k.reschedule();
    assert_eq!(k.current_id(), ids[2]);
    assert!(k.sem_wait(s));
    k.reschedule();
    assert_eq!(k.sem_value(s), -2);
    assert_eq!(k.blocked_on(s), 2);

    // Each signal wakes exactly one waiter; the waker keeps running.
    assert_eq!(k.current_id(), ids[0]);
    k.sem_signal(s);
    assert_eq!(k.sem_value(s), -1);
    assert_eq!(k.blocked_on(s), 1);
    k.sem_signal(s);
    assert_eq!(k.sem_value(s), 0);
    assert_eq!(k.blocked_on(s), 0);
}

#[test]
fn unblock_order_is_fifo_in_ring_order() {
    let (mut k, ids) = launched(&[100, 100, 100]);
    let s = k.sem_create(0).unwrap();

    // B blocks first, then C; A keeps the unit-less semaphore busy.
    k.reschedule();
    assert!(k.sem_wait(s)); // B
    k.reschedule();
    assert!(k.sem_wait(s)); // C
    k.reschedule();
    assert_eq!(k.current_id(), ids[0]);

    // The walk starts after the running thread, so B wakes before C.
    k.sem_signal(s);
    k.reschedule();
    assert_eq!(k.current_id(), ids[1]);
}

#[test]
fn signal_survives_a_killed_waiter() {
    let (mut k, ids) = launched(&[100, 100]);
    let s = k.sem_create(0).unwrap();

    k.reschedule();
    assert_eq!(k.current_id(), ids[1]);
    assert!(k.sem_wait(s));
    k.reschedule();

    // Killing the blocked thread leaves the count decremented.
    k.kill_thread(ids[1]).unwrap();
    assert_eq!(k.sem_value(s), -1);
    assert_eq!(k.blocked_on(s), 0);

    // The next signal finds no waiter and simply raises the count.
    k.sem_signal(s);
    assert_eq!(k.sem_value(s), 0);
    k.check().unwrap();
}

#[test]
fn semaphore_invariants_under_random_traffic() {
    let mut rng = XorShift(0x5eed_50a1);
    let (mut k, ids) = launched(&[100, 100, 100, 100, 100]);
    let s = k.sem_create(1).unwrap();
    let (mut waits, mut signals) = (0i32, 0i32);

    for _ in 0..10_000 {
        match rng.next() % 4 {
            0 => {
                k.sem_signal(s);
                signals += 1;
            }
            1 | 2 => {
                if ids.contains(&k.current_id()) {
                    waits += 1;
                    if k.sem_wait(s) {
                        k.reschedule();
                    }
                }
            }
            _ => {
                k.tick();
                k.reschedule();
            }
        }
        assert_eq!(k.sem_value(s), 1 + signals - waits);
        assert_eq!(k.blocked_on(s) as i32, (-k.sem_value(s)).max(0));
    }
}

#[test]
fn producer_consumer_lockstep() {
    // A signals every 20 ticks; B consumes one unit per signal and
    // never runs while the count is zero.
    let (mut k, ids) = launched(&[50, 200]);
    let s = k.sem_create(0).unwrap();
    let (a, b) = (ids[0], ids[1]);
    let (mut signals, mut b_iters) = (0u32, 0u32);
    // Set while B sits inside a blocking wait; completion of that wait
    // is the iteration.
    let mut b_waiting = false;

    for _ in 0..400 {
        loop {
            let id = k.current_id();
            if id == a {
                k.sem_signal(s);
                signals += 1;
                k.sleep_current(20);
                k.reschedule();
            } else if id == b {
                if b_waiting {
                    b_waiting = false;
                    b_iters += 1;
                } else if k.sem_wait(s) {
                    b_waiting = true;
                    k.reschedule();
                } else {
                    b_iters += 1;
                }
            } else {
                break;
            }
        }
        k.tick();
        k.reschedule();
    }
    assert_eq!(b_iters, signals);
}

#[test]
fn semaphore_pool_is_bounded() {
    let mut k = Kernel::new();
    let mut made = 0;
    loop {
        match k.sem_create(0) {
            Ok(_) => made += 1,
            Err(Error::SemaphoreLimitReached) => break,
            Err(e) => panic!("unexpected error: {}", e),
        }
    }
    assert_eq!(
        made,
        rondo::config::MAX_SEMAPHORES - 2 * rondo::config::MAX_QUEUES
    );
}

// --- Queues ---

#[test]
fn queue_preserves_fifo_order() {
    let mut k = Kernel::new();
    k.queue_init(0);
    let (_mutex, count) = k.queue_sems(0);

    for v in 1..=5u32 {
        k.queue_write(0, v).unwrap();
    }
    assert_eq!(k.sem_value(count), 5);
    for v in 1..=5u32 {
        assert!(!k.sem_wait(count));
        assert_eq!(k.queue_pop(0), v);
    }
    assert_eq!(k.sem_value(count), 0);
}

#[test]
fn full_queue_drops_and_counts() {
    let mut k = Kernel::new();
    k.queue_init(0);

    for v in 1..=20u32 {
        let r = k.queue_write(0, v);
        if v <= QUEUE_CAP as u32 {
            r.unwrap();
        } else {
            assert_eq!(r, Err(Error::QueueFull));
        }
    }
    assert_eq!(k.queue_lost(0), 4);

    // Draining returns the first sixteen values, in order.
    let (_mutex, count) = k.queue_sems(0);
    for v in 1..=QUEUE_CAP as u32 {
        assert!(!k.sem_wait(count));
        assert_eq!(k.queue_pop(0), v);
    }
    assert_eq!(k.sem_value(count), 0);
}

#[test]
fn queue_reinit_resets_everything() {
    let mut k = Kernel::new();
    k.queue_init(1);
    for v in 0..(QUEUE_CAP as u32 + 3) {
        let _ = k.queue_write(1, v);
    }
    assert_eq!(k.queue_lost(1), 3);

    k.queue_init(1);
    let (mutex, count) = k.queue_sems(1);
    assert_eq!(k.queue_lost(1), 0);
    assert_eq!(k.sem_value(mutex), 1);
    assert_eq!(k.sem_value(count), 0);

    k.queue_write(1, 7).unwrap();
    assert!(!k.sem_wait(count));
    assert_eq!(k.queue_pop(1), 7);
}

#[test]
fn queues_are_independent() {
    let mut k = Kernel::new();
    for ix in 0..rondo::config::MAX_QUEUES {
        k.queue_init(ix);
        k.queue_write(ix, ix as u32 * 100).unwrap();
    }
    for ix in 0..rondo::config::MAX_QUEUES {
        let (_m, count) = k.queue_sems(ix);
        assert!(!k.sem_wait(count));
        assert_eq!(k.queue_pop(ix), ix as u32 * 100);
    }
}

// --- Aperiodic registration ---

extern "C" fn dummy_isr() {}

#[test]
fn aperiodic_validation() {
    assert_eq!(
        rondo::add_aperiodic(dummy_isr, 5, 10),
        Err(Error::HwiPriorityInvalid)
    );
    assert_eq!(
        rondo::add_aperiodic(dummy_isr, 6, rondo::config::NUM_IRQS),
        Err(Error::IrqOutOfRange)
    );
    rondo::add_aperiodic(dummy_isr, 6, 10).unwrap();
}

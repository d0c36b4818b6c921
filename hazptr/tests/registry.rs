use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use hazptr::{Domain, Thread, HP_PER_THREAD, MAX_THREADS, RETIRE_THRESHOLD};

/// Bumps a shared counter when freed, so tests can observe reclamation.
struct Tracked {
    freed: Arc<AtomicUsize>,
}

impl Drop for Tracked {
    fn drop(&mut self) {
        self.freed.fetch_add(1, Ordering::SeqCst);
    }
}

fn tracked(freed: &Arc<AtomicUsize>) -> *mut Tracked {
    Box::into_raw(Box::new(Tracked {
        freed: freed.clone(),
    }))
}

#[test]
fn protect_publishes_to_all_slots() {
    let domain = Domain::new();
    let thread = Thread::new(&domain);

    let ptr = Box::into_raw(Box::new(7usize));
    for slot in 0..HP_PER_THREAD {
        thread.protect(slot, ptr);
        assert!(domain.is_protected(ptr));
        thread.clear(slot);
    }
    assert!(!domain.is_protected(ptr));

    drop(unsafe { Box::from_raw(ptr) });
}

#[test]
fn retire_defers_until_scan() {
    let freed = Arc::new(AtomicUsize::new(0));
    let domain = Domain::new();
    let mut thread = Thread::new(&domain);

    for _ in 0..10 {
        unsafe { thread.retire(tracked(&freed)) };
    }
    assert_eq!(freed.load(Ordering::SeqCst), 0);

    thread.do_reclamation();
    assert_eq!(freed.load(Ordering::SeqCst), 10);
}

#[test]
fn threshold_triggers_scan() {
    let freed = Arc::new(AtomicUsize::new(0));
    let domain = Domain::new();
    let mut thread = Thread::new(&domain);

    for _ in 0..RETIRE_THRESHOLD {
        unsafe { thread.retire(tracked(&freed)) };
    }
    assert_eq!(freed.load(Ordering::SeqCst), RETIRE_THRESHOLD);
}

#[test]
fn protected_node_survives_scan() {
    let freed = Arc::new(AtomicUsize::new(0));
    let domain = Domain::new();
    let mut thread = Thread::new(&domain);

    let ptr = tracked(&freed);
    thread.protect(0, ptr);
    unsafe { thread.retire(ptr) };

    thread.do_reclamation();
    assert_eq!(freed.load(Ordering::SeqCst), 0);

    thread.clear(0);
    thread.do_reclamation();
    assert_eq!(freed.load(Ordering::SeqCst), 1);
}

#[test]
fn cross_thread_protection_blocks_reclaim() {
    let freed = Arc::new(AtomicUsize::new(0));
    let domain = Domain::new();
    let mut retirer = Thread::new(&domain);
    let guard = Thread::new(&domain);

    let ptr = tracked(&freed);
    guard.protect(2, ptr);
    unsafe { retirer.retire(ptr) };

    retirer.do_reclamation();
    assert_eq!(freed.load(Ordering::SeqCst), 0);

    guard.clear(2);
    retirer.do_reclamation();
    assert_eq!(freed.load(Ordering::SeqCst), 1);
}

#[test]
fn leftovers_freed_when_domain_drops() {
    let freed = Arc::new(AtomicUsize::new(0));
    {
        let domain = Domain::new();
        let guard = Thread::new(&domain);
        {
            let mut retirer = Thread::new(&domain);
            let ptr = tracked(&freed);
            guard.protect(0, ptr);
            unsafe { retirer.retire(ptr) };
            // Retirer exits while the node is still guarded: the node
            // lands in the domain pile instead of being freed.
        }
        assert_eq!(freed.load(Ordering::SeqCst), 0);
        drop(guard);
    }
    assert_eq!(freed.load(Ordering::SeqCst), 1);
}

#[test]
fn records_are_reused_after_release() {
    let domain = Domain::new();
    let mut handles = Vec::with_capacity(MAX_THREADS);
    for _ in 0..MAX_THREADS {
        handles.push(Thread::new(&domain));
    }
    handles.pop();
    // A full table minus one leaves exactly one claimable record.
    let _replacement = Thread::new(&domain);
}

#[test]
#[should_panic(expected = "hazard record table exhausted")]
fn exhausted_table_panics() {
    let domain = Domain::new();
    let mut handles = Vec::with_capacity(MAX_THREADS + 1);
    for _ in 0..=MAX_THREADS {
        handles.push(Thread::new(&domain));
    }
}

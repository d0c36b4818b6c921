use std::collections::HashSet;
use std::ptr;
use std::sync::atomic::{AtomicBool, AtomicPtr, Ordering};
use std::sync::Mutex;

use crate::retire::Retired;
use crate::{HP_PER_THREAD, MAX_THREADS};

/// One claimable row of the hazard table: a claimed flag plus the slot
/// array published by the owning thread.
pub(crate) struct Record {
    pub(crate) active: AtomicBool,
    pub(crate) slots: [AtomicPtr<u8>; HP_PER_THREAD],
}

impl Record {
    fn new() -> Self {
        Self {
            active: AtomicBool::new(false),
            slots: Default::default(),
        }
    }
}

/// A reclamation domain: the fixed record table plus a pile for retired
/// nodes that outlive their retiring thread. The pile sits behind a plain
/// mutex; it is touched only when a participant exits with nodes it could
/// not free, never on an operation path.
pub struct Domain {
    records: Box<[Record]>,
    leftovers: Mutex<Vec<Retired>>,
}

impl Domain {
    pub fn new() -> Self {
        Self {
            records: (0..MAX_THREADS).map(|_| Record::new()).collect(),
            leftovers: Mutex::new(Vec::new()),
        }
    }

    /// Deposits what an exiting participant could not reclaim.
    pub(crate) fn deposit(&self, mut retireds: Vec<Retired>) {
        self.leftovers.lock().unwrap().append(&mut retireds);
    }

    /// Claims a free record for a new participant.
    ///
    /// # Panics
    ///
    /// Panics when all [`MAX_THREADS`](crate::MAX_THREADS) records are
    /// claimed. This is a misuse of the registry, not a recoverable
    /// condition, so it surfaces at the first operation of the excess
    /// participant.
    pub(crate) fn acquire(&self) -> &Record {
        for record in self.records.iter() {
            if !record.active.load(Ordering::Relaxed)
                && record
                    .active
                    .compare_exchange(false, true, Ordering::AcqRel, Ordering::Relaxed)
                    .is_ok()
            {
                return record;
            }
        }
        panic!("hazard record table exhausted ({MAX_THREADS} participants)");
    }

    /// Returns a record to the table. All slots are cleared before the
    /// record becomes claimable again.
    pub(crate) fn release(&self, record: &Record) {
        for slot in record.slots.iter() {
            slot.store(ptr::null_mut(), Ordering::Release);
        }
        record.active.store(false, Ordering::Release);
    }

    /// Snapshot of every pointer currently published in an active record.
    pub(crate) fn collect_guarded_ptrs(&self) -> HashSet<*mut u8> {
        self.records
            .iter()
            .filter(|record| record.active.load(Ordering::Acquire))
            .flat_map(|record| record.slots.iter().map(|slot| slot.load(Ordering::Acquire)))
            .filter(|ptr| !ptr.is_null())
            .collect()
    }

    /// Whether any active record currently publishes `ptr`. O(N*K); meant
    /// for the reclamation scan and for assertions, not for hot paths.
    pub fn is_protected<T>(&self, ptr: *mut T) -> bool {
        let ptr = ptr.cast::<u8>();
        self.records.iter().any(|record| {
            record.active.load(Ordering::Acquire)
                && record
                    .slots
                    .iter()
                    .any(|slot| slot.load(Ordering::Acquire) == ptr)
        })
    }
}

impl Default for Domain {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Domain {
    fn drop(&mut self) {
        // Participants borrow the domain, so none can still be running:
        // nothing in the pile is hazard-held anymore.
        for retired in self.leftovers.get_mut().unwrap().drain(..) {
            unsafe { retired.free() };
        }
    }
}

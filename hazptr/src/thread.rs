use std::mem;
use std::ptr;
use std::sync::atomic::Ordering;

use crate::domain::{Domain, Record};
use crate::retire::Retired;
use crate::RETIRE_THRESHOLD;

/// A participant's handle on the registry: its claimed record plus its
/// local retired buffer. One handle per thread per domain; dropping it
/// releases the record for reuse.
pub struct Thread<'domain> {
    domain: &'domain Domain,
    record: &'domain Record,
    retired: Vec<Retired>,
}

impl<'domain> Thread<'domain> {
    pub fn new(domain: &'domain Domain) -> Self {
        Self {
            domain,
            record: domain.acquire(),
            retired: Vec::new(),
        }
    }

    /// Publishes `ptr` in hazard slot `slot`.
    ///
    /// Publication alone does not protect anything: the caller must issue
    /// [`light_membarrier`](crate::light_membarrier) and then re-read the
    /// link the pointer came from. Only an unchanged link proves the slot
    /// was visible to any reclaimer before the node could be retired.
    #[inline]
    pub fn protect<T>(&self, slot: usize, ptr: *mut T) {
        self.record.slots[slot].store(ptr.cast(), Ordering::Release);
    }

    /// Empties hazard slot `slot`.
    #[inline]
    pub fn clear(&self, slot: usize) {
        self.record.slots[slot].store(ptr::null_mut(), Ordering::Release);
    }

    /// Hands `ptr` to the reclaimer. A scan runs once the local buffer
    /// reaches [`RETIRE_THRESHOLD`](crate::RETIRE_THRESHOLD).
    ///
    /// # Safety
    ///
    /// `ptr` must be unlinked from the shared structure, owned by the
    /// caller, and retired exactly once.
    #[inline]
    pub unsafe fn retire<T>(&mut self, ptr: *mut T) {
        self.retired.push(Retired::new(ptr));
        if self.retired.len() >= RETIRE_THRESHOLD {
            self.do_reclamation();
        }
    }

    /// Frees every buffered node that no hazard slot references and keeps
    /// the rest for a later scan.
    pub fn do_reclamation(&mut self) {
        if self.retired.is_empty() {
            return;
        }
        membarrier::heavy();

        let guarded_ptrs = self.domain.collect_guarded_ptrs();
        self.retired.retain(|retired| {
            if guarded_ptrs.contains(&retired.ptr()) {
                true
            } else {
                unsafe { retired.free() };
                false
            }
        });
    }
}

impl Drop for Thread<'_> {
    fn drop(&mut self) {
        self.domain.release(self.record);
        self.do_reclamation();
        if !self.retired.is_empty() {
            // Still guarded by someone else; the domain frees these when
            // it drops.
            self.domain.deposit(mem::take(&mut self.retired));
        }
    }
}

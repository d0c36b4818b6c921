//! Lock-free sorted list with hazard-pointer reclamation.
//!
//! Same algorithm as [`no_reclaim`](crate::no_reclaim), but every pointer
//! followed during traversal is published in a hazard slot and revalidated
//! before it is dereferenced, and unlinked nodes go through the registry
//! instead of leaking. Each list owns its own [`Domain`], so retired nodes
//! of one list can never pin another list's memory.
//!
//! The traversal keeps its working set in five slots. A publication is
//! only trusted after `light_membarrier()` plus a re-read of the link the
//! pointer came from shows the link unchanged and neither end retired;
//! any mismatch restarts the search from the head.

use std::fmt::Display;
use std::sync::atomic::{AtomicBool, Ordering};

use hazptr::{light_membarrier, Domain, Thread};

use crate::concurrent_set::ConcurrentSet;
use crate::pointers::{Atomic, Pointer, Shared};

// Hazard slot roles. CURR/NEXT hold the moving pair, AHEAD stages the
// lookahead successor until the pair rotates, LEFT pins the committed
// left node, SUCC pins the unlink target's successor in `remove`.
const SLOT_CURR: usize = 0;
const SLOT_NEXT: usize = 1;
const SLOT_AHEAD: usize = 2;
const SLOT_LEFT: usize = 3;
const SLOT_SUCC: usize = 4;

pub struct Node<K> {
    key: K,
    next: Atomic<Node<K>>,
    /// Logically deleted. Set once, never reset.
    marked: AtomicBool,
    /// Handed to the reclaimer. A traversal that observes this has
    /// followed a stale link and must restart.
    retired: AtomicBool,
}

impl<K> Node<K> {
    fn new(key: K) -> Self {
        Self {
            key,
            next: Atomic::null(),
            marked: AtomicBool::new(false),
            retired: AtomicBool::new(false),
        }
    }

    pub fn key(&self) -> &K {
        &self.key
    }

    fn is_marked(&self) -> bool {
        self.marked.load(Ordering::SeqCst)
    }

    fn is_retired(&self) -> bool {
        self.retired.load(Ordering::SeqCst)
    }
}

/// A participant's hazard record on one list.
pub struct Handle<'domain> {
    thread: Thread<'domain>,
}

pub struct HpList<K> {
    head: Shared<Node<K>>,
    tail: Shared<Node<K>>,
    domain: Domain,
}

unsafe impl<K: Send> Send for HpList<K> {}
unsafe impl<K: Send + Sync> Sync for HpList<K> {}

impl<K> HpList<K>
where
    K: Ord + Default + 'static,
{
    pub fn new() -> Self {
        // Sentinel keys are default-constructed and never compared.
        let tail = Shared::from_owned(Node::new(K::default()));
        let head = Shared::from_owned(Node::new(K::default()));
        unsafe { head.deref() }.next.store(tail, Ordering::SeqCst);
        Self {
            head,
            tail,
            domain: Domain::new(),
        }
    }

    /// Claims a hazard record for the calling thread. Panics if more than
    /// the registry capacity of threads participate at once.
    pub fn register(&self) -> Handle<'_> {
        Handle {
            thread: Thread::new(&self.domain),
        }
    }

    /// Finds the adjacent pair `(left, right)` around `key`, splicing out
    /// marked runs as in the leaky variant. On return both nodes are
    /// hazard-protected: `right` in the slot it was travelling in, `left`
    /// in its own slot.
    fn search(&self, key: &K, handle: &mut Handle<'_>) -> (Shared<Node<K>>, Shared<Node<K>>) {
        let thread = &handle.thread;
        'retry: loop {
            let mut t = self.head;
            thread.protect(SLOT_CURR, t.into_raw());
            let mut t_next = unsafe { t.deref() }.next.load(Ordering::SeqCst);
            thread.protect(SLOT_NEXT, t_next.into_raw());
            light_membarrier();
            {
                let head_ref = unsafe { t.deref() };
                if head_ref.next.load(Ordering::SeqCst) != t_next
                    || head_ref.is_retired()
                    || unsafe { t_next.deref() }.is_retired()
                {
                    continue 'retry;
                }
            }

            let mut left = t;
            let mut left_next = t_next;

            // 1. Find left and right (right may still be marked).
            loop {
                if !unsafe { t.deref() }.is_marked() {
                    left = t;
                    thread.protect(SLOT_LEFT, t.into_raw());
                    light_membarrier();
                    if unsafe { t.deref() }.is_retired() {
                        continue 'retry;
                    }
                    left_next = t_next;
                }

                t = t_next;
                if t == self.tail {
                    break;
                }

                let t_ref = unsafe { t.deref() };
                t_next = t_ref.next.load(Ordering::SeqCst);
                thread.protect(SLOT_AHEAD, t_next.into_raw());
                light_membarrier();
                // The successor may have been physically deleted between
                // the load and the publication.
                if t_ref.next.load(Ordering::SeqCst) != t_next
                    || t_ref.is_retired()
                    || unsafe { t_next.deref() }.is_retired()
                {
                    continue 'retry;
                }

                // Rotate the pair into the stable slots; the lookahead
                // slot is free to be overwritten next iteration.
                thread.protect(SLOT_CURR, t.into_raw());
                thread.protect(SLOT_NEXT, t_next.into_raw());

                if !t_ref.is_marked() && t_ref.key >= *key {
                    break;
                }
            }
            let right = t;

            // 2. If the pair is adjacent, only a marked right forces a
            // rerun.
            if left_next == right {
                if right != self.tail && unsafe { right.deref() }.is_marked() {
                    continue 'retry;
                }
                return (left, right);
            }

            // 3. Splice the marked run out in one step. The spliced nodes
            // are retired by the removes that marked them, not here.
            if unsafe { left.deref() }
                .next
                .compare_exchange(left_next, right, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
            {
                if right != self.tail && unsafe { right.deref() }.is_marked() {
                    continue 'retry;
                }
                return (left, right);
            }
        }
    }

    pub fn insert(&self, key: K, handle: &mut Handle<'_>) -> bool {
        let mut node = Box::new(Node::new(key));

        loop {
            let (left, right) = self.search(&node.key, handle);

            if right != self.tail && unsafe { right.deref() }.key == node.key {
                return false;
            }

            node.next.store(right, Ordering::SeqCst);
            // `right` stays hazard-protected across the CAS; the slots are
            // deliberately not cleared on success, the next operation
            // overwrites them.
            match unsafe { left.deref() }.next.compare_exchange(
                right,
                node,
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => return true,
                Err(e) => node = e.new,
            }
        }
    }

    pub fn remove(&self, key: &K, handle: &mut Handle<'_>) -> bool {
        let (left, right, right_next) = loop {
            let (left, right) = self.search(key, handle);

            if right == self.tail || unsafe { right.deref() }.key != *key {
                return false;
            }

            let right_ref = unsafe { right.deref() };
            let right_next = right_ref.next.load(Ordering::SeqCst);
            handle.thread.protect(SLOT_SUCC, right_next.into_raw());
            light_membarrier();
            if right_ref.next.load(Ordering::SeqCst) != right_next || right_ref.is_retired() {
                continue;
            }

            // Logical deletion: the linearisation point of a successful
            // remove.
            if right_ref
                .marked
                .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
            {
                break (left, right, right_next);
            }
        };

        // One unlink attempt. Losing it means a search took over the
        // physical deletion; the node is still logically gone, so this
        // remove succeeded either way. Only the winner retires.
        if unsafe { left.deref() }
            .next
            .compare_exchange(right, right_next, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            let right_ref = unsafe { right.deref() };
            right_ref.retired.store(true, Ordering::SeqCst);
            unsafe { handle.thread.retire(right.into_raw()) };
        }

        true
    }

    pub fn find(&self, key: &K, handle: &mut Handle<'_>) -> bool {
        let (_, right) = self.search(key, handle);
        if right == self.tail {
            return false;
        }
        let right_ref = unsafe { right.deref() };
        // A mark landing after the search linearises this find right
        // after the remove that won.
        right_ref.key == *key && !right_ref.is_marked()
    }

    /// First node after the head sentinel.
    pub fn front(&self) -> Shared<Node<K>> {
        unsafe { self.head.deref() }.next.load(Ordering::SeqCst)
    }

    pub fn tail(&self) -> Shared<Node<K>> {
        self.tail
    }

    /// Successor of `node`.
    ///
    /// # Safety
    ///
    /// `node` must be a live node of this list and no concurrent removal
    /// may be running; this helper does not protect anything.
    pub unsafe fn next(&self, node: Shared<Node<K>>) -> Shared<Node<K>> {
        unsafe { node.deref() }.next.load(Ordering::SeqCst)
    }

    /// Dumps the unmarked keys in ascending order.
    ///
    /// # Safety
    ///
    /// No concurrent operations may be running.
    pub unsafe fn print_list(&self)
    where
        K: Display,
    {
        let mut current = self.front();
        while current != self.tail {
            let node = unsafe { current.deref() };
            if !node.is_marked() {
                print!("{} -> ", node.key);
            }
            current = node.next.load(Ordering::SeqCst);
        }
        println!("NULL");
    }
}

impl<K> Default for HpList<K>
where
    K: Ord + Default + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K> Drop for HpList<K> {
    fn drop(&mut self) {
        // Handles borrow the list, so none are left: the walk owns every
        // reachable node, sentinels included.
        let mut thread = Thread::new(&self.domain);
        let mut current = self.head;
        while !current.is_null() {
            let node = unsafe { current.deref() };
            let next = node.next.load(Ordering::Relaxed);
            node.retired.store(true, Ordering::Relaxed);
            unsafe { thread.retire(current.into_raw()) };
            current = next;
        }
        // Dropping the handle runs the final scan; nothing is guarded
        // anymore, so the whole chain is freed along with any leftovers
        // earlier participants deposited.
    }
}

impl<K> ConcurrentSet<K> for HpList<K>
where
    K: Ord + Default + 'static,
{
    type Handle<'a> = Handle<'a>
    where
        Self: 'a,
        K: 'a;

    fn new() -> Self {
        Self::new()
    }

    fn register(&self) -> Self::Handle<'_> {
        self.register()
    }

    #[inline(always)]
    fn insert<'a>(&self, handle: &mut Self::Handle<'a>, key: K) -> bool
    where
        K: 'a,
    {
        self.insert(key, handle)
    }

    #[inline(always)]
    fn remove<'a>(&self, handle: &mut Self::Handle<'a>, key: &K) -> bool
    where
        K: 'a,
    {
        self.remove(key, handle)
    }

    #[inline(always)]
    fn find<'a>(&self, handle: &mut Self::Handle<'a>, key: &K) -> bool
    where
        K: 'a,
    {
        self.find(key, handle)
    }
}

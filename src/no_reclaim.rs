//! Lock-free sorted list without memory reclamation.
//!
//! Harris's algorithm with the logical-deletion mark kept in a dedicated
//! atomic flag: `remove` marks the victim, then one compare-and-swap
//! attempt physically unlinks it; `search` splices out whole runs of
//! marked nodes as it walks. Unlinked nodes are never freed, which is the
//! point of this variant: it is the baseline that shows what hazard
//! pointers cost.

use std::fmt::Display;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::concurrent_set::ConcurrentSet;
use crate::pointers::{Atomic, Pointer, Shared};

pub struct Node<K> {
    key: K,
    next: Atomic<Node<K>>,
    marked: AtomicBool,
}

impl<K> Node<K> {
    fn new(key: K) -> Self {
        Self {
            key,
            next: Atomic::null(),
            marked: AtomicBool::new(false),
        }
    }

    pub fn key(&self) -> &K {
        &self.key
    }

    fn is_marked(&self) -> bool {
        self.marked.load(Ordering::SeqCst)
    }
}

pub struct NoReclaimList<K> {
    head: Shared<Node<K>>,
    tail: Shared<Node<K>>,
}

unsafe impl<K: Send> Send for NoReclaimList<K> {}
unsafe impl<K: Send + Sync> Sync for NoReclaimList<K> {}

impl<K> NoReclaimList<K>
where
    K: Ord + Default,
{
    pub fn new() -> Self {
        // Sentinel keys are default-constructed and never compared.
        let tail = Shared::from_owned(Node::new(K::default()));
        let head = Shared::from_owned(Node::new(K::default()));
        unsafe { head.deref() }.next.store(tail, Ordering::SeqCst);
        Self { head, tail }
    }

    /// Finds the adjacent pair `(left, right)` around `key`: `left` is the
    /// last unmarked node with a smaller key (or the head sentinel) and
    /// `right` the first unmarked node with `key` or greater (or the tail
    /// sentinel). Runs of marked nodes found between them are spliced out
    /// with a single compare-and-swap before returning.
    fn search(&self, key: &K) -> (Shared<Node<K>>, Shared<Node<K>>) {
        loop {
            let mut t = self.head;
            let mut t_next = unsafe { t.deref() }.next.load(Ordering::SeqCst);
            let mut left = t;
            let mut left_next = t_next;

            // 1. Find left and right (right may still be marked).
            loop {
                if !unsafe { t.deref() }.is_marked() {
                    left = t;
                    left_next = t_next;
                }

                t = t_next;
                if t == self.tail {
                    break;
                }
                let t_ref = unsafe { t.deref() };
                t_next = t_ref.next.load(Ordering::SeqCst);

                if !t_ref.is_marked() && t_ref.key >= *key {
                    break;
                }
            }
            let right = t;

            // 2. If the pair is adjacent, only a marked right forces a
            // rerun.
            if left_next == right {
                if right != self.tail && unsafe { right.deref() }.is_marked() {
                    continue;
                }
                return (left, right);
            }

            // 3. Splice the marked run out in one step. The unlinked
            // nodes stay allocated until the list is dropped.
            if unsafe { left.deref() }
                .next
                .compare_exchange(left_next, right, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
            {
                if right != self.tail && unsafe { right.deref() }.is_marked() {
                    continue;
                }
                return (left, right);
            }
        }
    }

    pub fn insert(&self, key: K) -> bool {
        let mut node = Box::new(Node::new(key));

        loop {
            let (left, right) = self.search(&node.key);

            if right != self.tail && unsafe { right.deref() }.key == node.key {
                return false;
            }

            node.next.store(right, Ordering::SeqCst);
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

    pub fn remove(&self, key: &K) -> bool {
        let (left, right, right_next) = loop {
            let (left, right) = self.search(key);

            if right == self.tail || unsafe { right.deref() }.key != *key {
                return false;
            }

            let right_ref = unsafe { right.deref() };
            let right_next = right_ref.next.load(Ordering::SeqCst);
            if right_ref
                .marked
                .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
            {
                break (left, right, right_next);
            }
        };

        // One unlink attempt; losing it is fine, the next search over this
        // range completes the physical deletion.
        let _ = unsafe { left.deref() }.next.compare_exchange(
            right,
            right_next,
            Ordering::SeqCst,
            Ordering::SeqCst,
        );

        true
    }

    pub fn find(&self, key: &K) -> bool {
        let (_, right) = self.search(key);
        if right == self.tail {
            return false;
        }
        let right_ref = unsafe { right.deref() };
        // A mark landing after the search linearises this find right
        // after the remove that won.
        right_ref.key == *key && !right_ref.is_marked()
    }

    /// First node after the head sentinel. Diagnostic; not linearisable
    /// against concurrent operations.
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
    /// `node` must be a node of this list.
    pub unsafe fn next(&self, node: Shared<Node<K>>) -> Shared<Node<K>> {
        unsafe { node.deref() }.next.load(Ordering::SeqCst)
    }

    /// Dumps the unmarked keys in ascending order. Diagnostic only.
    pub fn print_list(&self)
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

impl<K> Default for NoReclaimList<K>
where
    K: Ord + Default,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K> Drop for NoReclaimList<K> {
    fn drop(&mut self) {
        // Frees the reachable chain only; nodes spliced out during the
        // list's lifetime are unreachable from the head and stay leaked.
        let mut current = self.head;
        while !current.is_null() {
            let node = unsafe { Box::from_raw(current.into_raw()) };
            current = node.next.load(Ordering::Relaxed);
        }
    }
}

impl<K> ConcurrentSet<K> for NoReclaimList<K>
where
    K: Ord + Default,
{
    type Handle<'a> = ()
    where
        Self: 'a,
        K: 'a;

    fn new() -> Self {
        Self::new()
    }

    fn register(&self) -> Self::Handle<'_> {}

    #[inline(always)]
    fn insert<'a>(&self, _handle: &mut Self::Handle<'a>, key: K) -> bool
    where
        K: 'a,
    {
        self.insert(key)
    }

    #[inline(always)]
    fn remove<'a>(&self, _handle: &mut Self::Handle<'a>, key: &K) -> bool
    where
        K: 'a,
    {
        self.remove(key)
    }

    #[inline(always)]
    fn find<'a>(&self, _handle: &mut Self::Handle<'a>, key: &K) -> bool
    where
        K: 'a,
    {
        self.find(key)
    }
}

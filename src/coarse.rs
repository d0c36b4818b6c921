//! Baseline sorted list behind a single mutex.

use std::fmt::Display;
use std::sync::Mutex;

use crate::concurrent_set::ConcurrentSet;

pub struct Node<K> {
    key: K,
    next: *mut Node<K>,
}

impl<K> Node<K> {
    pub fn key(&self) -> &K {
        &self.key
    }
}

/// The chain between the sentinels. Only ever touched under the list lock.
struct Chain<K> {
    head: *mut Node<K>,
    tail: *mut Node<K>,
}

unsafe impl<K: Send> Send for Chain<K> {}

pub struct CoarseList<K> {
    inner: Mutex<Chain<K>>,
}

impl<K> CoarseList<K>
where
    K: Ord + Default,
{
    pub fn new() -> Self {
        // Sentinel keys are default-constructed and never compared.
        let tail = Box::into_raw(Box::new(Node {
            key: K::default(),
            next: std::ptr::null_mut(),
        }));
        let head = Box::into_raw(Box::new(Node {
            key: K::default(),
            next: tail,
        }));
        Self {
            inner: Mutex::new(Chain { head, tail }),
        }
    }

    pub fn insert(&self, key: K) -> bool {
        let chain = self.inner.lock().unwrap();
        let mut current = chain.head;

        unsafe {
            while (*current).next != chain.tail && (*(*current).next).key < key {
                current = (*current).next;
            }

            if (*current).next != chain.tail && (*(*current).next).key == key {
                return false;
            }

            let new_node = Box::into_raw(Box::new(Node {
                key,
                next: (*current).next,
            }));
            (*current).next = new_node;
        }

        true
    }

    pub fn remove(&self, key: &K) -> bool {
        let chain = self.inner.lock().unwrap();
        let mut current = chain.head;

        unsafe {
            while (*current).next != chain.tail && (*(*current).next).key < *key {
                current = (*current).next;
            }

            if (*current).next != chain.tail && (*(*current).next).key == *key {
                let victim = (*current).next;
                (*current).next = (*victim).next;
                drop(Box::from_raw(victim));
                return true;
            }
        }

        false
    }

    pub fn find(&self, key: &K) -> bool {
        let chain = self.inner.lock().unwrap();
        let mut current = unsafe { (*chain.head).next };

        while current != chain.tail {
            unsafe {
                if (*current).key == *key {
                    return true;
                }
                current = (*current).next;
            }
        }

        false
    }

    /// First real node, or the tail sentinel when the list is empty.
    pub fn front(&self) -> *const Node<K> {
        let chain = self.inner.lock().unwrap();
        unsafe { (*chain.head).next }
    }

    pub fn tail(&self) -> *const Node<K> {
        self.inner.lock().unwrap().tail
    }

    /// Successor of `node`.
    ///
    /// # Safety
    ///
    /// `node` must be a live node of this list and no concurrent removal
    /// may be running.
    pub unsafe fn next(&self, node: *const Node<K>) -> *const Node<K> {
        let _chain = self.inner.lock().unwrap();
        unsafe { (*node).next }
    }

    /// Dumps the live keys in ascending order. Diagnostic only.
    pub fn print_list(&self)
    where
        K: Display,
    {
        let chain = self.inner.lock().unwrap();
        let mut current = unsafe { (*chain.head).next };
        while current != chain.tail {
            unsafe {
                print!("{} -> ", (*current).key);
                current = (*current).next;
            }
        }
        println!("NULL");
    }
}

impl<K> Default for CoarseList<K>
where
    K: Ord + Default,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K> Drop for CoarseList<K> {
    fn drop(&mut self) {
        let chain = self.inner.get_mut().unwrap();
        let mut current = chain.head;
        while !current.is_null() {
            let node = unsafe { Box::from_raw(current) };
            current = node.next;
        }
    }
}

impl<K> ConcurrentSet<K> for CoarseList<K>
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

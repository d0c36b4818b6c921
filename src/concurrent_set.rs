//! The common contract of the three list variants.

/// A concurrent ordered set of keys.
///
/// Threads participate through a per-thread handle obtained from
/// [`register`](ConcurrentSet::register); for the hazard-pointer variant
/// the handle carries the thread's hazard record, for the others it is
/// free.
pub trait ConcurrentSet<K> {
    type Handle<'a>
    where
        Self: 'a,
        K: 'a;

    fn new() -> Self
    where
        Self: Sized;

    /// Claims this thread's participation handle.
    fn register(&self) -> Self::Handle<'_>;

    /// Adds `key`; `false` if it was already present.
    fn insert<'a>(&self, handle: &mut Self::Handle<'a>, key: K) -> bool
    where
        K: 'a;

    /// Removes `key`; `false` if it was absent.
    fn remove<'a>(&self, handle: &mut Self::Handle<'a>, key: &K) -> bool
    where
        K: 'a;

    /// Whether `key` is present.
    fn find<'a>(&self, handle: &mut Self::Handle<'a>, key: &K) -> bool
    where
        K: 'a;
}

#[cfg(test)]
pub mod tests {
    use super::ConcurrentSet;
    use crossbeam_utils::thread;
    use rand::prelude::*;
    use std::time::Duration;

    pub const THREADS: i32 = 8;
    pub const KEYS_PER_THREAD: i32 = 100;

    /// Shuffled insert/remove/find churn over per-thread key stripes.
    pub fn smoke<S: ConcurrentSet<i32> + Send + Sync>() {
        let set = &S::new();

        thread::scope(|s| {
            for t in 0..THREADS {
                s.spawn(move |_| {
                    let mut handle = set.register();
                    let mut rng = rand::thread_rng();
                    let mut keys: Vec<i32> =
                        (0..KEYS_PER_THREAD).map(|k| k * THREADS + t).collect();
                    keys.shuffle(&mut rng);
                    for key in keys {
                        assert!(set.insert(&mut handle, key));
                    }
                });
            }
        })
        .unwrap();

        thread::scope(|s| {
            for t in 0..(THREADS / 2) {
                s.spawn(move |_| {
                    let mut handle = set.register();
                    let mut rng = rand::thread_rng();
                    let mut keys: Vec<i32> =
                        (0..KEYS_PER_THREAD).map(|k| k * THREADS + t).collect();
                    keys.shuffle(&mut rng);
                    for key in keys {
                        assert!(set.remove(&mut handle, &key));
                    }
                });
            }
        })
        .unwrap();

        thread::scope(|s| {
            for t in (THREADS / 2)..THREADS {
                s.spawn(move |_| {
                    let mut handle = set.register();
                    let mut rng = rand::thread_rng();
                    let mut keys: Vec<i32> =
                        (0..KEYS_PER_THREAD).map(|k| k * THREADS + t).collect();
                    keys.shuffle(&mut rng);
                    for key in keys {
                        assert!(set.find(&mut handle, &key));
                    }
                });
            }
        })
        .unwrap();
    }

    /// Thread `i` inserts the disjoint range `[i*100, (i+1)*100)`.
    /// Afterwards every key must be present.
    pub fn partitioned_insert<S: ConcurrentSet<i32> + Send + Sync>(set: &S) {
        thread::scope(|s| {
            for t in 0..THREADS {
                s.spawn(move |_| {
                    let mut handle = set.register();
                    for key in t * KEYS_PER_THREAD..(t + 1) * KEYS_PER_THREAD {
                        assert!(set.insert(&mut handle, key));
                    }
                });
            }
        })
        .unwrap();

        let mut handle = set.register();
        for key in 0..THREADS * KEYS_PER_THREAD {
            assert!(set.find(&mut handle, &key));
        }
    }

    /// Each thread inserts even offsets into its own stripe and
    /// backoff-removes the key it inserted one step earlier. The set must
    /// quiesce to empty; the caller checks that with its own accessors.
    pub fn churn_all_delete<S: ConcurrentSet<i32> + Send + Sync>(set: &S) {
        thread::scope(|s| {
            for t in 0..THREADS {
                s.spawn(move |_| {
                    let mut handle = set.register();
                    let base = t * KEYS_PER_THREAD;
                    for i in 0..KEYS_PER_THREAD {
                        if i % 2 == 0 {
                            set.insert(&mut handle, base + i);
                        } else {
                            for attempt in 0..3 {
                                if set.remove(&mut handle, &(base + i - 1)) {
                                    break;
                                }
                                std::thread::sleep(Duration::from_millis(1 << attempt));
                            }
                        }
                    }
                });
            }
        })
        .unwrap();
    }

    /// Each thread inserts even offsets into its own stripe and attempts
    /// to remove odd keys that are never inserted. Exactly the even-offset
    /// keys must survive.
    pub fn mixed_remove_absent<S: ConcurrentSet<i32> + Send + Sync>(set: &S) {
        thread::scope(|s| {
            for t in 0..THREADS {
                s.spawn(move |_| {
                    let mut handle = set.register();
                    for i in 0..KEYS_PER_THREAD {
                        if i % 2 == 0 {
                            set.insert(&mut handle, i + t * KEYS_PER_THREAD);
                        } else {
                            assert!(!set.remove(&mut handle, &i));
                        }
                    }
                });
            }
        })
        .unwrap();

        let mut handle = set.register();
        for t in 0..THREADS {
            for i in 0..KEYS_PER_THREAD {
                let key = i + t * KEYS_PER_THREAD;
                assert_eq!(set.find(&mut handle, &key), i % 2 == 0);
            }
        }
    }

    /// Concurrent inserters and backoff-removers over the same disjoint
    /// ranges; the set must end empty of every key.
    pub fn separate_insert_remove<S: ConcurrentSet<i32> + Send + Sync>(set: &S) {
        thread::scope(|s| {
            for t in 0..THREADS {
                s.spawn(move |_| {
                    let mut handle = set.register();
                    for key in t * KEYS_PER_THREAD..(t + 1) * KEYS_PER_THREAD {
                        set.insert(&mut handle, key);
                    }
                });
                s.spawn(move |_| {
                    let mut handle = set.register();
                    for key in t * KEYS_PER_THREAD..(t + 1) * KEYS_PER_THREAD {
                        for attempt in 0..10 {
                            if set.remove(&mut handle, &key) {
                                break;
                            }
                            std::thread::sleep(Duration::from_millis(1 << attempt.min(4)));
                        }
                    }
                });
            }
        })
        .unwrap();

        let mut handle = set.register();
        for key in 0..THREADS * KEYS_PER_THREAD {
            assert!(!set.find(&mut handle, &key));
        }
    }
}

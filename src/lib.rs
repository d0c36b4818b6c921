//! Three flavours of a concurrent sorted set of keys, backed by a
//! singly-linked list:
//!
//! - [`coarse::CoarseList`]: one mutex around the whole chain.
//! - [`no_reclaim::NoReclaimList`]: Harris's lock-free list, leaking
//!   removed nodes.
//! - [`hp::HpList`]: the same list with hazard-pointer reclamation.
//!
//! The binary benchmarks all three against each other; see `src/main.rs`.

cfg_if::cfg_if! {
    if #[cfg(all(not(feature = "sanitize"), target_os = "linux"))] {
        use jemallocator::Jemalloc;
        #[global_allocator]
        static ALLOC: Jemalloc = Jemalloc;
    }
}

pub mod coarse;
pub mod concurrent_set;
pub mod config;
pub mod hp;
pub mod no_reclaim;
pub mod pointers;

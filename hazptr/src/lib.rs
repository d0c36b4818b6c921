//! Hazard-pointer registry for lock-free linked-list nodes.
//!
//! A [`Domain`] owns a fixed table of hazard records. Each participating
//! thread claims one record through a [`Thread`] handle and publishes the
//! pointers it is about to dereference in the record's slots. Retired nodes
//! are buffered per thread and freed only once no slot in the table refers
//! to them.
//!
//! Every data structure instance owns its own `Domain`, so the lifetime of
//! the registry is exactly the lifetime of the structure it guards.

mod domain;
mod retire;
mod thread;

pub use domain::Domain;
pub use retire::Retired;
pub use thread::Thread;

pub use membarrier::light as light_membarrier;

/// Capacity of the hazard record table. Claiming a record beyond this many
/// concurrent participants aborts the process.
pub const MAX_THREADS: usize = 256;

/// Hazard slots per record. The list traversal needs five: current node,
/// its successor, a lookahead successor, the committed left node, and the
/// unlink target's successor.
pub const HP_PER_THREAD: usize = 5;

/// Retired-buffer length that triggers a reclamation scan.
pub const RETIRE_THRESHOLD: usize = 50;

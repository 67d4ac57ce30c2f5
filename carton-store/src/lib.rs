//! Carton Store
//!
//! Process-safe access to container state files. Multiple independent
//! processes can read and write the same structured file without
//! coordination beyond the file itself:
//! - every read runs under a shared advisory lock
//! - every write runs under an exclusive advisory lock
//! - each operation is one open → lock → operate → close cycle, and
//!   the close (lock release) is guaranteed on every exit path
//!
//! Locks block indefinitely; callers needing bounded waits must layer
//! a timeout externally. Concurrency is cross-process only: within a
//! process this library is synchronous and single-threaded by design.

pub mod container;
pub mod error;
pub mod lock;
mod paths;
pub mod scope;
pub mod sim;

// Re-exports
pub use carton_model::{ContainerKind, ContainerRecord, PathTriple, Uuid};
pub use container::{ContainerOptions, ContainerStore};
pub use error::StoreError;
pub use lock::{LockedFile, OpenMode};
pub use scope::{read_scope, write_scope};
pub use sim::SimStore;

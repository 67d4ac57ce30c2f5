//! Carton Model
//!
//! Pure data types and traits for the carton metadata store, decoupled
//! from the table engine and the locking/store layers.

pub mod engine;
pub mod record;
pub mod schema;

// Re-exports
pub use engine::TableEngine;
pub use record::{ContainerKind, ContainerRecord, PathTriple};
pub use schema::{ColumnSpec, TableSchema};
pub use uuid::Uuid;

//! Table engine interface.
//!
//! The store layer manipulates rows only through this trait; the
//! concrete engine (carton-tables) stays swappable behind it. Opening
//! and closing a file are engine-specific and live on the implementing
//! type, so the trait covers only the in-session operations:
//! table/group management, row append, iteration, in-place update,
//! and removal by index.

use crate::schema::TableSchema;

/// Operations over an open table-file session.
///
/// Row indices are positional in insertion order; removing a row
/// shifts every subsequent index down by one, which callers deleting
/// multiple rows must correct for.
pub trait TableEngine {
    type Error: std::error::Error;

    /// Create a new empty table. Fails if the name is already taken.
    fn create_table(&mut self, name: &str, schema: &TableSchema) -> Result<(), Self::Error>;

    /// Whether a table with this name exists.
    fn has_table(&self, name: &str) -> bool;

    /// All table names, in creation order.
    fn table_names(&self) -> Vec<String>;

    /// Drop a whole table, schema included.
    fn remove_table(&mut self, name: &str) -> Result<(), Self::Error>;

    /// Create a group node. Creating an existing group is a no-op.
    fn create_group(&mut self, name: &str) -> Result<(), Self::Error>;

    /// Whether a group node with this name exists.
    fn has_group(&self, name: &str) -> bool;

    /// Append one row; cells in schema column order.
    fn append_row(&mut self, table: &str, row: &[&str]) -> Result<(), Self::Error>;

    /// All rows of a table, in insertion order.
    fn rows(&self, table: &str) -> Result<Vec<Vec<String>>, Self::Error>;

    /// Current row count.
    fn row_count(&self, table: &str) -> Result<usize, Self::Error>;

    /// Overwrite one cell of an existing row in place.
    fn update_cell(
        &mut self,
        table: &str,
        row: usize,
        column: &str,
        value: &str,
    ) -> Result<(), Self::Error>;

    /// Remove the row at `index`, shifting subsequent rows down.
    fn remove_row(&mut self, table: &str, index: usize) -> Result<(), Self::Error>;
}

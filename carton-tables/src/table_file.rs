//! TableFile - one open session over a state file.
//!
//! The store layer opens and locks the underlying descriptor, then
//! hands a duplicate here. A session parses the whole file up front,
//! applies mutations to the in-memory image, and (write sessions only)
//! serializes the image back through the same descriptor on `flush`.
//! Read sessions never write. Nothing is cached across sessions.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};

use carton_model::engine::TableEngine;
use carton_model::schema::TableSchema;
use thiserror::Error;

use crate::format::{self, Column, FileImage, TableData};

/// Errors from table-file sessions.
#[derive(Debug, Error)]
pub enum TableError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid state file: {0}")]
    InvalidFormat(String),

    #[error("no such table: {0}")]
    UnknownTable(String),

    #[error("table already exists: {0}")]
    DuplicateTable(String),

    #[error("no column {column} in table {table}")]
    UnknownColumn { table: String, column: String },

    #[error("value for {table}.{column} is {len} bytes, column width is {width}")]
    ValueTooWide {
        table: String,
        column: String,
        width: u16,
        len: usize,
    },

    #[error("value for {table}.{column} contains a NUL byte")]
    NulByte { table: String, column: String },

    #[error("row {index} out of bounds for table {table} with {rows} rows")]
    RowOutOfBounds {
        table: String,
        index: usize,
        rows: usize,
    },

    #[error("table {table} expects {expected} cells per row, got {got}")]
    ArityMismatch {
        table: String,
        expected: usize,
        got: usize,
    },

    #[error("session is read-only")]
    ReadOnly,
}

/// Session mode. Write sessions may mutate and flush; read sessions
/// reject every mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Read,
    Write,
}

/// One open session over a state file.
pub struct TableFile {
    file: File,
    mode: Mode,
    image: FileImage,
}

impl TableFile {
    /// Open a read session. The descriptor must be readable; an empty
    /// file is not a valid state file.
    pub fn open_reader(file: File) -> Result<Self, TableError> {
        let (file, image) = Self::load(file)?;
        let image = image.ok_or_else(|| TableError::InvalidFormat("empty file".into()))?;
        Ok(Self { file, mode: Mode::Read, image })
    }

    /// Open a write session. A zero-length file (just created) starts
    /// from an empty image.
    pub fn open_writer(file: File) -> Result<Self, TableError> {
        let (file, image) = Self::load(file)?;
        Ok(Self {
            file,
            mode: Mode::Write,
            image: image.unwrap_or_default(),
        })
    }

    fn load(mut file: File) -> Result<(File, Option<FileImage>), TableError> {
        let mut buf = Vec::new();
        file.seek(SeekFrom::Start(0))?;
        file.read_to_end(&mut buf)?;
        if buf.is_empty() {
            return Ok((file, None));
        }
        let image = format::decode(&buf)?;
        Ok((file, Some(image)))
    }

    /// Serialize the image back through the descriptor. Write-back is
    /// in place: seek to the start, write, truncate to the new length.
    /// The caller holds the exclusive lock for the whole session, so
    /// no other process observes the intermediate state.
    pub fn flush(&mut self) -> Result<(), TableError> {
        if self.mode != Mode::Write {
            return Err(TableError::ReadOnly);
        }
        let buf = format::encode(&self.image);
        self.file.seek(SeekFrom::Start(0))?;
        self.file.write_all(&buf)?;
        self.file.set_len(buf.len() as u64)?;
        self.file.sync_all()?;
        Ok(())
    }

    fn check_writable(&self) -> Result<(), TableError> {
        match self.mode {
            Mode::Write => Ok(()),
            Mode::Read => Err(TableError::ReadOnly),
        }
    }

    fn table(&self, name: &str) -> Result<&TableData, TableError> {
        self.image
            .tables
            .iter()
            .find(|t| t.name == name)
            .ok_or_else(|| TableError::UnknownTable(name.into()))
    }

    fn table_mut(&mut self, name: &str) -> Result<&mut TableData, TableError> {
        self.image
            .tables
            .iter_mut()
            .find(|t| t.name == name)
            .ok_or_else(|| TableError::UnknownTable(name.into()))
    }

    fn check_cell(table: &str, col: &Column, value: &str) -> Result<(), TableError> {
        if value.as_bytes().contains(&0) {
            return Err(TableError::NulByte {
                table: table.into(),
                column: col.name.clone(),
            });
        }
        if value.len() > col.width as usize {
            return Err(TableError::ValueTooWide {
                table: table.into(),
                column: col.name.clone(),
                width: col.width,
                len: value.len(),
            });
        }
        Ok(())
    }
}

impl TableEngine for TableFile {
    type Error = TableError;

    fn create_table(&mut self, name: &str, schema: &TableSchema) -> Result<(), TableError> {
        self.check_writable()?;
        if name.is_empty() || name.len() > u16::MAX as usize {
            return Err(TableError::InvalidFormat(format!(
                "invalid table name of {} bytes",
                name.len()
            )));
        }
        if self.has_table(name) {
            return Err(TableError::DuplicateTable(name.into()));
        }
        let columns = schema
            .columns
            .iter()
            .map(|c| {
                if c.width == 0 {
                    return Err(TableError::InvalidFormat(format!(
                        "zero-width column {} in table {}",
                        c.name, name
                    )));
                }
                Ok(Column { name: c.name.to_string(), width: c.width })
            })
            .collect::<Result<Vec<_>, _>>()?;
        self.image.tables.push(TableData {
            name: name.into(),
            columns,
            rows: Vec::new(),
        });
        Ok(())
    }

    fn has_table(&self, name: &str) -> bool {
        self.image.tables.iter().any(|t| t.name == name)
    }

    fn table_names(&self) -> Vec<String> {
        self.image.tables.iter().map(|t| t.name.clone()).collect()
    }

    fn remove_table(&mut self, name: &str) -> Result<(), TableError> {
        self.check_writable()?;
        let idx = self
            .image
            .tables
            .iter()
            .position(|t| t.name == name)
            .ok_or_else(|| TableError::UnknownTable(name.into()))?;
        self.image.tables.remove(idx);
        Ok(())
    }

    fn create_group(&mut self, name: &str) -> Result<(), TableError> {
        self.check_writable()?;
        if !self.has_group(name) {
            self.image.groups.push(name.into());
        }
        Ok(())
    }

    fn has_group(&self, name: &str) -> bool {
        self.image.groups.iter().any(|g| g == name)
    }

    fn append_row(&mut self, table: &str, row: &[&str]) -> Result<(), TableError> {
        self.check_writable()?;
        let data = self.table_mut(table)?;
        if row.len() != data.columns.len() {
            return Err(TableError::ArityMismatch {
                table: table.into(),
                expected: data.columns.len(),
                got: row.len(),
            });
        }
        for (cell, col) in row.iter().zip(&data.columns) {
            Self::check_cell(table, col, cell)?;
        }
        data.rows.push(row.iter().map(|c| c.to_string()).collect());
        Ok(())
    }

    fn rows(&self, table: &str) -> Result<Vec<Vec<String>>, TableError> {
        Ok(self.table(table)?.rows.clone())
    }

    fn row_count(&self, table: &str) -> Result<usize, TableError> {
        Ok(self.table(table)?.rows.len())
    }

    fn update_cell(
        &mut self,
        table: &str,
        row: usize,
        column: &str,
        value: &str,
    ) -> Result<(), TableError> {
        self.check_writable()?;
        let data = self.table_mut(table)?;
        let col_idx = data
            .columns
            .iter()
            .position(|c| c.name == column)
            .ok_or_else(|| TableError::UnknownColumn {
                table: table.into(),
                column: column.into(),
            })?;
        let rows = data.rows.len();
        if row >= rows {
            return Err(TableError::RowOutOfBounds {
                table: table.into(),
                index: row,
                rows,
            });
        }
        Self::check_cell(table, &data.columns[col_idx], value)?;
        data.rows[row][col_idx] = value.to_string();
        Ok(())
    }

    fn remove_row(&mut self, table: &str, index: usize) -> Result<(), TableError> {
        self.check_writable()?;
        let data = self.table_mut(table)?;
        let rows = data.rows.len();
        if index >= rows {
            return Err(TableError::RowOutOfBounds {
                table: table.into(),
                index,
                rows,
            });
        }
        data.rows.remove(index);
        Ok(())
    }
}

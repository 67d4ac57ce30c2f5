//! Container store - synchronized CRUD over one state file.
//!
//! Tables:
//! - `meta` — uuid, name, container_kind, location (exactly one row)
//! - `coordinator` — origin abspath (exactly one row, empty = none)
//! - `tags` — one tag per row, unique
//! - `categories` — key/value rows, keys unique
//!
//! Every operation reopens the file under its own advisory lock
//! (shared for reads, exclusive for writes) and closes it before
//! returning. Nothing is cached between calls, so each call observes
//! the current on-disk state regardless of what other processes did
//! in between.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use carton_model::schema::{
    CATEGORIES_SCHEMA, COL_VALUE, COORDINATOR_SCHEMA, META_SCHEMA, TABLE_CATEGORIES,
    TABLE_COORDINATOR, TABLE_META, TABLE_TAGS, TAGS_SCHEMA, TableSchema,
};
use carton_model::{ContainerKind, ContainerRecord, TableEngine, Uuid};
use carton_tables::{TableError, TableFile};
use tracing::{debug, warn};

use crate::error::StoreError;
use crate::lock::LockedFile;
use crate::paths::{container_dir, path_to_str};
use crate::scope::{read_scope, write_scope};

/// Creation-time options for a container state file.
#[derive(Debug, Clone, Default)]
pub struct ContainerOptions {
    /// User-given name; defaults to the kind tag.
    pub name: Option<String>,
    /// Absolute path of a parent registry file, if any.
    pub origin: Option<PathBuf>,
    /// Initial tags; duplicates collapse.
    pub tags: Vec<String>,
    /// Initial categories; later duplicates of a key win.
    pub categories: BTreeMap<String, String>,
}

/// Handle to one container state file.
///
/// Holding a `ContainerStore` implies the file exists and passed
/// verification; it does not hold the file open or locked.
#[derive(Debug, Clone)]
pub struct ContainerStore {
    path: PathBuf,
    kind: ContainerKind,
}

impl ContainerStore {
    /// Open the state file at `path`, creating it when absent.
    ///
    /// An existing file is verified: it must parse, carry a meta row,
    /// and match the expected kind. `opts` only applies on creation.
    pub fn open(
        path: impl Into<PathBuf>,
        kind: ContainerKind,
        opts: ContainerOptions,
    ) -> Result<Self, StoreError> {
        let path = path.into();
        if LockedFile::exists(&path) {
            verify(&path, kind)?;
            Ok(Self { path, kind })
        } else {
            Self::create(path, kind, opts)
        }
    }

    /// Create a fresh state file. Fails with `AlreadyExists` when the
    /// file is already on disk.
    pub fn create(
        path: impl Into<PathBuf>,
        kind: ContainerKind,
        opts: ContainerOptions,
    ) -> Result<Self, StoreError> {
        let path = path.into();
        if LockedFile::exists(&path) {
            return Err(StoreError::AlreadyExists(path));
        }
        debug!(path = %path.display(), %kind, "creating container state file");
        write_scope(&path, |tf| create_base_tables(tf, kind, &path, &opts))?;
        Ok(Self { path, kind })
    }

    /// Wrap a path that has already been created or verified.
    pub(crate) fn from_verified(path: PathBuf, kind: ContainerKind) -> Self {
        Self { path, kind }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kind(&self) -> ContainerKind {
        self.kind
    }

    /// The identity row of the `meta` table.
    pub fn record(&self) -> Result<ContainerRecord, StoreError> {
        read_scope(&self.path, |tf| parse_record(tf.rows(TABLE_META)?))
    }

    /// The origin pointer, if one was recorded.
    pub fn origin(&self) -> Result<Option<PathBuf>, StoreError> {
        read_scope(&self.path, |tf| {
            let rows = tf.rows(TABLE_COORDINATOR)?;
            let row = single_row(TABLE_COORDINATOR, &rows)?;
            Ok(match row.first() {
                None => None,
                Some(abspath) if abspath.is_empty() => None,
                Some(abspath) => Some(PathBuf::from(abspath)),
            })
        })
    }

    /// All tags, unordered.
    pub fn tags(&self) -> Result<BTreeSet<String>, StoreError> {
        read_scope(&self.path, |tf| {
            Ok(tf
                .rows(TABLE_TAGS)?
                .into_iter()
                .filter_map(|row| row.into_iter().next())
                .collect())
        })
    }

    /// Add tags, skipping any already present. Re-adding the same tags
    /// is a no-op, so the table never accumulates duplicates.
    pub fn add_tags<I, S>(&self, tags: I) -> Result<(), StoreError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let wanted: BTreeSet<String> = tags.into_iter().map(Into::into).collect();
        write_scope(&self.path, |tf| {
            let existing: BTreeSet<String> = tf
                .rows(TABLE_TAGS)?
                .into_iter()
                .filter_map(|row| row.into_iter().next())
                .collect();
            for tag in wanted.difference(&existing) {
                tf.append_row(TABLE_TAGS, &[tag.as_str()])?;
            }
            Ok(())
        })
    }

    /// Delete the given tags. Absent tags are silently skipped; with
    /// `purge` the whole table is dropped and recreated empty.
    pub fn del_tags<I, S>(&self, tags: I, purge: bool) -> Result<(), StoreError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let wanted: BTreeSet<String> = tags.into_iter().map(Into::into).collect();
        write_scope(&self.path, |tf| {
            delete_matching(tf, TABLE_TAGS, &TAGS_SCHEMA, &wanted, purge)
        })
    }

    /// All categories as a key-unique map.
    pub fn categories(&self) -> Result<BTreeMap<String, String>, StoreError> {
        read_scope(&self.path, |tf| {
            Ok(tf
                .rows(TABLE_CATEGORIES)?
                .into_iter()
                .filter_map(|row| {
                    let mut cells = row.into_iter();
                    Some((cells.next()?, cells.next()?))
                })
                .collect())
        })
    }

    /// Upsert categories: existing keys have their value overwritten
    /// in place, new keys are appended. Last writer wins.
    pub fn add_categories<I, K, V>(&self, pairs: I) -> Result<(), StoreError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut pending: BTreeMap<String, String> = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        write_scope(&self.path, |tf| {
            let rows = tf.rows(TABLE_CATEGORIES)?;
            for (index, row) in rows.iter().enumerate() {
                let Some(key) = row.first() else { continue };
                if let Some(value) = pending.remove(key) {
                    tf.update_cell(TABLE_CATEGORIES, index, COL_VALUE, &value)?;
                }
            }
            for (key, value) in &pending {
                tf.append_row(TABLE_CATEGORIES, &[key.as_str(), value.as_str()])?;
            }
            Ok(())
        })
    }

    /// Delete categories by key; same semantics as `del_tags`.
    pub fn del_categories<I, S>(&self, keys: I, purge: bool) -> Result<(), StoreError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let wanted: BTreeSet<String> = keys.into_iter().map(Into::into).collect();
        write_scope(&self.path, |tf| {
            delete_matching(tf, TABLE_CATEGORIES, &CATEGORIES_SCHEMA, &wanted, purge)
        })
    }
}

// ---------------------------------------------------------------------------
// Shared creation / verification / deletion machinery
// ---------------------------------------------------------------------------

/// Write the four base tables into a fresh file. Also used by derived
/// stores, which extend the same exclusive-lock session afterwards.
pub(crate) fn create_base_tables(
    tf: &mut TableFile,
    kind: ContainerKind,
    path: &Path,
    opts: &ContainerOptions,
) -> Result<(), StoreError> {
    let location = container_dir(path)?;

    tf.create_table(TABLE_META, &META_SCHEMA)?;
    let uuid = Uuid::new_v4().to_string();
    let name = opts.name.as_deref().unwrap_or(kind.tag());
    tf.append_row(
        TABLE_META,
        &[uuid.as_str(), name, kind.tag(), path_to_str(&location)?],
    )?;

    tf.create_table(TABLE_COORDINATOR, &COORDINATOR_SCHEMA)?;
    let origin = match &opts.origin {
        Some(p) => path_to_str(p)?,
        None => "",
    };
    tf.append_row(TABLE_COORDINATOR, &[origin])?;

    tf.create_table(TABLE_TAGS, &TAGS_SCHEMA)?;
    let tags: BTreeSet<&str> = opts.tags.iter().map(String::as_str).collect();
    for tag in tags {
        tf.append_row(TABLE_TAGS, &[tag])?;
    }

    tf.create_table(TABLE_CATEGORIES, &CATEGORIES_SCHEMA)?;
    for (key, value) in &opts.categories {
        tf.append_row(TABLE_CATEGORIES, &[key.as_str(), value.as_str()])?;
    }

    Ok(())
}

/// Check that an existing file is a container state file of the
/// expected kind.
pub(crate) fn verify(path: &Path, expected: ContainerKind) -> Result<(), StoreError> {
    let record = match read_scope(path, |tf| {
        if !tf.has_table(TABLE_META) {
            return Err(StoreError::NotAContainer(path.to_path_buf()));
        }
        parse_record(tf.rows(TABLE_META)?)
    }) {
        Ok(record) => record,
        Err(StoreError::Table(TableError::InvalidFormat(reason))) => {
            warn!(path = %path.display(), %reason, "existing file is not a state file");
            return Err(StoreError::NotAContainer(path.to_path_buf()));
        }
        Err(e) => return Err(e),
    };
    if record.kind != expected {
        return Err(StoreError::KindMismatch {
            expected,
            found: record.kind,
        });
    }
    Ok(())
}

fn single_row<'a>(table: &str, rows: &'a [Vec<String>]) -> Result<&'a Vec<String>, StoreError> {
    match rows {
        [row] => Ok(row),
        _ => Err(StoreError::Corrupt(format!(
            "table {} holds {} rows, expected exactly one",
            table,
            rows.len()
        ))),
    }
}

fn parse_record(rows: Vec<Vec<String>>) -> Result<ContainerRecord, StoreError> {
    let row = single_row(TABLE_META, &rows)?;
    let [uuid, name, kind, location] = row.as_slice() else {
        return Err(StoreError::Corrupt(format!(
            "meta row holds {} cells, expected 4",
            row.len()
        )));
    };
    let uuid = Uuid::parse_str(uuid)
        .map_err(|e| StoreError::Corrupt(format!("bad uuid in meta table: {}", e)))?;
    let kind = ContainerKind::from_tag(kind).ok_or_else(|| {
        StoreError::Corrupt(format!("unknown container kind {:?} in meta table", kind))
    })?;
    Ok(ContainerRecord {
        uuid,
        name: name.clone(),
        kind,
        location: PathBuf::from(location),
    })
}

/// Remove every row whose first cell is in `wanted`.
///
/// Matching row indices are collected in ascending order and deleted
/// with a shift correction: each removal moves later rows down by one,
/// so the i-th deletion targets `index - i`. When every row matches
/// (or on `purge`) the table is dropped and recreated instead, since
/// the engine path for removing rows cannot empty a table row by row.
fn delete_matching(
    tf: &mut TableFile,
    table: &str,
    schema: &TableSchema,
    wanted: &BTreeSet<String>,
    purge: bool,
) -> Result<(), StoreError> {
    if purge {
        return recreate(tf, table, schema);
    }

    let rows = tf.rows(table)?;
    let matches: Vec<usize> = rows
        .iter()
        .enumerate()
        .filter(|(_, row)| row.first().is_some_and(|cell| wanted.contains(cell)))
        .map(|(index, _)| index)
        .collect();

    if matches.len() == rows.len() {
        if !rows.is_empty() {
            debug!(table, rows = rows.len(), "all rows matched, recreating table");
        }
        return recreate(tf, table, schema);
    }

    for (deleted, index) in matches.into_iter().enumerate() {
        tf.remove_row(table, index - deleted)?;
    }
    Ok(())
}

fn recreate(tf: &mut TableFile, table: &str, schema: &TableSchema) -> Result<(), StoreError> {
    if tf.has_table(table) {
        tf.remove_table(table)?;
    }
    tf.create_table(table, schema)?;
    Ok(())
}

//! Simulation store - container store plus universe and selection
//! tables.
//!
//! Extends the base schema with:
//! - `universes/topology`, `universes/trajectory` — path triples for
//!   the files a universe is built from
//! - `selections/<name>` — one ordered table of selection strings per
//!   named selection
//!
//! All base operations (tags, categories, record, origin) are
//! inherited unchanged; the extra tables ride the same locking and
//! scope machinery.

use std::ops::Deref;
use std::path::{Path, PathBuf};

use carton_model::schema::{
    GROUP_SELECTIONS, GROUP_UNIVERSES, PATH_SCHEMA, SELECTION_SCHEMA, TABLE_TOPOLOGY,
    TABLE_TRAJECTORY,
};
use carton_model::{ContainerKind, PathTriple, TableEngine};
use tracing::debug;

use crate::container::{create_base_tables, verify, ContainerOptions, ContainerStore};
use crate::error::StoreError;
use crate::lock::LockedFile;
use crate::paths::{container_dir, path_triple};
use crate::scope::{read_scope, write_scope};

/// Handle to one simulation state file.
#[derive(Debug, Clone)]
pub struct SimStore {
    base: ContainerStore,
}

impl SimStore {
    /// Open the state file at `path`, creating it when absent.
    pub fn open(path: impl Into<PathBuf>, opts: ContainerOptions) -> Result<Self, StoreError> {
        let path = path.into();
        if LockedFile::exists(&path) {
            verify(&path, ContainerKind::Sim)?;
            Ok(Self {
                base: ContainerStore::from_verified(path, ContainerKind::Sim),
            })
        } else {
            Self::create(path, opts)
        }
    }

    /// Create a fresh simulation state file: the base tables plus the
    /// universe and selection groupings, all inside one exclusive-lock
    /// session.
    pub fn create(path: impl Into<PathBuf>, opts: ContainerOptions) -> Result<Self, StoreError> {
        let path = path.into();
        if LockedFile::exists(&path) {
            return Err(StoreError::AlreadyExists(path));
        }
        debug!(path = %path.display(), "creating simulation state file");
        write_scope(&path, |tf| {
            create_base_tables(tf, ContainerKind::Sim, &path, &opts)?;
            tf.create_group(GROUP_UNIVERSES)?;
            tf.create_table(TABLE_TOPOLOGY, &PATH_SCHEMA)?;
            tf.create_table(TABLE_TRAJECTORY, &PATH_SCHEMA)?;
            tf.create_group(GROUP_SELECTIONS)?;
            Ok(())
        })?;
        Ok(Self {
            base: ContainerStore::from_verified(path, ContainerKind::Sim),
        })
    }

    /// Record the files a universe is built from: one topology path
    /// and any number of trajectory paths. Each path is stored as an
    /// absolute / home-relative / container-relative triple.
    pub fn add_universe_paths(
        &self,
        topology: impl AsRef<Path>,
        trajectories: &[PathBuf],
    ) -> Result<(), StoreError> {
        let dir = container_dir(self.base.path())?;
        let top = path_triple(topology.as_ref(), &dir)?;
        let trjs: Vec<PathTriple> = trajectories
            .iter()
            .map(|t| path_triple(t, &dir))
            .collect::<Result<_, _>>()?;

        write_scope(self.base.path(), |tf| {
            tf.append_row(
                TABLE_TOPOLOGY,
                &[top.abspath.as_str(), top.relhome.as_str(), top.relsim.as_str()],
            )?;
            for t in &trjs {
                tf.append_row(
                    TABLE_TRAJECTORY,
                    &[t.abspath.as_str(), t.relhome.as_str(), t.relsim.as_str()],
                )?;
            }
            Ok(())
        })
    }

    /// Stored topology path triples, in insertion order.
    pub fn topology_paths(&self) -> Result<Vec<PathTriple>, StoreError> {
        self.path_rows(TABLE_TOPOLOGY)
    }

    /// Stored trajectory path triples, in insertion order.
    pub fn trajectory_paths(&self) -> Result<Vec<PathTriple>, StoreError> {
        self.path_rows(TABLE_TRAJECTORY)
    }

    fn path_rows(&self, table: &str) -> Result<Vec<PathTriple>, StoreError> {
        read_scope(self.base.path(), |tf| {
            Ok(tf
                .rows(table)?
                .into_iter()
                .filter_map(|row| {
                    let mut cells = row.into_iter();
                    Some(PathTriple {
                        abspath: cells.next()?,
                        relhome: cells.next()?,
                        relsim: cells.next()?,
                    })
                })
                .collect())
        })
    }

    /// Append selection strings to the named selection, creating its
    /// table on first use. Argument order is preserved; rows are only
    /// reordered by deleting and redefining the selection.
    pub fn add_selection(&self, name: &str, selections: &[&str]) -> Result<(), StoreError> {
        let table = selection_table(name);
        write_scope(self.base.path(), |tf| {
            if !tf.has_table(&table) {
                tf.create_table(&table, &SELECTION_SCHEMA)?;
            }
            for s in selections.iter().copied() {
                tf.append_row(&table, &[s])?;
            }
            Ok(())
        })
    }

    /// The named selection's strings in stored order; an unknown name
    /// yields an empty list.
    pub fn selection(&self, name: &str) -> Result<Vec<String>, StoreError> {
        let table = selection_table(name);
        read_scope(self.base.path(), |tf| {
            if !tf.has_table(&table) {
                return Ok(Vec::new());
            }
            Ok(tf
                .rows(&table)?
                .into_iter()
                .filter_map(|row| row.into_iter().next())
                .collect())
        })
    }

    /// Drop the named selection. Unknown names are a silent no-op.
    pub fn del_selection(&self, name: &str) -> Result<(), StoreError> {
        let table = selection_table(name);
        write_scope(self.base.path(), |tf| {
            if tf.has_table(&table) {
                tf.remove_table(&table)?;
            }
            Ok(())
        })
    }

    /// Names of all stored selections, in creation order.
    pub fn selections(&self) -> Result<Vec<String>, StoreError> {
        let prefix = format!("{}/", GROUP_SELECTIONS);
        read_scope(self.base.path(), |tf| {
            Ok(tf
                .table_names()
                .into_iter()
                .filter_map(|name| name.strip_prefix(&prefix).map(str::to_string))
                .collect())
        })
    }

    pub fn base(&self) -> &ContainerStore {
        &self.base
    }
}

impl Deref for SimStore {
    type Target = ContainerStore;

    fn deref(&self) -> &ContainerStore {
        &self.base
    }
}

fn selection_table(name: &str) -> String {
    format!("{}/{}", GROUP_SELECTIONS, name)
}

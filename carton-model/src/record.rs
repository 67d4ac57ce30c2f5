//! Typed rows for the fixed container tables.

use std::fmt;
use std::path::PathBuf;

use uuid::Uuid;

/// Container kind tag stored in the `meta` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerKind {
    Sim,
    Group,
}

impl ContainerKind {
    /// The tag string written to the `container_kind` column.
    pub fn tag(&self) -> &'static str {
        match self {
            ContainerKind::Sim => "Sim",
            ContainerKind::Group => "Group",
        }
    }

    /// Parse a tag string back into a kind.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "Sim" => Some(ContainerKind::Sim),
            "Group" => Some(ContainerKind::Group),
            _ => None,
        }
    }
}

impl fmt::Display for ContainerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// The single identity row of the `meta` table.
///
/// `uuid` and `kind` are immutable for the lifetime of the file;
/// `location` records the directory the file lived in at creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerRecord {
    pub uuid: Uuid,
    pub name: String,
    pub kind: ContainerKind,
    pub location: PathBuf,
}

/// Three stored representations of one file path: absolute, relative
/// to the user's home directory, and relative to the container
/// directory. Recorded so moved files can be relocated later from
/// heuristically good starting points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTriple {
    pub abspath: String,
    pub relhome: String,
    pub relsim: String,
}

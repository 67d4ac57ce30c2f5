//! Path helpers for container locations and stored path triples.

use std::io;
use std::path::{Component, Path, PathBuf};

use carton_model::PathTriple;

use crate::error::StoreError;

/// Absolute directory of a state file: its parent, resolved against
/// the current directory when relative.
pub(crate) fn container_dir(state_file: &Path) -> io::Result<PathBuf> {
    let parent = match state_file.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    if parent.is_absolute() {
        Ok(parent)
    } else {
        Ok(std::env::current_dir()?.join(parent))
    }
}

pub(crate) fn path_to_str(path: &Path) -> Result<&str, StoreError> {
    path.to_str()
        .ok_or_else(|| StoreError::NonUtf8Path(path.to_path_buf()))
}

/// Express `path` relative to `base`, walking up with `..` components
/// where the two diverge. Both inputs must be absolute.
pub(crate) fn relative_from(path: &Path, base: &Path) -> PathBuf {
    let path_parts: Vec<Component> = path.components().collect();
    let base_parts: Vec<Component> = base.components().collect();

    let common = path_parts
        .iter()
        .zip(&base_parts)
        .take_while(|(a, b)| a == b)
        .count();

    let mut out = PathBuf::new();
    for _ in common..base_parts.len() {
        out.push("..");
    }
    for part in &path_parts[common..] {
        out.push(part.as_os_str());
    }
    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}

/// Build the three stored representations of one file path: absolute,
/// relative to the user's home directory, relative to the container
/// directory. Falls back to the absolute form when no home directory
/// is known.
pub(crate) fn path_triple(path: &Path, container_dir: &Path) -> Result<PathTriple, StoreError> {
    let abspath = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };

    let relhome = match dirs::home_dir() {
        Some(home) => relative_from(&abspath, &home),
        None => abspath.clone(),
    };
    let relsim = relative_from(&abspath, container_dir);

    Ok(PathTriple {
        abspath: path_to_str(&abspath)?.to_string(),
        relhome: path_to_str(&relhome)?.to_string(),
        relsim: path_to_str(&relsim)?.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_from_descendant() {
        assert_eq!(
            relative_from(Path::new("/data/sims/run1/top.pdb"), Path::new("/data/sims")),
            PathBuf::from("run1/top.pdb")
        );
    }

    #[test]
    fn test_relative_from_sibling() {
        assert_eq!(
            relative_from(Path::new("/data/other/top.pdb"), Path::new("/data/sims/run1")),
            PathBuf::from("../../other/top.pdb")
        );
    }

    #[test]
    fn test_relative_from_same_dir() {
        assert_eq!(
            relative_from(Path::new("/data/sims"), Path::new("/data/sims")),
            PathBuf::from(".")
        );
    }

    #[test]
    fn test_container_dir_of_bare_filename() {
        let dir = container_dir(Path::new("state.carton")).unwrap();
        assert!(dir.is_absolute());
    }

    #[test]
    fn test_container_dir_absolute() {
        let dir = container_dir(Path::new("/data/sims/state.carton")).unwrap();
        assert_eq!(dir, PathBuf::from("/data/sims"));
    }

    #[test]
    fn test_path_triple_relsim() {
        let triple = path_triple(
            Path::new("/data/sims/run1/top.pdb"),
            Path::new("/data/sims/run1"),
        )
        .unwrap();
        assert_eq!(triple.abspath, "/data/sims/run1/top.pdb");
        assert_eq!(triple.relsim, "top.pdb");
    }
}

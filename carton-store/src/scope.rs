//! Access scopes
//!
//! Every public store operation runs inside one of two scopes:
//! - read scope: open read-only, shared lock, run, close
//! - write scope: open append/create, exclusive lock, run, flush, close
//!
//! Release is structural. The descriptor (and with it the advisory
//! lock) is dropped on every exit path, success or failure, so no
//! operation can leave the file open or locked behind it. The mutated
//! table set is flushed only when the operation succeeds; a failed
//! write scope leaves the on-disk file exactly as it found it.

use std::path::Path;

use carton_tables::TableFile;

use crate::error::StoreError;
use crate::lock::{LockedFile, OpenMode};

/// Open `path` read-only under a shared lock and run `op` against the
/// parsed table set.
pub fn read_scope<T, F>(path: &Path, op: F) -> Result<T, StoreError>
where
    F: FnOnce(&TableFile) -> Result<T, StoreError>,
{
    let lock = LockedFile::open(path, OpenMode::Read)?;
    lock.lock_shared()?;
    let session = TableFile::open_reader(lock.duplicate()?)?;
    op(&session)
    // session then lock drop here, releasing the shared lock, on both
    // the value and the error path.
}

/// Open `path` append/create under an exclusive lock, run `op`, and
/// flush the table set back on success.
pub fn write_scope<T, F>(path: &Path, op: F) -> Result<T, StoreError>
where
    F: FnOnce(&mut TableFile) -> Result<T, StoreError>,
{
    let lock = LockedFile::open(path, OpenMode::Append)?;
    lock.lock_exclusive()?;
    let mut session = TableFile::open_writer(lock.duplicate()?)?;
    let out = op(&mut session)?;
    session.flush()?;
    Ok(out)
    // on failure the session is dropped unflushed and the exclusive
    // lock is released with the descriptor.
}

#[cfg(test)]
mod tests {
    use super::*;
    use carton_model::schema::{ColumnSpec, TableSchema};
    use carton_model::TableEngine;
    use tempfile::tempdir;

    const NOTES: TableSchema = TableSchema {
        columns: &[ColumnSpec { name: "note", width: 32 }],
    };

    #[test]
    fn test_write_then_read() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state");

        write_scope(&path, |tf| {
            tf.create_table("notes", &NOTES)?;
            tf.append_row("notes", &["hello"])?;
            Ok(())
        })
        .unwrap();

        let rows = read_scope(&path, |tf| Ok(tf.rows("notes")?)).unwrap();
        assert_eq!(rows, vec![vec!["hello"]]);
    }

    #[test]
    fn test_failed_write_leaves_file_untouched() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state");

        write_scope(&path, |tf| {
            tf.create_table("notes", &NOTES)?;
            tf.append_row("notes", &["original"])?;
            Ok(())
        })
        .unwrap();

        // Mutate in memory, then fail: nothing may reach disk.
        let err = write_scope::<(), _>(&path, |tf| {
            tf.append_row("notes", &["doomed"])?;
            Err(StoreError::Corrupt("forced failure".into()))
        })
        .unwrap_err();
        assert!(matches!(err, StoreError::Corrupt(_)));

        let rows = read_scope(&path, |tf| Ok(tf.rows("notes")?)).unwrap();
        assert_eq!(rows, vec![vec!["original"]]);
    }

    #[test]
    fn test_lock_released_after_failure() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state");

        let _ = write_scope::<(), _>(&path, |_| Err(StoreError::Corrupt("boom".into())));

        // A failed scope must not leave the file locked: a fresh
        // exclusive session succeeds without blocking.
        write_scope(&path, |tf| {
            tf.create_table("notes", &NOTES)?;
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn test_read_scope_missing_file() {
        let dir = tempdir().unwrap();
        let err = read_scope::<(), _>(&dir.path().join("missing"), |_| Ok(())).unwrap_err();
        assert!(matches!(err, StoreError::Io(_)));
    }

    #[test]
    fn test_closure_error_propagates_unchanged() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state");
        write_scope(&path, |tf| {
            tf.create_table("notes", &NOTES)?;
            Ok(())
        })
        .unwrap();

        let err = read_scope::<(), _>(&path, |tf| {
            tf.rows("absent")?;
            Ok(())
        })
        .unwrap_err();
        assert!(matches!(
            err,
            StoreError::Table(carton_tables::TableError::UnknownTable(_))
        ));
    }
}

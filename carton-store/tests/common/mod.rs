#![allow(dead_code)]

use std::path::PathBuf;

use carton_store::{ContainerKind, ContainerOptions, ContainerStore};
use tempfile::TempDir;

/// A container store backed by a temp directory that lives as long as
/// the test does.
pub struct TestContainer {
    pub store: ContainerStore,
    pub path: PathBuf,
    _dir: TempDir,
}

pub fn fresh_container(kind: ContainerKind, opts: ContainerOptions) -> TestContainer {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("state.carton");
    let store = ContainerStore::create(path.clone(), kind, opts).expect("create store");
    TestContainer { store, path, _dir: dir }
}

pub fn sim_path() -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("sim.carton");
    (dir, path)
}

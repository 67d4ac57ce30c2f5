//! Simulation store: universe path tables, ordered selections, and
//! inheritance of the base container operations.

mod common;

use std::collections::BTreeSet;
use std::path::PathBuf;

use carton_store::{ContainerKind, ContainerStore, SimStore, StoreError};
use common::sim_path;

#[test]
fn test_create_builds_extended_schema() {
    let (_dir, path) = sim_path();
    let sim = SimStore::create(&path, Default::default()).unwrap();

    assert_eq!(sim.record().unwrap().kind, ContainerKind::Sim);
    assert!(sim.topology_paths().unwrap().is_empty());
    assert!(sim.trajectory_paths().unwrap().is_empty());
    assert!(sim.selections().unwrap().is_empty());
}

#[test]
fn test_base_operations_inherited() {
    let (_dir, path) = sim_path();
    let sim = SimStore::create(&path, Default::default()).unwrap();

    sim.add_tags(["equilibration"]).unwrap();
    sim.add_categories([("ensemble", "npt")]).unwrap();

    let tags: BTreeSet<String> = sim.tags().unwrap();
    assert!(tags.contains("equilibration"));
    assert_eq!(sim.categories().unwrap()["ensemble"], "npt");
}

#[test]
fn test_universe_paths_roundtrip() {
    let (_dir, path) = sim_path();
    let sim = SimStore::create(&path, Default::default()).unwrap();

    sim.add_universe_paths(
        "/data/systems/protein/top.psf",
        &[
            PathBuf::from("/data/systems/protein/eq1.dcd"),
            PathBuf::from("/data/systems/protein/eq2.dcd"),
        ],
    )
    .unwrap();

    let tops = sim.topology_paths().unwrap();
    assert_eq!(tops.len(), 1);
    assert_eq!(tops[0].abspath, "/data/systems/protein/top.psf");

    let trjs = sim.trajectory_paths().unwrap();
    assert_eq!(trjs.len(), 2);
    assert_eq!(trjs[0].abspath, "/data/systems/protein/eq1.dcd");
    assert_eq!(trjs[1].abspath, "/data/systems/protein/eq2.dcd");
}

#[test]
fn test_universe_path_triples_are_relative_to_container() {
    let (dir, path) = sim_path();
    let sim = SimStore::create(&path, Default::default()).unwrap();

    let topology = dir.path().join("top.psf");
    sim.add_universe_paths(&topology, &[]).unwrap();

    let tops = sim.topology_paths().unwrap();
    assert_eq!(tops[0].relsim, "top.psf");
}

#[test]
fn test_selection_order_preserved() {
    let (_dir, path) = sim_path();
    let sim = SimStore::create(&path, Default::default()).unwrap();

    sim.add_selection("binding-site", &["resid 10", "resid 4", "resid 25"])
        .unwrap();
    assert_eq!(
        sim.selection("binding-site").unwrap(),
        vec!["resid 10", "resid 4", "resid 25"]
    );

    // Appending keeps earlier rows in place.
    sim.add_selection("binding-site", &["name CA"]).unwrap();
    assert_eq!(
        sim.selection("binding-site").unwrap(),
        vec!["resid 10", "resid 4", "resid 25", "name CA"]
    );
}

#[test]
fn test_multiple_named_selections() {
    let (_dir, path) = sim_path();
    let sim = SimStore::create(&path, Default::default()).unwrap();

    sim.add_selection("backbone", &["name CA C N"]).unwrap();
    sim.add_selection("ligand", &["resname LIG"]).unwrap();

    assert_eq!(sim.selections().unwrap(), vec!["backbone", "ligand"]);
    assert_eq!(sim.selection("ligand").unwrap(), vec!["resname LIG"]);
}

#[test]
fn test_del_selection_and_unknown_noop() {
    let (_dir, path) = sim_path();
    let sim = SimStore::create(&path, Default::default()).unwrap();

    sim.add_selection("tmp", &["all"]).unwrap();
    sim.del_selection("tmp").unwrap();
    assert!(sim.selection("tmp").unwrap().is_empty());
    assert!(sim.selections().unwrap().is_empty());

    // Deleting a selection that never existed is a no-op.
    sim.del_selection("never-was").unwrap();
}

#[test]
fn test_reopen_existing_sim() {
    let (_dir, path) = sim_path();
    let created = SimStore::create(&path, Default::default()).unwrap();
    let uuid = created.record().unwrap().uuid;
    created.add_selection("s", &["all"]).unwrap();
    drop(created);

    let reopened = SimStore::open(&path, Default::default()).unwrap();
    assert_eq!(reopened.record().unwrap().uuid, uuid);
    assert_eq!(reopened.selection("s").unwrap(), vec!["all"]);
}

#[test]
fn test_sim_open_rejects_group_file() {
    let (_dir, path) = sim_path();
    ContainerStore::create(&path, ContainerKind::Group, Default::default()).unwrap();

    let err = SimStore::open(&path, Default::default()).unwrap_err();
    assert!(matches!(err, StoreError::KindMismatch { .. }));
}

#[test]
fn test_sim_create_over_existing_fails() {
    let (_dir, path) = sim_path();
    SimStore::create(&path, Default::default()).unwrap();
    let err = SimStore::create(&path, Default::default()).unwrap_err();
    assert!(matches!(err, StoreError::AlreadyExists(_)));
}

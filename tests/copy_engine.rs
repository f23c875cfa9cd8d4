//! Integration tests for the copy engine.
//!
//! These tests run [`copy`] against real directory trees and check the
//! resulting output trees, including the guarantee that a rejected copy
//! writes nothing.
#![allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]

mod common;

use common::WorkspaceBuilder;
use project_tools::copy::{CopySpec, copy};
use project_tools::error::CopyError;
use project_tools::logging::Logger;

fn exts(list: &[&str]) -> Vec<String> {
    list.iter().map(|e| (*e).to_string()).collect()
}

// ---------------------------------------------------------------------------
// Flat mode
// ---------------------------------------------------------------------------

#[test]
fn flat_copy_of_top_level_artifacts() {
    let ws = WorkspaceBuilder::new()
        .with_file("build/app.exe", "app")
        .with_file("build/helper.dll", "helper")
        .with_file("build/readme.md", "docs")
        .with_file("build/sub/nested.dll", "nested")
        .build();
    let spec = CopySpec::extensions(ws.join("build"), exts(&["exe", "dll"]), ws.join("out"));

    let result = copy(&spec, &Logger::new("test")).unwrap();

    assert_eq!(result.len(), 2);
    assert_eq!(ws.files_under("out"), ["app.exe", "helper.dll"]);
    assert_eq!(ws.read("out/app.exe"), "app");
    assert_eq!(ws.read("out/helper.dll"), "helper");
}

#[test]
fn flat_collision_writes_nothing() {
    let ws = WorkspaceBuilder::new()
        .with_file("src/a/util.gcno", "a")
        .with_file("src/b/util.gcno", "b")
        .with_file("src/main.gcno", "main")
        .build();
    let spec = CopySpec::extensions(ws.join("src"), exts(&["gcno"]), ws.join("out")).recursive(true);

    let err = copy(&spec, &Logger::new("test")).unwrap_err();

    assert!(matches!(err, CopyError::NameCollision { ref name, .. } if name == "util.gcno"));
    assert!(!ws.join("out").exists(), "nothing may be written");
}

#[test]
fn existing_destination_writes_nothing() {
    let ws = WorkspaceBuilder::new()
        .with_file("build/a.exe", "new a")
        .with_file("build/b.exe", "new b")
        .with_file("out/b.exe", "old b")
        .build();
    let spec = CopySpec::extensions(ws.join("build"), exts(&["exe"]), ws.join("out"));

    let err = copy(&spec, &Logger::new("test")).unwrap_err();

    assert!(matches!(err, CopyError::DestinationExists(_)));
    assert_eq!(ws.files_under("out"), ["b.exe"]);
    assert_eq!(ws.read("out/b.exe"), "old b");

    let spec = spec.overwrite(true);
    copy(&spec, &Logger::new("test")).unwrap();
    assert_eq!(ws.read("out/b.exe"), "new b");
}

// ---------------------------------------------------------------------------
// Hierarchy-preserving mode
// ---------------------------------------------------------------------------

#[test]
fn keep_paths_mirrors_source_tree() {
    let ws = WorkspaceBuilder::new()
        .with_file("src/core/math.gcno", "math")
        .with_file("src/core/io/file.gcno", "file")
        .with_file("src/util.gcno", "util")
        .with_file("src/util.cpp", "code")
        .build();
    let spec = CopySpec::extensions(ws.join("src"), exts(&["gcno"]), ws.join("meta"))
        .recursive(true)
        .keep_paths(true);

    copy(&spec, &Logger::new("test")).unwrap();

    assert_eq!(
        ws.files_under("meta"),
        ["core/io/file.gcno", "core/math.gcno", "util.gcno"]
    );
    assert_eq!(ws.read("meta/core/io/file.gcno"), "file");
}

#[test]
fn flatten_replaces_separators() {
    let ws = WorkspaceBuilder::new()
        .with_file("src/core/math.gcno", "math")
        .with_file("src/core/io/file.gcno", "file")
        .build();
    let spec = CopySpec::extensions(ws.join("src"), exts(&["gcno"]), ws.join("meta"))
        .recursive(true)
        .keep_paths(true)
        .flatten(true);

    copy(&spec, &Logger::new("test")).unwrap();

    assert_eq!(ws.files_under("meta"), ["core_io_file.gcno", "core_math.gcno"]);
    assert_eq!(ws.read("meta/core_io_file.gcno"), "file");
}

#[test]
fn same_basename_is_fine_with_keep_paths() {
    let ws = WorkspaceBuilder::new()
        .with_file("src/a/util.gcno", "a")
        .with_file("src/b/util.gcno", "b")
        .build();
    let spec = CopySpec::extensions(ws.join("src"), exts(&["gcno"]), ws.join("meta"))
        .recursive(true)
        .keep_paths(true);

    copy(&spec, &Logger::new("test")).unwrap();

    assert_eq!(ws.files_under("meta"), ["a/util.gcno", "b/util.gcno"]);
}

// ---------------------------------------------------------------------------
// Single file and clearing
// ---------------------------------------------------------------------------

#[test]
fn single_file_with_clear() {
    let ws = WorkspaceBuilder::new()
        .with_file("config/settings.json", "{}")
        .with_file("out/stale.txt", "stale")
        .build();
    let spec = CopySpec::file(ws.join("config/settings.json"), ws.join("out")).clear(true);

    copy(&spec, &Logger::new("test")).unwrap();

    assert_eq!(ws.files_under("out"), ["settings.json"]);
}

#[test]
fn missing_single_file_is_not_found() {
    let ws = WorkspaceBuilder::new().with_dir("out").build();
    let spec = CopySpec::file(ws.join("missing.txt"), ws.join("out"));

    let err = copy(&spec, &Logger::new("test")).unwrap_err();

    assert!(matches!(err, CopyError::NotFound(_)));
}

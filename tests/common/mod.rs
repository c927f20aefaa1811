#![allow(dead_code)]

use std::fs;

use tempfile::TempDir;

pub use podrun_test_utils::builders;
pub use podrun_test_utils::{Call, ConfigBuilder, FakeCluster, Failure, Op, init_tracing, with_timeout};

/// A small project tree: a task script and one nested source file.
pub fn project_tree() -> TempDir {
    let dir = tempfile::tempdir().expect("create temp project dir");
    fs::create_dir_all(dir.path().join(".udo/bin")).unwrap();
    fs::write(
        dir.path().join(".udo/bin/full-build-and-run.sh"),
        "#!/bin/sh\nmvn package\n",
    )
    .unwrap();
    fs::create_dir_all(dir.path().join("src/main")).unwrap();
    fs::write(dir.path().join("src/main/App.java"), "class App {}\n").unwrap();
    dir
}

#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use tempfile::{TempDir, tempdir};

pub const SIGNUPS_CSV: &str = "\
name,age,signup_date
Alice,30,2023-01-05
Bob,,2023-01-06
Alice,30,2023-01-05
";

/// Scratch directory holding input files and a staging store for one test.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn store_dir(&self) -> PathBuf {
        self.temp_dir.path().join("stage")
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents.as_bytes())
            .expect("write temp file contents");
        path
    }

    /// `dataglow` binary preconfigured with this workspace's store.
    pub fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin("dataglow").expect("binary exists");
        cmd.arg("--store").arg(self.store_dir());
        cmd
    }
}

/// Builds `header` followed by `rows` generated lines.
pub fn generated_csv(header: &str, rows: usize, line: impl Fn(usize) -> String) -> String {
    let mut text = String::from(header);
    text.push('\n');
    for idx in 0..rows {
        text.push_str(&line(idx));
        text.push('\n');
    }
    text
}

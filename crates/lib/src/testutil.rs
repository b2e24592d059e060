//! Test helpers for running a stand-in build tool.
//!
//! The fake tool is a shell script run through `/bin/sh`, so tests never
//! execute a file they just wrote.

use std::path::Path;

use crate::toolchain::Toolchain;

/// Write `script` into `dir` and return a toolchain that runs it with `dir`
/// as the tool home.
pub fn fake_toolchain(dir: &Path, script: &str) -> Toolchain {
  let path = dir.join("fake-mvn.sh");
  std::fs::write(&path, format!("{script}\n")).unwrap();
  Toolchain::interpreted("/bin/sh", &[], &path, dir)
}

/// A tool that succeeds and leaves `jars` in `target/`.
pub fn producing_toolchain(dir: &Path, jars: &[&str]) -> Toolchain {
  let mut script = String::from("mkdir -p target\n");
  for jar in jars {
    script.push_str(&format!("printf '%s' '{jar}' > 'target/{jar}'\n"));
  }
  fake_toolchain(dir, &script)
}

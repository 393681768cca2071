//! Shared test helpers for CLI integration tests.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use tempfile::TempDir;

pub const HEADER: &str = "#ifndef MSF_GIF_H\n#define MSF_GIF_H\n#endif\n";

/// Get a Command for the xbuild binary.
pub fn xbuild_cmd() -> Command {
  cargo_bin_cmd!("xbuild")
}

/// Get path to a fixture file.
pub fn fixture_path(name: &str) -> PathBuf {
  PathBuf::from(env!("CARGO_MANIFEST_DIR"))
    .join("tests")
    .join("fixtures")
    .join(name)
}

/// Isolated project directory holding a descriptor and the msf_gif header.
pub struct TestEnv {
  pub temp: TempDir,
  pub descriptor: PathBuf,
}

impl TestEnv {
  /// Copy a fixture descriptor into a fresh project directory.
  pub fn from_fixture(name: &str) -> Self {
    let temp = TempDir::new().unwrap();
    let descriptor = temp.path().join("xbuild.json");
    std::fs::copy(fixture_path(name), &descriptor)
      .unwrap_or_else(|e| panic!("Failed to load fixture {}: {}", name, e));

    let env = Self { temp, descriptor };
    env.write_file("msf_gif/msf_gif.h", HEADER);
    env
  }

  pub fn root(&self) -> &Path {
    self.temp.path()
  }

  /// Write a file relative to the project root.
  pub fn write_file(&self, relative_path: &str, content: &str) -> PathBuf {
    let path = self.root().join(relative_path);
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
    path
  }

  /// Command line for a compiler stand-in that creates its `-o` output.
  #[cfg(unix)]
  pub fn fake_cc(&self) -> String {
    let script = self.write_file(
      "tools/fake_cc.sh",
      r#"out=""
while [ $# -gt 0 ]; do
  if [ "$1" = "-o" ]; then out="$2"; shift; fi
  shift
done
: > "$out"
"#,
    );
    format!("/bin/sh {}", script.display())
  }

  /// Command line for a compiler stand-in that always fails.
  #[cfg(unix)]
  pub fn broken_cc(&self) -> String {
    let script = self.write_file("tools/broken_cc.sh", "echo 'msf_gif.c: fatal error' >&2\nexit 1\n");
    format!("/bin/sh {}", script.display())
  }

  /// Command line for an archiver stand-in that writes its arguments to the archive.
  #[cfg(unix)]
  pub fn fake_ar(&self) -> String {
    let script = self.write_file("tools/fake_ar.sh", "echo \"$@\" > \"$2\"\n");
    format!("/bin/sh {}", script.display())
  }

  /// `xbuild build` against this project with the stand-in toolchain.
  #[cfg(unix)]
  pub fn build_cmd(&self, host: &str) -> Command {
    self.build_cmd_with_cc(host, &self.fake_cc())
  }

  /// `xbuild build` with the given compiler and the stand-in archiver.
  #[cfg(unix)]
  pub fn build_cmd_with_cc(&self, host: &str, cc: &str) -> Command {
    let mut cmd = xbuild_cmd();
    cmd
      .arg("build")
      .arg(&self.descriptor)
      .arg("--host")
      .arg(host)
      .arg("--cc")
      .arg(cc)
      .arg("--ar")
      .arg(self.fake_ar())
      .env_remove("XBUILD_HOST")
      .env_remove("XBUILD_JOBS");
    cmd
  }
}

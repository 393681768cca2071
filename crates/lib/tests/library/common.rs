use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tempfile::TempDir;
use xbuild_lib::toolchain::{CompileRequest, Toolchain, ToolchainError};

pub const MSF_GIF: &str = r#"{
  "common": {
    "project": "msf_gif",
    "archs": ["x64"],
    "defines": ["MSF_GIF_IMPL"],
    "copy": { "msf_gif/msf_gif.h": "msf_gif/msf_gif.c" },
    "libraries": { "msf_gif": { "sources": ["msf_gif/msf_gif.c"] } },
    "buildDir": "build",
    "buildOutDir": "libs"
  },
  "platforms": {
    "win32": {
      "windows": {},
      "android": { "archs": ["x86", "x86_64", "armeabi-v7a", "arm64-v8a"] }
    },
    "linux": { "linux": {} },
    "darwin": { "macos": {} }
  }
}"#;

/// Write `descriptor` as `xbuild.json` in a fresh project with the msf_gif header.
pub fn project(descriptor: &str) -> (TempDir, PathBuf) {
  let temp = TempDir::new().unwrap();
  let path = temp.path().join("xbuild.json");
  std::fs::write(&path, descriptor).unwrap();
  write(temp.path(), "msf_gif/msf_gif.h", "#define MSF_GIF_H\n");
  (temp, path)
}

pub fn write(root: &Path, relative: &str, content: &str) {
  let path = root.join(relative);
  std::fs::create_dir_all(path.parent().unwrap()).unwrap();
  std::fs::write(path, content).unwrap();
}

/// Toolchain that checks its sources exist, records the request and writes
/// an empty archive.
#[derive(Default)]
pub struct RecordingToolchain {
  pub requests: Mutex<Vec<CompileRequest>>,
}

impl Toolchain for RecordingToolchain {
  async fn compile(&self, request: CompileRequest) -> Result<PathBuf, ToolchainError> {
    for src in &request.sources {
      tokio::fs::metadata(src).await?;
    }
    tokio::fs::create_dir_all(&request.out_dir).await?;
    let artifact = request.out_dir.join(format!("lib{}.a", request.project_name));
    tokio::fs::write(&artifact, b"!<arch>\n").await?;

    self.requests.lock().unwrap().push(request);
    Ok(artifact)
  }
}

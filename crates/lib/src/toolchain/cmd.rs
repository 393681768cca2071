//! Toolchain backed by a C compiler and archiver on the command line.
//!
//! Each source is compiled to an object with `<cc> -c`, then the objects are
//! packed into `lib<project>.a` with `<ar> rcs`. Commands inherit the caller's
//! environment plus a fixed locale and `SOURCE_DATE_EPOCH`, so repeated runs
//! produce the same archive.

use std::path::{Path, PathBuf};

use tokio::process::Command;
use tracing::{debug, info};

use super::{CompileRequest, Toolchain, ToolchainError};
use crate::consts::SOURCE_DATE_EPOCH;

/// Compiler and archiver command lines.
///
/// Each is a program followed by leading arguments, so launchers such as
/// `ccache cc` work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandToolchain {
  pub compiler: Vec<String>,
  pub archiver: Vec<String>,
}

impl Default for CommandToolchain {
  fn default() -> Self {
    Self::new("cc", "ar")
  }
}

impl CommandToolchain {
  /// Build from whitespace-separated command lines.
  pub fn new(compiler: &str, archiver: &str) -> Self {
    let split = |s: &str| s.split_whitespace().map(str::to_string).collect();
    Self {
      compiler: split(compiler),
      archiver: split(archiver),
    }
  }

  /// File name of the archive produced for `project`.
  pub fn archive_name(project: &str) -> String {
    format!("lib{project}.a")
  }
}

/// Object file for the `idx`-th source. The index keeps sources with equal
/// stems apart.
fn object_path(obj_dir: &Path, idx: usize, src: &Path) -> PathBuf {
  let stem = src.file_stem().map(|s| s.to_string_lossy()).unwrap_or_default();
  obj_dir.join(format!("{idx}_{stem}.o"))
}

/// Arguments passed to the compiler for one source.
fn compile_args(request: &CompileRequest, src: &Path, obj: &Path) -> Vec<String> {
  let mut args = vec![
    "-c".to_string(),
    src.display().to_string(),
    "-o".to_string(),
    obj.display().to_string(),
  ];
  args.extend(request.defines.iter().map(|d| format!("-D{d}")));
  args.extend(request.include_dirs.iter().map(|dir| format!("-I{}", dir.display())));
  args.extend(request.flags.iter().cloned());
  args
}

/// Run `command_line` plus `args` in `work_dir`, failing on a non-zero exit.
async fn run(command_line: &[String], args: &[String], work_dir: &Path) -> Result<(), ToolchainError> {
  let (program, leading) = command_line.split_first().ok_or_else(|| ToolchainError::Spawn {
    program: String::new(),
    source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "empty command line"),
  })?;

  debug!(program = %program, args = ?args, "spawning process");

  let output = Command::new(program)
    .args(leading)
    .args(args)
    .current_dir(work_dir)
    .env("LANG", "C")
    .env("LC_ALL", "C")
    .env("SOURCE_DATE_EPOCH", SOURCE_DATE_EPOCH)
    .kill_on_drop(true)
    .output()
    .await
    .map_err(|source| ToolchainError::Spawn {
      program: program.clone(),
      source,
    })?;

  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    let stdout = String::from_utf8_lossy(&output.stdout);
    if !stdout.is_empty() {
      debug!(stdout = %stdout, "command stdout");
    }

    return Err(ToolchainError::CommandFailed {
      program: program.clone(),
      code: output.status.code(),
      stderr,
    });
  }

  Ok(())
}

impl Toolchain for CommandToolchain {
  async fn compile(&self, request: CompileRequest) -> Result<PathBuf, ToolchainError> {
    if request.sources.is_empty() {
      return Err(ToolchainError::NoSources(request.unit.clone()));
    }

    tokio::fs::create_dir_all(&request.obj_dir).await?;
    tokio::fs::create_dir_all(&request.out_dir).await?;

    let mut objects = Vec::with_capacity(request.sources.len());
    for (idx, src) in request.sources.iter().enumerate() {
      let obj = object_path(&request.obj_dir, idx, src);
      run(&self.compiler, &compile_args(&request, src, &obj), &request.work_dir).await?;
      objects.push(obj);
    }

    let archive = request.out_dir.join(Self::archive_name(&request.project_name));
    // `ar r` keeps members of an existing archive; start from scratch.
    if tokio::fs::try_exists(&archive).await? {
      tokio::fs::remove_file(&archive).await?;
    }

    let mut ar_args = vec!["rcs".to_string(), archive.display().to_string()];
    ar_args.extend(objects.iter().map(|o| o.display().to_string()));
    run(&self.archiver, &ar_args, &request.work_dir).await?;

    info!(unit = %request.unit, artifact = %archive.display(), "archived");
    Ok(archive)
  }
}

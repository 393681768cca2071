//! The compiler seam.
//!
//! The executor drives compilation through the [`Toolchain`] trait and never
//! spawns a compiler itself. [`CommandToolchain`] is the stock implementation;
//! tests and embedders can supply their own.

pub mod cmd;

use std::future::Future;
use std::io;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::matrix::{BuildUnit, UnitId};

pub use cmd::CommandToolchain;

/// Errors reported by a toolchain.
#[derive(Debug, Error)]
pub enum ToolchainError {
  #[error("failed to spawn {program}: {source}")]
  Spawn {
    program: String,
    #[source]
    source: io::Error,
  },

  #[error("{program} failed with exit code {code:?}: {stderr}")]
  CommandFailed {
    program: String,
    code: Option<i32>,
    stderr: String,
  },

  #[error("unit {0} has no sources to compile")]
  NoSources(UnitId),

  #[error("io error: {0}")]
  Io(#[from] io::Error),
}

/// Everything a toolchain needs to build one unit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompileRequest {
  pub unit: UnitId,
  pub project_name: String,
  /// Directory commands run in.
  pub work_dir: PathBuf,
  pub sources: Vec<PathBuf>,
  /// Descriptor defines, then `NAME=VALUE` per variable, then `NAME=1|0` per option.
  pub defines: Vec<String>,
  pub flags: Vec<String>,
  pub include_dirs: Vec<PathBuf>,
  pub obj_dir: PathBuf,
  pub out_dir: PathBuf,
}

impl CompileRequest {
  pub fn from_unit(unit: &BuildUnit) -> Self {
    let defines = unit
      .defines
      .iter()
      .cloned()
      .chain(unit.variables.iter().map(|v| format!("{}={}", v.name, v.value)))
      .chain(
        unit
          .options
          .iter()
          .map(|o| format!("{}={}", o.name, if o.value { 1 } else { 0 })),
      )
      .collect();

    Self {
      unit: unit.id.clone(),
      project_name: unit.project_name.clone(),
      work_dir: unit.root.clone(),
      sources: unit.sources.clone(),
      defines,
      flags: unit.flags.clone(),
      include_dirs: unit.include_dirs.clone(),
      obj_dir: unit.obj_dir.clone(),
      out_dir: unit.out_dir.clone(),
    }
  }
}

/// Compiles the sources of a request into an artifact inside `out_dir`.
pub trait Toolchain: Send + Sync + 'static {
  /// Returns the path of the produced artifact.
  fn compile(&self, request: CompileRequest) -> impl Future<Output = Result<PathBuf, ToolchainError>> + Send;
}

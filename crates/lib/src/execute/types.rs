//! Types for unit execution.
//!
//! This module defines the per-unit error taxonomy, the execution report and
//! the configuration for running a set of build units.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

use crate::matrix::UnitId;
use crate::stage::StagingError;
use crate::toolchain::ToolchainError;

/// The phase of a unit that was running when a timeout hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
  Staging,
  Compile,
}

impl fmt::Display for Phase {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Phase::Staging => write!(f, "staging"),
      Phase::Compile => write!(f, "compile"),
    }
  }
}

/// Errors that fail a single unit without affecting its siblings.
#[derive(Debug, Error)]
pub enum UnitError {
  #[error("source not found: {}", .0.display())]
  SourceNotFound(PathBuf),

  #[error(
    "destination {} is staged from conflicting sources: {}",
    .dest.display(),
    .sources.iter().map(|s| s.display().to_string()).collect::<Vec<_>>().join(", ")
  )]
  DestinationConflict { dest: PathBuf, sources: Vec<PathBuf> },

  #[error("toolchain error: {0}")]
  Toolchain(#[from] ToolchainError),

  #[error("{phase} timed out after {after:?}")]
  Timeout { phase: Phase, after: Duration },

  #[error("io error while staging {}: {source}", .path.display())]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  /// The unit's task died or the worker pool shut down.
  #[error("internal error: {0}")]
  Internal(String),
}

impl UnitError {
  /// Stable snake_case name of the error kind, for reports.
  pub fn kind(&self) -> &'static str {
    match self {
      UnitError::SourceNotFound(_) => "source_not_found",
      UnitError::DestinationConflict { .. } => "destination_conflict",
      UnitError::Toolchain(_) => "toolchain",
      UnitError::Timeout { .. } => "timeout",
      UnitError::Io { .. } => "io",
      UnitError::Internal(_) => "internal",
    }
  }
}

impl From<StagingError> for UnitError {
  fn from(err: StagingError) -> Self {
    match err {
      StagingError::SourceNotFound(path) => UnitError::SourceNotFound(path),
      StagingError::DestinationConflict { dest, sources } => UnitError::DestinationConflict { dest, sources },
      StagingError::Io { path, source } => UnitError::Io { path, source },
      cancelled @ StagingError::Cancelled(_) => UnitError::Internal(cancelled.to_string()),
    }
  }
}

/// How a unit ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum UnitOutcome {
  Succeeded { artifact: PathBuf },
  Failed { kind: String, message: String },
}

impl UnitOutcome {
  pub fn from_result(result: Result<PathBuf, UnitError>) -> Self {
    match result {
      Ok(artifact) => UnitOutcome::Succeeded { artifact },
      Err(err) => UnitOutcome::Failed {
        kind: err.kind().to_string(),
        message: err.to_string(),
      },
    }
  }
}

/// Result of one unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitReport {
  pub id: UnitId,
  #[serde(flatten)]
  pub outcome: UnitOutcome,
  pub duration_ms: u64,
}

impl UnitReport {
  pub fn is_success(&self) -> bool {
    matches!(self.outcome, UnitOutcome::Succeeded { .. })
  }
}

/// Result of executing every unit, in the order the units were given.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExecutionReport {
  pub units: Vec<UnitReport>,
}

impl ExecutionReport {
  /// Returns true if every unit succeeded.
  pub fn is_success(&self) -> bool {
    self.units.iter().all(UnitReport::is_success)
  }

  pub fn succeeded(&self) -> impl Iterator<Item = &UnitReport> {
    self.units.iter().filter(|u| u.is_success())
  }

  pub fn failed(&self) -> impl Iterator<Item = &UnitReport> {
    self.units.iter().filter(|u| !u.is_success())
  }

  /// Returns the total number of units processed.
  pub fn total(&self) -> usize {
    self.units.len()
  }
}

/// Configuration for unit execution.
#[derive(Debug, Clone, Copy)]
pub struct ExecuteConfig {
  /// Maximum number of units running at once.
  pub parallelism: usize,

  /// Upper bound on staging one unit.
  pub stage_timeout: Duration,

  /// Upper bound on compiling one unit.
  pub compile_timeout: Duration,
}

impl Default for ExecuteConfig {
  fn default() -> Self {
    Self {
      parallelism: num_cpus(),
      stage_timeout: Duration::from_secs(60),
      compile_timeout: Duration::from_secs(30 * 60),
    }
  }
}

/// Get the number of CPUs for default parallelism.
fn num_cpus() -> usize {
  std::thread::available_parallelism().map(|p| p.get()).unwrap_or(4)
}

//! File staging performed before a unit is compiled.
//!
//! Staging is idempotent: a destination whose content already matches its
//! source is left alone, and anything else (missing, stale or torn by an
//! earlier interrupted run) is replaced atomically through a sibling
//! temporary file.
//!
//! Staging runs on a blocking thread. A caller that stops waiting raises the
//! unit's cancellation flag; a copy still in flight then finishes reading
//! but is discarded before it replaces its destination.

use std::collections::{BTreeSet, HashMap};
use std::fs::{self, File};
use std::io::{self, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;
use tracing::{debug, info};

use crate::consts::APP_NAME;
use crate::matrix::{BuildUnit, CopyOp};
use crate::util::hash::{hash_file, hash_reader};

/// Errors raised while staging a unit.
#[derive(Debug, Error)]
pub enum StagingError {
  /// A copy source or unit source does not exist.
  #[error("source not found: {}", .0.display())]
  SourceNotFound(PathBuf),

  /// Units of one plan stage different sources to one destination.
  #[error(
    "destination {} is staged from conflicting sources: {}",
    .dest.display(),
    .sources.iter().map(|s| s.display().to_string()).collect::<Vec<_>>().join(", ")
  )]
  DestinationConflict { dest: PathBuf, sources: Vec<PathBuf> },

  /// The caller gave up on the unit before its copies were committed.
  #[error("staging of {} cancelled", .0.display())]
  Cancelled(PathBuf),

  #[error("failed to stage {}: {source}", .path.display())]
  Io {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
}

fn io_err(path: &Path) -> impl Fn(io::Error) -> StagingError + '_ {
  move |source| StagingError::Io {
    path: path.to_path_buf(),
    source,
  }
}

/// Outcome of staging one unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StageSummary {
  /// Destinations written.
  pub copied: usize,
  /// Destinations already byte-identical to their source.
  pub unchanged: usize,
}

/// Stages copy operations for a fixed set of units.
///
/// Construction indexes every destination that the units would fill from
/// more than one source; staging such a unit fails with
/// [`StagingError::DestinationConflict`] before anything is written.
/// Destinations live under the project root, so units conflict whatever
/// their build directories are.
#[derive(Debug, Clone, Default)]
pub struct Stager {
  conflicts: HashMap<PathBuf, Vec<PathBuf>>,
}

impl Stager {
  pub fn new(units: &[BuildUnit]) -> Self {
    let mut sources_by_dest: HashMap<PathBuf, BTreeSet<PathBuf>> = HashMap::new();

    for unit in units {
      for op in &unit.copy_ops {
        sources_by_dest
          .entry(op.dest.clone())
          .or_default()
          .insert(op.src.clone());
      }
    }

    let conflicts = sources_by_dest
      .into_iter()
      .filter(|(_, sources)| sources.len() > 1)
      .map(|(key, sources)| (key, sources.into_iter().collect()))
      .collect();

    Self { conflicts }
  }

  /// Stage every copy operation of `unit`.
  ///
  /// On success each destination exists and is byte-identical to its source.
  pub fn stage(&self, unit: &BuildUnit) -> Result<StageSummary, StagingError> {
    self.stage_cancellable(unit, &AtomicBool::new(false))
  }

  /// Like [`Stager::stage`], but stops with [`StagingError::Cancelled`] once
  /// `cancelled` is raised. No destination is replaced after that point.
  pub fn stage_cancellable(&self, unit: &BuildUnit, cancelled: &AtomicBool) -> Result<StageSummary, StagingError> {
    for op in &unit.copy_ops {
      if let Some(sources) = self.conflicts.get(&op.dest) {
        return Err(StagingError::DestinationConflict {
          dest: op.dest.clone(),
          sources: sources.clone(),
        });
      }
    }

    let mut summary = StageSummary::default();
    for op in &unit.copy_ops {
      if stage_file(op, cancelled)? {
        summary.copied += 1;
      } else {
        summary.unchanged += 1;
      }
    }

    info!(
      unit = %unit.id,
      copied = summary.copied,
      unchanged = summary.unchanged,
      "staged unit"
    );
    Ok(summary)
  }
}

/// Copy `op.src` to `op.dest`. Returns `false` if the destination was
/// already current.
pub fn stage_file(op: &CopyOp, cancelled: &AtomicBool) -> Result<bool, StagingError> {
  if cancelled.load(Ordering::SeqCst) {
    return Err(StagingError::Cancelled(op.dest.clone()));
  }

  let mut src = File::open(&op.src).map_err(|e| match e.kind() {
    io::ErrorKind::NotFound => StagingError::SourceNotFound(op.src.clone()),
    _ => io_err(&op.src)(e),
  })?;

  if op.dest.is_file() {
    let src_hash = hash_reader(&mut src).map_err(io_err(&op.src))?;
    // An unreadable destination is simply rewritten.
    if hash_file(&op.dest).is_ok_and(|dest_hash| dest_hash == src_hash) {
      debug!(dest = %op.dest.display(), "already staged");
      return Ok(false);
    }
    src.seek(SeekFrom::Start(0)).map_err(io_err(&op.src))?;
  }

  let parent = op
    .dest
    .parent()
    .filter(|p| !p.as_os_str().is_empty())
    .unwrap_or(Path::new("."));
  fs::create_dir_all(parent).map_err(io_err(parent))?;

  let mut tmp = tempfile::Builder::new()
    .prefix(&format!(".{APP_NAME}-"))
    .tempfile_in(parent)
    .map_err(io_err(parent))?;
  io::copy(&mut src, tmp.as_file_mut()).map_err(io_err(&op.dest))?;

  let permissions = src.metadata().map_err(io_err(&op.src))?.permissions();
  fs::set_permissions(tmp.path(), permissions).map_err(io_err(&op.dest))?;

  if cancelled.load(Ordering::SeqCst) {
    return Err(StagingError::Cancelled(op.dest.clone()));
  }
  tmp.persist(&op.dest).map_err(|e| io_err(&op.dest)(e.error))?;

  debug!(src = %op.src.display(), dest = %op.dest.display(), "staged file");
  Ok(true)
}

/// Check that every source of `unit` exists once staging is done.
pub fn verify_sources(unit: &BuildUnit) -> Result<(), StagingError> {
  match unit.sources.iter().find(|src| !src.is_file()) {
    Some(missing) => Err(StagingError::SourceNotFound(missing.clone())),
    None => Ok(()),
  }
}

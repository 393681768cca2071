//! Build unit execution.
//!
//! This module drives every unit through staging and compilation:
//! - Units run concurrently on a bounded worker pool
//! - Within a unit, staging completes before the toolchain is invoked
//! - A failing or timed-out unit never stops its siblings
//! - The report lists units in their original order

pub mod types;

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::timeout;
use tracing::{debug, error, info};

use crate::matrix::BuildUnit;
use crate::stage::{Stager, verify_sources};
use crate::toolchain::{CompileRequest, Toolchain};

pub use types::{ExecuteConfig, ExecutionReport, Phase, UnitError, UnitOutcome, UnitReport};

/// Execute all units and collect an [`ExecutionReport`].
///
/// Each unit is staged (blocking, bounded by `stage_timeout`), then handed
/// to `toolchain` (bounded by `compile_timeout`). At most
/// `config.parallelism` units are in flight at once.
pub async fn execute<T: Toolchain>(units: Vec<BuildUnit>, toolchain: Arc<T>, config: &ExecuteConfig) -> ExecutionReport {
  info!(
    units = units.len(),
    parallelism = config.parallelism,
    "starting unit execution"
  );

  let stager = Arc::new(Stager::new(&units));
  let semaphore = Arc::new(Semaphore::new(config.parallelism.max(1)));
  let mut join_set = JoinSet::new();

  let units: Vec<Arc<BuildUnit>> = units.into_iter().map(Arc::new).collect();

  for (idx, unit) in units.iter().enumerate() {
    let unit = unit.clone();
    let toolchain = toolchain.clone();
    let stager = stager.clone();
    let semaphore = semaphore.clone();
    let config = *config;

    join_set.spawn(async move {
      let Ok(_permit) = semaphore.acquire().await else {
        return (idx, Err(UnitError::Internal("worker pool closed".to_string())), 0);
      };

      let started = Instant::now();
      let result = run_unit(unit, stager, toolchain.as_ref(), &config).await;
      (idx, result, started.elapsed().as_millis() as u64)
    });
  }

  let mut slots: Vec<Option<UnitReport>> = vec![None; units.len()];

  while let Some(joined) = join_set.join_next().await {
    match joined {
      Ok((idx, result, duration_ms)) => {
        let unit = &units[idx];
        match &result {
          Ok(artifact) => info!(unit = %unit.id, artifact = %artifact.display(), "unit succeeded"),
          Err(e) => error!(unit = %unit.id, kind = e.kind(), error = %e, "unit failed"),
        }
        slots[idx] = Some(UnitReport {
          id: unit.id.clone(),
          outcome: UnitOutcome::from_result(result),
          duration_ms,
        });
      }
      Err(e) => {
        error!(error = %e, "unit task panicked");
      }
    }
  }

  // Slots still empty belong to tasks that panicked.
  let report = ExecutionReport {
    units: slots
      .into_iter()
      .zip(&units)
      .map(|(slot, unit)| {
        slot.unwrap_or_else(|| UnitReport {
          id: unit.id.clone(),
          outcome: UnitOutcome::from_result(Err(UnitError::Internal("unit task panicked".to_string()))),
          duration_ms: 0,
        })
      })
      .collect(),
  };

  info!(
    succeeded = report.succeeded().count(),
    failed = report.failed().count(),
    "unit execution complete"
  );

  report
}

/// Stage then compile one unit.
async fn run_unit<T: Toolchain>(
  unit: Arc<BuildUnit>,
  stager: Arc<Stager>,
  toolchain: &T,
  config: &ExecuteConfig,
) -> Result<PathBuf, UnitError> {
  debug!(unit = %unit.id, "staging");

  // A blocking copy cannot be aborted; the flag keeps it from committing
  // anything once the unit has timed out.
  let cancelled = Arc::new(AtomicBool::new(false));
  let staging = tokio::task::spawn_blocking({
    let unit = unit.clone();
    let cancelled = cancelled.clone();
    move || {
      stager.stage_cancellable(&unit, &cancelled)?;
      verify_sources(&unit)
    }
  });

  match timeout(config.stage_timeout, staging).await {
    Err(_) => {
      cancelled.store(true, Ordering::SeqCst);
      return Err(UnitError::Timeout {
        phase: Phase::Staging,
        after: config.stage_timeout,
      });
    }
    Ok(Err(join_err)) => return Err(UnitError::Internal(format!("staging task failed: {join_err}"))),
    Ok(Ok(staged)) => staged?,
  }

  debug!(unit = %unit.id, "compiling");

  let request = CompileRequest::from_unit(&unit);
  match timeout(config.compile_timeout, toolchain.compile(request)).await {
    Err(_) => Err(UnitError::Timeout {
      phase: Phase::Compile,
      after: config.compile_timeout,
    }),
    Ok(compiled) => Ok(compiled?),
  }
}

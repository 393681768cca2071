//! Implementation of the `xbuild build` command.
//!
//! Resolves the descriptor for the host, then stages and compiles every unit.
//! Prints one line per unit followed by a machine-parsable summary.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use xbuild_lib::descriptor::BuildDescriptor;
use xbuild_lib::execute::{ExecuteConfig, ExecutionReport, UnitOutcome, execute};
use xbuild_lib::matrix::plan_units;
use xbuild_lib::toolchain::CommandToolchain;

use super::select_host;
use crate::output::{OutputFormat, format_duration, print_failure, print_json, print_success, summary_line, symbols};

#[derive(Serialize)]
struct BuildOutput<'a> {
  host: &'a str,
  success: bool,
  #[serde(flatten)]
  report: &'a ExecutionReport,
}

/// Execute the build command.
///
/// Returns `Ok(false)` when at least one unit failed. Resolution errors are
/// returned as `Err` before any unit runs.
pub fn cmd_build(
  path: &Path,
  host: Option<&str>,
  config: ExecuteConfig,
  toolchain: CommandToolchain,
  format: OutputFormat,
) -> Result<bool> {
  let descriptor =
    BuildDescriptor::load(path).with_context(|| format!("Failed to load descriptor: {}", path.display()))?;
  let host = select_host(host)?;

  let units = plan_units(&descriptor, &host).context("Failed to resolve descriptor")?;
  info!(host = %host, units = units.len(), "building");

  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let report = rt.block_on(execute(units, Arc::new(toolchain), &config));

  if format.is_json() {
    print_json(&BuildOutput {
      host: &host,
      success: report.is_success(),
      report: &report,
    })?;
    return Ok(report.is_success());
  }

  for unit in &report.units {
    let elapsed = format_duration(Duration::from_millis(unit.duration_ms));
    match &unit.outcome {
      UnitOutcome::Succeeded { artifact } => {
        print_success(&format!(
          "{} {} {} ({})",
          unit.id,
          symbols::ARROW,
          artifact.display(),
          elapsed
        ));
      }
      UnitOutcome::Failed { kind, message } => {
        print_failure(&format!("{} [{}] {}", unit.id, kind, message));
      }
    }
  }

  let status = if report.is_success() { "success" } else { "failure" };
  println!(
    "{}",
    summary_line(&[
      ("host", host.clone()),
      ("units", report.total().to_string()),
      ("succeeded", report.succeeded().count().to_string()),
      ("failed", report.failed().count().to_string()),
      ("status", status.to_string()),
    ])
  );

  Ok(report.is_success())
}

//! Implementation of the `xbuild plan` command.
//!
//! Resolves the descriptor for the host and prints the resulting build
//! units without staging or compiling anything.

use std::collections::BTreeSet;
use std::path::Path;

use anyhow::{Context, Result};

use xbuild_lib::descriptor::BuildDescriptor;
use xbuild_lib::matrix::plan_units;

use super::select_host;
use crate::output::{OutputFormat, print_info, print_json, print_stat, summary_line};

pub fn cmd_plan(path: &Path, host: Option<&str>, format: OutputFormat) -> Result<()> {
  let descriptor =
    BuildDescriptor::load(path).with_context(|| format!("Failed to load descriptor: {}", path.display()))?;
  let host = select_host(host)?;

  let units = plan_units(&descriptor, &host).context("Failed to resolve descriptor")?;

  if format.is_json() {
    return print_json(&units);
  }

  for unit in &units {
    print_info(&unit.id.to_string());
    print_stat("defines", &unit.defines.join(" "));
    print_stat("sources", &unit.sources.len().to_string());
    print_stat("copies", &unit.copy_ops.len().to_string());
    print_stat("flags", &unit.flags.join(" "));
    print_stat("out", &unit.out_dir.display().to_string());
  }

  let targets: BTreeSet<_> = units.iter().map(|u| u.id.target.as_str()).collect();
  println!(
    "{}",
    summary_line(&[
      ("host", host.clone()),
      ("targets", targets.len().to_string()),
      ("units", units.len().to_string()),
    ])
  );

  Ok(())
}

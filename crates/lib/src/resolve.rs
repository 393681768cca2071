//! Merge resolution of common settings with per-target overrides.
//!
//! Merging is field-level and override-wins: a field present in a
//! [`TargetOverride`] replaces the common value entirely (lists and maps
//! included, never element-wise), and an absent field inherits the common
//! value unchanged.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::descriptor::{BuildDescriptor, CommonConfig, TargetOverride};

/// Errors that abort an invocation before any unit executes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
  /// The host has no entry under `platforms`.
  #[error("unknown host '{host}' (descriptor declares: {})", .known.join(", "))]
  UnknownHost { host: String, known: Vec<String> },

  /// Neither common nor the target override supplies any arch.
  #[error("target '{host}/{target}' resolves to an empty arch list")]
  EmptyArchList { host: String, target: String },

  /// A library declares no sources.
  #[error("library '{library}' of target '{host}/{target}' has no sources")]
  EmptyLibrary {
    host: String,
    target: String,
    library: String,
  },

  /// Two copy sources write the same destination.
  #[error("target '{host}/{target}' copies {} onto the same destination '{dest}'", .sources.join(" and "))]
  DuplicateCopyDestination {
    host: String,
    target: String,
    dest: String,
    sources: Vec<String>,
  },
}

/// A fully merged configuration for one (host, target) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedTargetPlan {
  pub host: String,
  pub target: String,
  /// Directory relative paths resolve against.
  pub root: PathBuf,
  pub config: CommonConfig,
}

fn pick<T: Clone>(value: &Option<T>, inherited: &T) -> T {
  value.as_ref().unwrap_or(inherited).clone()
}

/// Apply `over` onto `common`, field by field.
pub fn merge(common: &CommonConfig, over: &TargetOverride) -> CommonConfig {
  CommonConfig {
    project_name: pick(&over.project_name, &common.project_name),
    archs: pick(&over.archs, &common.archs),
    variables: pick(&over.variables, &common.variables),
    defines: pick(&over.defines, &common.defines),
    options: pick(&over.options, &common.options),
    copy: pick(&over.copy, &common.copy),
    subdirectories: pick(&over.subdirectories, &common.subdirectories),
    libraries: pick(&over.libraries, &common.libraries),
    build_dir: pick(&over.build_dir, &common.build_dir),
    build_out_dir: pick(&over.build_out_dir, &common.build_out_dir),
    build_flags: pick(&over.build_flags, &common.build_flags),
  }
}

/// Resolve every target declared for `host`, ordered by target name.
///
/// Entries for other hosts are ignored. Fails with
/// [`ResolveError::UnknownHost`] if `host` has no entry, or with a
/// validation error if any merged plan is malformed.
pub fn resolve(descriptor: &BuildDescriptor, host: &str) -> Result<Vec<ResolvedTargetPlan>, ResolveError> {
  let targets = descriptor
    .platforms
    .get(host)
    .ok_or_else(|| ResolveError::UnknownHost {
      host: host.to_string(),
      known: descriptor.hosts().map(str::to_string).collect(),
    })?;

  info!(host, targets = targets.len(), "resolving targets");

  let mut plans = Vec::with_capacity(targets.len());
  for (target, over) in targets {
    let plan = ResolvedTargetPlan {
      host: host.to_string(),
      target: target.clone(),
      root: descriptor.root.clone(),
      config: merge(&descriptor.common, over),
    };
    plan.validate()?;
    debug!(host, target = %target, archs = ?plan.config.archs, "resolved target");
    plans.push(plan);
  }

  Ok(plans)
}

impl ResolvedTargetPlan {
  /// Check the invariants a plan must satisfy before expansion.
  pub fn validate(&self) -> Result<(), ResolveError> {
    if self.config.archs.is_empty() {
      return Err(ResolveError::EmptyArchList {
        host: self.host.clone(),
        target: self.target.clone(),
      });
    }

    for (library, spec) in &self.config.libraries {
      if spec.sources.is_empty() {
        return Err(ResolveError::EmptyLibrary {
          host: self.host.clone(),
          target: self.target.clone(),
          library: library.clone(),
        });
      }
    }

    let mut by_dest: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for (src, dest) in &self.config.copy {
      by_dest.entry(dest.as_str()).or_default().push(src.as_str());
    }
    if let Some((dest, sources)) = by_dest.into_iter().find(|(_, sources)| sources.len() > 1) {
      return Err(ResolveError::DuplicateCopyDestination {
        host: self.host.clone(),
        target: self.target.clone(),
        dest: dest.to_string(),
        sources: sources.into_iter().map(str::to_string).collect(),
      });
    }

    Ok(())
  }
}

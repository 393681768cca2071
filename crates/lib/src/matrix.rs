//! Expansion of resolved plans into per-arch build units.

use std::collections::HashSet;
use std::fmt;
use std::hash::Hash;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::descriptor::{BuildDescriptor, BuildOption, Variable};
use crate::resolve::{ResolveError, ResolvedTargetPlan, resolve};

/// Identity of a build unit: one (host, target, arch) triple.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UnitId {
  pub host: String,
  pub target: String,
  pub arch: String,
}

impl fmt::Display for UnitId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}/{}/{}", self.host, self.target, self.arch)
  }
}

/// A single file staging operation with root-resolved paths.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CopyOp {
  pub src: PathBuf,
  pub dest: PathBuf,
}

/// The smallest independently executable piece of work.
///
/// Every field except `id.arch` (and the arch-specific directories derived
/// from it) is shared verbatim by the units of one plan. Units are built once
/// by [`expand`] and only read afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildUnit {
  pub id: UnitId,
  pub project_name: String,
  pub root: PathBuf,
  pub defines: Vec<String>,
  pub variables: Vec<Variable>,
  pub options: Vec<BuildOption>,
  /// Sources flattened across libraries, each listed once.
  pub sources: Vec<PathBuf>,
  /// The project root followed by declared subdirectories.
  pub include_dirs: Vec<PathBuf>,
  pub copy_ops: Vec<CopyOp>,
  /// `<root>/<buildDir>`, shared by every unit using the same build dir.
  pub build_dir: PathBuf,
  /// `<buildDir>/<host>/<target>/<arch>`, for intermediate objects.
  pub obj_dir: PathBuf,
  /// `<buildOutDir>/<host>/<target>/<arch>`, for the final artifact.
  pub out_dir: PathBuf,
  pub flags: Vec<String>,
}

/// Keep the first occurrence of each item, preserving order.
fn dedup_ordered<T: Eq + Hash + Clone>(items: impl IntoIterator<Item = T>) -> Vec<T> {
  let mut seen = HashSet::new();
  items.into_iter().filter(|item| seen.insert(item.clone())).collect()
}

/// Expand a plan into one unit per arch, in the order the archs are listed.
///
/// Repeated archs collapse into a single unit.
pub fn expand(plan: &ResolvedTargetPlan) -> Result<Vec<BuildUnit>, ResolveError> {
  let config = &plan.config;

  if config.archs.is_empty() {
    return Err(ResolveError::EmptyArchList {
      host: plan.host.clone(),
      target: plan.target.clone(),
    });
  }

  let archs = dedup_ordered(config.archs.iter().cloned());
  if archs.len() != config.archs.len() {
    warn!(
      host = %plan.host,
      target = %plan.target,
      archs = ?config.archs,
      "duplicate archs ignored"
    );
  }

  let root = &plan.root;
  let sources = dedup_ordered(
    config
      .libraries
      .values()
      .flat_map(|lib| lib.sources.iter())
      .map(|src| root.join(src)),
  );
  let include_dirs = dedup_ordered(
    std::iter::once(root.clone()).chain(config.subdirectories.iter().map(|dir| root.join(dir))),
  );
  let copy_ops: Vec<CopyOp> = config
    .copy
    .iter()
    .map(|(src, dest)| CopyOp {
      src: root.join(src),
      dest: root.join(dest),
    })
    .collect();
  let defines = dedup_ordered(config.defines.iter().cloned());
  let build_dir = root.join(&config.build_dir);
  let out_base = root.join(&config.build_out_dir);

  let units = archs
    .into_iter()
    .map(|arch| BuildUnit {
      obj_dir: build_dir.join(&plan.host).join(&plan.target).join(&arch),
      out_dir: out_base.join(&plan.host).join(&plan.target).join(&arch),
      id: UnitId {
        host: plan.host.clone(),
        target: plan.target.clone(),
        arch,
      },
      project_name: config.project_name.clone(),
      root: root.clone(),
      defines: defines.clone(),
      variables: config.variables.clone(),
      options: config.options.clone(),
      sources: sources.clone(),
      include_dirs: include_dirs.clone(),
      copy_ops: copy_ops.clone(),
      build_dir: build_dir.clone(),
      flags: config.build_flags.clone(),
    })
    .collect();

  Ok(units)
}

/// Resolve every target for `host` and expand each into units.
///
/// Any resolution-phase error aborts the whole plan.
pub fn plan_units(descriptor: &BuildDescriptor, host: &str) -> Result<Vec<BuildUnit>, ResolveError> {
  let plans = resolve(descriptor, host)?;

  let mut units = Vec::new();
  for plan in &plans {
    units.extend(expand(plan)?);
  }

  info!(host, targets = plans.len(), units = units.len(), "expanded build matrix");
  Ok(units)
}

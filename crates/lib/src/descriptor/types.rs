use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_BUILD_DIR, DEFAULT_BUILD_OUT_DIR};

/// A named string variable handed to the toolchain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Variable {
  pub name: String,
  pub value: String,
}

/// A boolean build switch.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuildOption {
  pub name: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  pub value: bool,
}

/// Sources making up one library. Paths are relative to the project root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LibrarySpec {
  pub sources: Vec<String>,
}

/// Settings shared by every target of a descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CommonConfig {
  #[serde(alias = "project")]
  pub project_name: String,
  #[serde(default)]
  pub archs: Vec<String>,
  #[serde(default)]
  pub variables: Vec<Variable>,
  #[serde(default)]
  pub defines: Vec<String>,
  #[serde(default)]
  pub options: Vec<BuildOption>,
  /// Source path -> destination path, both relative to the project root.
  #[serde(default)]
  pub copy: BTreeMap<String, String>,
  #[serde(default)]
  pub subdirectories: Vec<String>,
  #[serde(default)]
  pub libraries: BTreeMap<String, LibrarySpec>,
  #[serde(default = "default_build_dir")]
  pub build_dir: String,
  #[serde(default = "default_build_out_dir")]
  pub build_out_dir: String,
  #[serde(default)]
  pub build_flags: Vec<String>,
}

fn default_build_dir() -> String {
  DEFAULT_BUILD_DIR.to_string()
}

fn default_build_out_dir() -> String {
  DEFAULT_BUILD_OUT_DIR.to_string()
}

impl CommonConfig {
  /// A config with the given project name and every other field at its default.
  pub fn new(project_name: &str) -> Self {
    Self {
      project_name: project_name.to_string(),
      archs: Vec::new(),
      variables: Vec::new(),
      defines: Vec::new(),
      options: Vec::new(),
      copy: BTreeMap::new(),
      subdirectories: Vec::new(),
      libraries: BTreeMap::new(),
      build_dir: default_build_dir(),
      build_out_dir: default_build_out_dir(),
      build_flags: Vec::new(),
    }
  }
}

/// Per-target settings. A `None` field inherits the common value unchanged;
/// a `Some` field replaces it entirely.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TargetOverride {
  #[serde(alias = "project", skip_serializing_if = "Option::is_none")]
  pub project_name: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub archs: Option<Vec<String>>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub variables: Option<Vec<Variable>>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub defines: Option<Vec<String>>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub options: Option<Vec<BuildOption>>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub copy: Option<BTreeMap<String, String>>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub subdirectories: Option<Vec<String>>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub libraries: Option<BTreeMap<String, LibrarySpec>>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub build_dir: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub build_out_dir: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub build_flags: Option<Vec<String>>,
}

/// Target name -> override, for one host.
pub type HostTargets = BTreeMap<String, TargetOverride>;

/// The root descriptor: common settings plus per-host target overrides.
///
/// Read-only once loaded. `root` is the directory relative paths resolve
/// against; it is not part of the document itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuildDescriptor {
  pub common: CommonConfig,
  #[serde(default)]
  pub platforms: BTreeMap<String, HostTargets>,
  #[serde(skip)]
  pub root: PathBuf,
}

impl BuildDescriptor {
  /// Host identifiers declared in `platforms`, in sorted order.
  pub fn hosts(&self) -> impl Iterator<Item = &str> {
    self.platforms.keys().map(String::as_str)
  }
}

//! Reading descriptors from disk.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::BuildDescriptor;

/// Errors that can occur while loading a descriptor.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
  #[error("failed to read descriptor {path}: {source}")]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("invalid descriptor {path}: {message}")]
  Parse { path: PathBuf, message: String },

  #[error("unsupported descriptor format '{extension}' for {path} (expected .json or .toml)")]
  UnsupportedFormat { path: PathBuf, extension: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
  Json,
  Toml,
}

fn detect_format(path: &Path) -> Result<Format, LoadError> {
  let extension = path
    .extension()
    .and_then(|e| e.to_str())
    .unwrap_or_default()
    .to_ascii_lowercase();

  match extension.as_str() {
    "json" => Ok(Format::Json),
    "toml" => Ok(Format::Toml),
    _ => Err(LoadError::UnsupportedFormat {
      path: path.to_path_buf(),
      extension,
    }),
  }
}

impl BuildDescriptor {
  /// Load a descriptor from a `.json` or `.toml` file.
  ///
  /// The descriptor's `root` is set to the canonicalized directory containing
  /// the file, so relative source and copy paths resolve next to it.
  pub fn load(path: &Path) -> Result<Self, LoadError> {
    let format = detect_format(path)?;
    info!(path = %path.display(), "loading descriptor");

    let content = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
      path: path.to_path_buf(),
      source,
    })?;

    let mut descriptor = match format {
      Format::Json => Self::from_json_str(&content),
      Format::Toml => toml::from_str::<Self>(&content).map_err(|e| e.to_string()),
    }
    .map_err(|message| LoadError::Parse {
      path: path.to_path_buf(),
      message,
    })?;

    let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
    descriptor.root = dunce::canonicalize(dir).map_err(|source| LoadError::Io {
      path: dir.to_path_buf(),
      source,
    })?;

    debug!(
      root = %descriptor.root.display(),
      hosts = descriptor.platforms.len(),
      "descriptor loaded"
    );

    Ok(descriptor)
  }

  /// Parse a descriptor from JSON text. `root` is left empty (the current
  /// directory).
  pub fn from_json_str(content: &str) -> Result<Self, String> {
    serde_json::from_str(content).map_err(|e| e.to_string())
  }
}

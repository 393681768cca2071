//! Host platform detection.
//!
//! Descriptor `platforms` keys name the host a build runs on. This module maps
//! the running operating system to that identifier.

pub mod os;

use os::Os;

/// Returns the host identifier for the current system (e.g., "linux", "win32")
///
/// Returns `None` if the current OS has no descriptor identifier
pub fn host_id() -> Option<&'static str> {
  Os::current().map(|os| os.as_str())
}

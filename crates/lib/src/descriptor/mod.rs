//! Build descriptor model and loading.
//!
//! A descriptor has two top-level sections:
//! - `common`: settings shared by every target
//! - `platforms`: host identifier -> target name -> [`TargetOverride`]
//!
//! Only the section matching the current host is used for an invocation; the
//! others describe builds performed on other machines.

mod load;
mod types;

pub use load::LoadError;
pub use types::*;

//! xbuild-lib: resolution and orchestration of cross-platform build descriptors.
//!
//! A descriptor declares common settings plus per-host, per-target overrides.
//! This crate turns it into concrete work:
//! - `descriptor`: the in-memory model and loader
//! - `resolve`: field-level override-wins merge into per-target plans
//! - `matrix`: expansion of each plan into one `BuildUnit` per arch
//! - `stage`: idempotent file staging before compilation
//! - `toolchain`: the compiler seam and a command-line implementation
//! - `execute`: bounded-parallel execution and the final report

pub mod consts;
pub mod descriptor;
pub mod execute;
pub mod matrix;
pub mod platform;
pub mod resolve;
pub mod stage;
pub mod toolchain;
pub mod util;

mod build;
mod info;
mod plan;

use anyhow::{Context, Result};

use xbuild_lib::platform::host_id;

pub use build::cmd_build;
pub use info::cmd_info;
pub use plan::cmd_plan;

/// The explicit `--host` value, else the detected one.
fn select_host(host: Option<&str>) -> Result<String> {
  host
    .or_else(|| host_id())
    .map(str::to_string)
    .context("Could not detect the host platform; pass --host")
}

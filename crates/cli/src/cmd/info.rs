use xbuild_lib::platform::host_id;

use crate::output::{print_info, print_stat};

pub fn cmd_info() {
  print_info(&format!("xbuild v{}", env!("CARGO_PKG_VERSION")));
  match host_id() {
    Some(host) => print_stat("Host", host),
    _ => print_stat("Host", "unsupported (pass --host)"),
  }
  print_stat("Arch", std::env::consts::ARCH);
}

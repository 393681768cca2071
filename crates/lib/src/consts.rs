/// Application name, used for temporary file prefixes and log targets.
pub const APP_NAME: &str = "xbuild";

/// Environment variable overriding the detected host identifier.
pub const HOST_ENV: &str = "XBUILD_HOST";

/// Default descriptor file name looked up by the CLI.
pub const DEFAULT_DESCRIPTOR: &str = "xbuild.json";

/// Default staging/intermediate directory, relative to the project root.
pub const DEFAULT_BUILD_DIR: &str = "build";

/// Default artifact directory, relative to the project root.
pub const DEFAULT_BUILD_OUT_DIR: &str = "libs";

/// January 1, 1980 00:00:00 UTC, exported to toolchain processes for
/// reproducible timestamps.
pub const SOURCE_DATE_EPOCH: &str = "315532800";

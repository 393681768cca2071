mod cmd;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use output::OutputFormat;
use xbuild_lib::consts::{DEFAULT_DESCRIPTOR, HOST_ENV};
use xbuild_lib::execute::ExecuteConfig;
use xbuild_lib::toolchain::CommandToolchain;

/// xbuild - build one native library for every target a descriptor declares
#[derive(Parser)]
#[command(name = "xbuild")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable debug logging
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Args)]
struct DescriptorArgs {
  /// Path to the descriptor (.json or .toml)
  #[arg(default_value = DEFAULT_DESCRIPTOR)]
  descriptor: PathBuf,

  /// Host identifier selecting the platform section (default: detected)
  #[arg(long, env = HOST_ENV)]
  host: Option<String>,

  /// Output format
  #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
  output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
  /// Resolve the descriptor and build every unit for the host
  Build {
    #[command(flatten)]
    args: DescriptorArgs,

    /// Maximum number of units built at once (default: CPU count)
    #[arg(short, long, env = "XBUILD_JOBS")]
    jobs: Option<usize>,

    /// Compiler command line
    #[arg(long, env = "XBUILD_CC", default_value = "cc")]
    cc: String,

    /// Archiver command line
    #[arg(long, env = "XBUILD_AR", default_value = "ar")]
    ar: String,

    /// Time allowed for staging one unit (e.g. "30s")
    #[arg(long, value_parser = humantime::parse_duration, default_value = "60s")]
    stage_timeout: Duration,

    /// Time allowed for compiling one unit (e.g. "10m")
    #[arg(long, value_parser = humantime::parse_duration, default_value = "30m")]
    compile_timeout: Duration,
  },

  /// Show the build units a descriptor expands to, without building
  Plan {
    #[command(flatten)]
    args: DescriptorArgs,
  },

  /// Show the detected host identifier
  Info,
}

fn init_tracing(verbose: bool) {
  let filter = if verbose {
    EnvFilter::new("debug")
  } else {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
  };

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();
}

fn main() -> ExitCode {
  let cli = Cli::parse();
  init_tracing(cli.verbose);

  let result = match cli.command {
    Commands::Build {
      args,
      jobs,
      cc,
      ar,
      stage_timeout,
      compile_timeout,
    } => {
      let defaults = ExecuteConfig::default();
      let config = ExecuteConfig {
        parallelism: jobs.unwrap_or(defaults.parallelism),
        stage_timeout,
        compile_timeout,
      };
      cmd::cmd_build(
        &args.descriptor,
        args.host.as_deref(),
        config,
        CommandToolchain::new(&cc, &ar),
        args.output,
      )
    }
    Commands::Plan { args } => cmd::cmd_plan(&args.descriptor, args.host.as_deref(), args.output).map(|()| true),
    Commands::Info => {
      cmd::cmd_info();
      Ok(true)
    }
  };

  match result {
    Ok(true) => ExitCode::SUCCESS,
    Ok(false) => ExitCode::FAILURE,
    Err(e) => {
      output::print_error(&format!("{e:#}"));
      ExitCode::FAILURE
    }
  }
}

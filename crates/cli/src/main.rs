mod cmd;
mod output;
mod prompts;

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{ArgAction, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use cmd::BuildOptions;
use output::{OutputFormat, print_error};
use reportbox_lib::config::Settings;

/// reportbox - package report engines into container images and run them
#[derive(Parser)]
#[command(name = "reportbox")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Increase log verbosity (-v info, -vv debug)
  #[arg(short, long, global = true, action = ArgAction::Count)]
  verbose: u8,

  /// Container runtime command (overrides REPORTBOX_RUNTIME)
  #[arg(long, global = true, value_name = "PROGRAM")]
  runtime: Option<String>,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Build an engine image and optionally export it to an archive
  Package {
    /// Path to the engine descriptor (engine.toml)
    descriptor: PathBuf,

    /// Name (tag) of the image to build
    #[arg(short, long)]
    image: String,

    /// Export the built image to this archive file
    #[arg(short, long, value_name = "ARCHIVE")]
    output: Option<PathBuf>,

    /// Also export to <archive dir>/<image>.tar
    #[arg(long, conflicts_with = "output")]
    save: bool,

    #[command(flatten)]
    build: BuildOptions,
  },

  /// Assemble a build context without building it
  Stage {
    /// Path to the engine descriptor (engine.toml)
    descriptor: PathBuf,

    /// Directory to stage into (replaced if it exists)
    #[arg(short, long)]
    dir: PathBuf,

    #[command(flatten)]
    build: BuildOptions,
  },

  /// Load an image archive into the runtime's image store
  Load {
    /// Archive file to load
    #[arg(required_unless_present = "image", conflicts_with = "image")]
    archive: Option<PathBuf>,

    /// Load <archive dir>/<image>.tar instead
    #[arg(short, long)]
    image: Option<String>,

    /// Archive directory (overrides REPORTBOX_ARCHIVE_DIR)
    #[arg(long)]
    archive_dir: Option<PathBuf>,
  },

  /// Run a packaged engine and write its report
  Invoke {
    /// Image to run
    image: String,

    /// JSON configuration file, or '-' for standard input
    #[arg(short, long, conflicts_with = "interactive")]
    config: Option<PathBuf>,

    /// Prompt for each schema field instead of reading a file
    #[arg(long, requires = "schema")]
    interactive: bool,

    /// Schema used to validate (and prompt for) the configuration
    #[arg(long)]
    schema: Option<PathBuf>,

    /// Write the report to a file instead of standard output
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Kill the engine after this long, e.g. 30s (overrides REPORTBOX_INVOKE_TIMEOUT)
    #[arg(long, value_parser = humantime::parse_duration)]
    timeout: Option<Duration>,

    /// Fail early if the image is not in the runtime's store
    #[arg(long)]
    check_image: bool,
  },

  /// List exported image archives
  Images {
    /// Archive directory (overrides REPORTBOX_ARCHIVE_DIR)
    #[arg(long)]
    archive_dir: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t)]
    format: OutputFormat,
  },
}

fn init_logging(verbose: u8) {
  let default = match verbose {
    0 => "warn",
    1 => "info",
    _ => "debug",
  };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .with_target(false)
    .init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
  let mut settings = Settings::from_env()?;
  if let Some(runtime) = cli.runtime {
    settings.runtime = runtime;
  }
  debug!(
    runtime = %settings.runtime,
    archive_dir = %settings.archive_dir.display(),
    timeout = ?settings.invoke_timeout,
    "settings resolved"
  );

  match cli.command {
    Commands::Package {
      descriptor,
      image,
      output,
      save,
      build,
    } => {
      let archive = match (output, save) {
        (Some(path), _) => Some(path),
        (None, true) => Some(cmd::archive_store(&settings, None, true)?.archive_path(&image)),
        (None, false) => None,
      };
      cmd::cmd_package(&descriptor, &image, archive, &build, &settings)
    }
    Commands::Stage { descriptor, dir, build } => cmd::cmd_stage(&descriptor, &dir, &build, &settings),
    Commands::Load {
      archive,
      image,
      archive_dir,
    } => cmd::cmd_load(archive.as_deref(), image.as_deref(), archive_dir, &settings),
    Commands::Invoke {
      image,
      config,
      interactive,
      schema,
      output,
      timeout,
      check_image,
    } => {
      let options = cmd::InvokeArgs {
        config,
        interactive,
        schema,
        output,
        timeout: timeout.or(settings.invoke_timeout),
        check_image,
      };
      cmd::cmd_invoke(&image, &options, &settings)
    }
    Commands::Images { archive_dir, format } => cmd::cmd_images(archive_dir, format, &settings),
  }
}

fn main() -> ExitCode {
  let cli = Cli::parse();
  init_logging(cli.verbose);

  match run(cli) {
    Ok(()) => ExitCode::SUCCESS,
    Err(err) => {
      print_error(&format!("{err:#}"));
      ExitCode::FAILURE
    }
  }
}

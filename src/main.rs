use chrono::Local;
use clap::{Parser, Subcommand};
use picsqueeze::archive::{self, ArchiveEntry};
use picsqueeze::config::{self, Overrides, Preset};
use picsqueeze::imaging::RustBackend;
use picsqueeze::interrupt::CancelToken;
use picsqueeze::{output, process, scan};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn version_string() -> &'static str {
    let hash = env!("PICSQUEEZE_GIT_HASH");
    if hash.is_empty() {
        env!("CARGO_PKG_VERSION")
    } else {
        // Leaked once at startup
        Box::leak(format!("{}@{hash}", env!("CARGO_PKG_VERSION")).into_boxed_str())
    }
}

#[derive(Parser)]
#[command(name = "picsqueeze")]
#[command(about = "Batch-resize and compress images into one ZIP archive")]
#[command(long_about = "\
Batch-resize and compress images into one ZIP archive

Every image is fitted into the target box (letterboxed on white when both
width and height are set), re-encoded as JPEG, and re-compressed until it is
under the size cap. Images that fail are reported and left out of the archive.

Presets:
  instagram  1080 x 1080   (default)
  story      1080 x 1920
  twitter    1200 x 675
  facebook   1200 x 630
  linkedin   1200 x 627
  custom     use --width and/or --height; a missing side follows the aspect ratio

Settings are read from ./picsqueeze.toml (or --config) and overridden by flags.
Run 'picsqueeze gen-config' to generate a documented config file.

Set RUST_LOG=picsqueeze=debug to trace every compression pass.")]
#[command(version = version_string())]
struct Cli {
    /// Config file (default: ./picsqueeze.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log more detail to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resize and compress images, then write them to a ZIP archive
    Squeeze(SqueezeArgs),
    /// List the size presets
    Presets,
    /// Print a stock picsqueeze.toml with all options documented
    GenConfig,
}

#[derive(clap::Args)]
struct SqueezeArgs {
    /// Image files or directories
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Include images in subdirectories
    #[arg(short, long)]
    recursive: bool,

    /// Directory the archive is written to
    #[arg(short, long, default_value = ".")]
    output: PathBuf,

    /// Size preset
    #[arg(short, long, value_enum)]
    preset: Option<Preset>,

    /// JPEG quality (60-100)
    #[arg(short, long)]
    quality: Option<u32>,

    /// Target width in pixels
    #[arg(long)]
    width: Option<u32>,

    /// Target height in pixels
    #[arg(long)]
    height: Option<u32>,

    /// Output size cap per image, in megabytes
    #[arg(long)]
    max_size_mb: Option<f64>,

    /// Per-image time limit in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Print a JSON summary instead of the progress listing
    #[arg(long)]
    json: bool,
}

impl SqueezeArgs {
    fn overrides(&self) -> Overrides {
        Overrides {
            preset: self.preset,
            quality: self.quality,
            width: self.width,
            height: self.height,
            max_size_mb: self.max_size_mb,
            item_timeout_secs: self.timeout,
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Squeeze(args) => squeeze(cli.config, &args)?,
        Command::Presets => output::print_presets(),
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

fn squeeze(config_file: Option<PathBuf>, args: &SqueezeArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config_file = config_file.or_else(|| {
        let local = PathBuf::from(config::CONFIG_FILE);
        local.exists().then_some(local)
    });
    let app_config = config::load_config(config_file.as_deref(), &args.overrides())?;
    let settings = app_config.settings();
    info!(preset = %app_config.effective_preset(), "settings resolved");

    let sources = scan::collect_sources(&args.inputs, args.recursive)?;
    if sources.is_empty() {
        return Err("no images found in the given inputs".into());
    }

    let sequencer = process::Sequencer::new(RustBackend::new());
    let cancel = CancelToken::new();

    let report = if args.json {
        sequencer.run(&sources, settings, &cancel, None)?
    } else {
        let (tx, rx) = std::sync::mpsc::channel();
        let printer = std::thread::spawn(move || {
            for event in rx {
                output::print_process_event(&event);
            }
        });
        let report = sequencer.run(&sources, settings, &cancel, Some(tx));
        printer
            .join()
            .map_err(|_| "progress printer thread panicked")?;
        report?
    };

    let archive = if report.success_count() > 0 {
        let entries = ArchiveEntry::from_results(&report.results);
        let archive = archive::build_archive(&entries, &Local::now().naive_local())?;
        std::fs::create_dir_all(&args.output)?;
        std::fs::write(args.output.join(&archive.filename), &archive.bytes)?;
        Some(archive)
    } else {
        None
    };

    let summary = output::BatchSummary::new(&report, archive.as_ref());
    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        output::print_batch_summary(&summary);
    }

    if summary.succeeded == 0 {
        return Err("no images were squeezed".into());
    }
    Ok(())
}

/// Route `tracing` output to stderr so stdout carries only the listing.
///
/// `RUST_LOG` wins over `--verbose` when set.
fn init_logging(verbose: bool) {
    let default = if verbose {
        "picsqueeze=debug"
    } else {
        "picsqueeze=warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

//! webp-sweep CLI - WebP encoder parameter benchmark

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

/// WebP encoder parameter-sweep benchmark.
#[derive(Parser)]
#[command(name = "webp-sweep")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode a source under every method and report latency and SSIM
    Sweep {
        /// Source image (JPEG or PNG)
        source: PathBuf,

        /// Methods to sweep (default: 0-6)
        #[arg(short, long, value_delimiter = ',')]
        methods: Vec<u8>,

        /// Quality for every configuration
        #[arg(short, long, default_value_t = webp_sweep::params::DEFAULT_QUALITY)]
        quality: u8,

        /// Iterations per configuration, warm-up included
        #[arg(short = 'n', long, env = "WEBP_SWEEP_ITERATIONS", default_value_t = 11)]
        iterations: u32,

        /// Directory for transient artifacts
        #[arg(long, env = "WEBP_SWEEP_WORK_DIR")]
        work_dir: Option<PathBuf>,

        /// Directory for per-configuration logs
        #[arg(long, env = "WEBP_SWEEP_LOG_DIR", default_value = ".")]
        log_dir: PathBuf,

        /// Write the full report as JSON
        #[arg(long)]
        report: Option<PathBuf>,

        /// Write the per-configuration summary as CSV
        #[arg(long)]
        csv: Option<PathBuf>,
    },

    /// Encode once and keep the artifact
    Convert {
        /// Source image (JPEG or PNG)
        source: PathBuf,

        /// Encoder method (0-6)
        #[arg(short, long, default_value_t = 4)]
        method: u8,

        /// Quality (1-100)
        #[arg(short, long, default_value_t = webp_sweep::params::DEFAULT_QUALITY)]
        quality: u8,

        /// Output file (default: source with .webp extension)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// SSIM between two images of equal size
    Compare {
        /// Reference image
        reference: PathBuf,

        /// Test image
        test: PathBuf,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "webp_sweep=debug,webp_sweep_cli=debug"
    } else {
        "webp_sweep=info,webp_sweep_cli=info"
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Sweep {
            source,
            methods,
            quality,
            iterations,
            work_dir,
            log_dir,
            report,
            csv,
        } => commands::sweep::run(commands::sweep::SweepArgs {
            source,
            methods,
            quality,
            iterations,
            work_dir,
            log_dir,
            report,
            csv,
        }),
        Commands::Convert {
            source,
            method,
            quality,
            output,
        } => commands::convert::run(source, method, quality, output),
        Commands::Compare {
            reference,
            test,
            json,
        } => commands::compare::run(&reference, &test, json),
    }
}

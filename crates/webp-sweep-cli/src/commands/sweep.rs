//! Sweep command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{info, warn};
use webp_sweep::{SweepConfig, SweepPlan, SweepReport, SweepSession, SweepStatus};

pub struct SweepArgs {
    pub source: PathBuf,
    pub methods: Vec<u8>,
    pub quality: u8,
    pub iterations: u32,
    pub work_dir: Option<PathBuf>,
    pub log_dir: PathBuf,
    pub report: Option<PathBuf>,
    pub csv: Option<PathBuf>,
}

pub fn run(args: SweepArgs) -> Result<()> {
    let plan = if args.methods.is_empty() {
        SweepPlan::all_methods(args.quality)?
    } else {
        SweepPlan::methods(args.methods.iter().copied(), args.quality)?
    };

    let mut builder = SweepConfig::builder()
        .iterations(args.iterations)
        .log_dir(&args.log_dir);
    if let Some(work_dir) = &args.work_dir {
        builder = builder.work_dir(work_dir);
    }
    let config = builder.build()?;

    let mut session = SweepSession::with_webp(config);
    let report = match session.run_sweep(&args.source, &plan) {
        Ok(report) => report,
        Err(e) if e.is_fatal_for_sweep() => {
            let context = format!("Cannot sweep {}", args.source.display());
            return Err(anyhow::Error::new(e).context(context));
        }
        Err(e) => return Err(anyhow::Error::new(e).context("Sweep failed")),
    };

    print_table(&report);
    let log_dir = &session.config().log_dir;
    info!(log_dir = %log_dir.display(), "configuration logs written");

    if let Some(path) = &args.report {
        report
            .write_json(path)
            .with_context(|| format!("Failed to write report: {}", path.display()))?;
        info!(path = %path.display(), "report written");
    }
    if let Some(path) = &args.csv {
        report
            .write_csv(path)
            .with_context(|| format!("Failed to write CSV: {}", path.display()))?;
        info!(path = %path.display(), "CSV written");
    }

    for path in &report.leaked_artifacts {
        warn!(path = %path.display(), "could not remove artifact");
    }

    Ok(())
}

fn print_table(report: &SweepReport) {
    println!(
        "Source: {} ({}x{}, {}, {} bytes)",
        report.source.path.display(),
        report.source.width,
        report.source.height,
        report.source.color_model,
        report.source.byte_size
    );
    println!(
        "Codec: {} {} | Metric: {} | Iterations: {} (first excluded)",
        report.codec_id, report.codec_version, report.metric, report.iterations
    );
    println!();
    println!(
        "{:<16} {:>7} {:>12} {:>10} {:>10}  {}",
        "Config", "Samples", "Avg ms", "Avg SSIM", "Avg bytes", "Note"
    );
    println!("{:-<72}", "");

    for stat in &report.stats {
        let note = stat.failure.as_deref().unwrap_or("");
        if stat.is_defined() {
            println!(
                "{:<16} {:>7} {:>12.2} {:>10.5} {:>10.0}  {}",
                stat.id,
                stat.samples,
                stat.avg_elapsed_ms,
                stat.avg_similarity,
                stat.avg_artifact_bytes,
                note
            );
        } else {
            println!(
                "{:<16} {:>7} {:>12} {:>10} {:>10}  {}",
                stat.id, 0, "undefined", "undefined", "-", note
            );
        }
    }

    if report.status == SweepStatus::Aborted {
        println!();
        let attempted = report.stats.len();
        println!("Sweep aborted after {} configuration(s)", attempted);
    }
}

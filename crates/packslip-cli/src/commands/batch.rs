//! Batch command - parse many documents concurrently.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use clap::Args;
use console::style;
use futures_util::stream::{self, StreamExt};
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, error, warn};

use packslip_core::{DocumentParser, LineItemParser, ParseSessionResult, SessionError};

use super::parse::{render, OutputFormat};
use super::{build_parser, load_config};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Input files or glob pattern
    #[arg(required = true)]
    input: String,

    /// Supplier format id
    #[arg(long)]
    format: Option<String>,

    /// Supplier format spec file (JSON), instead of --format
    #[arg(long, conflicts_with = "format")]
    format_file: Option<PathBuf>,

    /// Output directory
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output format for each file (default: from config)
    #[arg(short = 'f', long = "output-format", value_enum)]
    output_format: Option<OutputFormat>,

    /// Also generate a summary CSV
    #[arg(long)]
    summary: bool,

    /// Number of parallel workers
    #[arg(short = 'j', long, default_value = "4")]
    jobs: usize,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,
}

/// Outcome of parsing a single file.
struct FileResult {
    path: PathBuf,
    result: Option<ParseSessionResult>,
    error: Option<String>,
    processing_time_ms: u64,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let config = load_config(config_path)?;
    let output_format = OutputFormat::resolve(args.output_format, &config.output)?;
    let parser = Arc::new(build_parser(
        args.format.as_deref(),
        args.format_file.as_deref(),
        &config,
    )?);

    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| p.is_file())
        .collect();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    println!(
        "{} Found {} files to parse with format {}",
        style("ℹ").blue(),
        files.len(),
        parser.format().id()
    );

    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    let overall_pb = ProgressBar::new(files.len() as u64);
    overall_pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")
            .unwrap()
            .progress_chars("=>-"),
    );

    // Each document gets its own session; only the compiled format is shared.
    let mut pending = stream::iter(files.into_iter().map(|path| {
        let parser = Arc::clone(&parser);
        async move {
            let file_start = Instant::now();
            let task_path = path.clone();
            let outcome = tokio::task::spawn_blocking(move || parse_file(&task_path, &parser))
                .await
                .unwrap_or_else(|e| Err(anyhow::anyhow!("worker failed: {}", e)));
            let processing_time_ms = file_start.elapsed().as_millis() as u64;

            match outcome {
                Ok(result) => FileResult {
                    path,
                    result: Some(result),
                    error: None,
                    processing_time_ms,
                },
                Err(e) => FileResult {
                    path,
                    result: None,
                    error: Some(e.to_string()),
                    processing_time_ms,
                },
            }
        }
    }))
    .buffered(args.jobs.max(1));

    let mut results = Vec::new();
    while let Some(file) = pending.next().await {
        overall_pb.inc(1);

        if let Some(error_msg) = &file.error {
            if args.continue_on_error {
                warn!("Failed to parse {}: {}", file.path.display(), error_msg);
            } else {
                overall_pb.abandon();
                error!("Failed to parse {}: {}", file.path.display(), error_msg);
                anyhow::bail!("Processing failed for {}: {}", file.path.display(), error_msg);
            }
        }

        results.push(file);
    }

    overall_pb.finish_with_message("Complete");

    let successful: Vec<_> = results.iter().filter(|r| r.result.is_some()).collect();
    let failed: Vec<_> = results.iter().filter(|r| r.error.is_some()).collect();

    if let Some(output_dir) = &args.output_dir {
        for file in &successful {
            if let Some(result) = &file.result {
                let output_name = file
                    .path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or("document");
                let output_path =
                    output_dir.join(format!("{}.{}", output_name, output_format.extension()));

                fs::write(&output_path, render(result, output_format, &config.output)?)?;
                debug!("Wrote output to {}", output_path.display());
            }
        }
    }

    if args.summary {
        let summary_path = args
            .output_dir
            .as_ref()
            .map(|d| d.join("summary.csv"))
            .unwrap_or_else(|| PathBuf::from("summary.csv"));

        write_summary(&summary_path, &results)?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    let records: usize = successful
        .iter()
        .filter_map(|f| f.result.as_ref())
        .map(|r| r.records.len())
        .sum();

    println!();
    println!(
        "{} Parsed {} files ({} records) in {:?}",
        style("✓").green(),
        results.len(),
        records,
        start.elapsed()
    );
    println!(
        "   {} successful, {} failed",
        style(successful.len()).green(),
        style(failed.len()).red()
    );

    if !failed.is_empty() {
        println!();
        println!("{}", style("Failed files:").red());
        for file in &failed {
            println!(
                "  - {}: {}",
                file.path.display(),
                file.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    Ok(())
}

fn parse_file(path: &Path, parser: &LineItemParser) -> anyhow::Result<ParseSessionResult> {
    let text = fs::read_to_string(path)?;
    let result = parser.parse_text(&text).map_err(|e| match e {
        SessionError::NoRecognizedFormat { ref sample, .. } if !sample.is_empty() => {
            anyhow::anyhow!("{} (first line: {})", e, sample[0])
        }
        e => anyhow::Error::new(e),
    })?;
    Ok(result)
}

fn write_summary(path: &Path, results: &[FileResult]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record([
        "filename",
        "status",
        "format",
        "invoice_number",
        "invoice_date",
        "records",
        "total_quantity",
        "total_value",
        "unmatched_lines",
        "processing_time_ms",
        "error",
    ])?;

    for file in results {
        let filename = file.path.file_name().and_then(|s| s.to_str()).unwrap_or("");

        if let Some(result) = &file.result {
            wtr.write_record([
                filename,
                "success",
                &result.format,
                result.header.invoice_number.as_deref().unwrap_or(""),
                &result
                    .header
                    .invoice_date
                    .map(|d| d.to_string())
                    .unwrap_or_default(),
                &result.totals.record_count.to_string(),
                &result.totals.total_quantity.normalize().to_string(),
                &format!("{:.2}", result.totals.total_value),
                &result.unmatched_lines.len().to_string(),
                &file.processing_time_ms.to_string(),
                "",
            ])?;
        } else {
            wtr.write_record([
                filename,
                "error",
                "",
                "",
                "",
                "",
                "",
                "",
                "",
                &file.processing_time_ms.to_string(),
                file.error.as_deref().unwrap_or(""),
            ])?;
        }
    }

    wtr.flush()?;
    Ok(())
}

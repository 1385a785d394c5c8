//! Parse command - extract line items from a single document.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Args, ValueEnum};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use packslip_core::{DocumentParser, OutputConfig, ParseSessionResult};

use super::{build_parser, load_config, report_session_error};

/// Arguments for the parse command.
#[derive(Args)]
pub struct ParseArgs {
    /// Input text file, or `-` to read stdin
    #[arg(required = true)]
    input: PathBuf,

    /// Supplier format id
    #[arg(long)]
    format: Option<String>,

    /// Supplier format spec file (JSON), instead of --format
    #[arg(long, conflicts_with = "format")]
    format_file: Option<PathBuf>,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format (default: from config)
    #[arg(short = 'f', long = "output-format", value_enum)]
    output_format: Option<OutputFormat>,

    /// List unmatched lines on stderr
    #[arg(long)]
    show_unmatched: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output, one row per record
    Csv,
    /// Plain text summary
    Text,
}

impl OutputFormat {
    /// Resolve the output format from a flag or the config default.
    pub fn resolve(flag: Option<OutputFormat>, config: &OutputConfig) -> anyhow::Result<Self> {
        match flag {
            Some(format) => Ok(format),
            None => OutputFormat::from_str(&config.format, true)
                .map_err(|e| anyhow::anyhow!("Invalid output.format in config: {}", e)),
        }
    }

    /// File extension for this format.
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
            OutputFormat::Text => "txt",
        }
    }
}

pub async fn run(args: ParseArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let config = load_config(config_path)?;
    let output_format = OutputFormat::resolve(args.output_format, &config.output)?;
    let parser = build_parser(args.format.as_deref(), args.format_file.as_deref(), &config)?;

    let text = read_input(&args.input)?;
    info!("Parsing {} with format {}", args.input.display(), parser.format().id());

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    pb.set_message("Extracting line items...");

    let result = parser.parse_text(&text);
    pb.finish_and_clear();

    let result = match result {
        Ok(result) => result,
        Err(e) => {
            report_session_error(&e);
            anyhow::bail!("Could not parse {}", args.input.display());
        }
    };

    let output = render(&result, output_format, &config.output)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} {} records written to {}",
            style("✓").green(),
            result.records.len(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    for warning in &result.warnings {
        eprintln!("{} {}", style("⚠").yellow(), warning);
    }

    if args.show_unmatched && !result.unmatched_lines.is_empty() {
        eprintln!();
        eprintln!(
            "{}",
            style(format!("{} unmatched lines:", result.unmatched_lines.len())).yellow()
        );
        for line in result.unmatched_sample(result.unmatched_lines.len()) {
            eprintln!("  {}", line);
        }
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

fn read_input(input: &Path) -> anyhow::Result<String> {
    if input == Path::new("-") {
        let mut text = String::new();
        std::io::stdin().read_to_string(&mut text)?;
        return Ok(text);
    }

    if !input.exists() {
        anyhow::bail!("Input file not found: {}", input.display());
    }

    Ok(fs::read_to_string(input)?)
}

/// Render a result in the requested output format.
pub fn render(
    result: &ParseSessionResult,
    format: OutputFormat,
    output: &OutputConfig,
) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => format_json(result, output),
        OutputFormat::Csv => format_csv(result),
        OutputFormat::Text => Ok(format_text(result)),
    }
}

fn format_json(result: &ParseSessionResult, output: &OutputConfig) -> anyhow::Result<String> {
    let trimmed;
    let result = if output.include_unmatched {
        result
    } else {
        trimmed = ParseSessionResult {
            unmatched_lines: Vec::new(),
            ..result.clone()
        };
        &trimmed
    };

    if output.pretty {
        Ok(serde_json::to_string_pretty(result)?)
    } else {
        Ok(serde_json::to_string(result)?)
    }
}

fn format_csv(result: &ParseSessionResult) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    for row in result.rows() {
        wtr.serialize(row)?;
    }

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn format_text(result: &ParseSessionResult) -> String {
    let mut output = String::new();

    output.push_str(&format!("Format: {}\n", result.format));
    if let Some(number) = &result.header.invoice_number {
        output.push_str(&format!("Invoice: {}\n", number));
    }
    if let Some(date) = result.header.invoice_date {
        output.push_str(&format!("Date: {}\n", date));
    }
    output.push('\n');

    output.push_str("Records:\n");
    for row in result.rows() {
        output.push_str(&format!(
            "  {:<14} {:<14} {:<8} {:>5} x {:>9} = {:>10}  {}\n",
            row.style_or_barcode,
            row.color,
            row.size,
            row.quantity,
            row.unit_price,
            row.line_total,
            row.product_name
        ));
    }
    output.push('\n');

    output.push_str("Summary:\n");
    output.push_str(&format!("  Records:   {}\n", result.totals.record_count));
    output.push_str(&format!("  Quantity:  {}\n", result.totals.total_quantity.normalize()));
    output.push_str(&format!("  Value:     {:.2}\n", result.totals.total_value));
    output.push_str(&format!("  Unmatched: {}\n", result.unmatched_lines.len()));
    output.push_str(&format!("  Noise:     {}\n", result.noise_lines));

    output
}

//! Formats command - list and inspect supplier formats.

use std::fs;
use std::path::Path;

use clap::{Args, Subcommand};
use console::style;
use tracing::warn;

use packslip_core::format::{builtin_specs, lookup};
use packslip_core::{FormatSpec, PackslipConfig};

use super::load_config;

/// Arguments for the formats command.
#[derive(Args)]
pub struct FormatsArgs {
    #[command(subcommand)]
    command: FormatsCommand,
}

#[derive(Subcommand)]
enum FormatsCommand {
    /// List built-in and user formats
    List,

    /// Print a format spec as JSON
    Show {
        /// Format id
        id: String,
    },
}

pub async fn run(args: FormatsArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;

    match args.command {
        FormatsCommand::List => list_formats(&config),
        FormatsCommand::Show { id } => show_format(&id, &config),
    }
}

fn list_formats(config: &PackslipConfig) -> anyhow::Result<()> {
    let default = config.formats.default_format.as_deref();
    let marker = |id: &str| {
        if Some(id) == default {
            style("*").green().to_string()
        } else {
            " ".to_string()
        }
    };

    println!("{}", style("Built-in formats:").bold());
    for spec in builtin_specs() {
        println!(
            " {} {:<12} {}",
            marker(&spec.id),
            style(&spec.id).cyan(),
            spec.name
        );
    }

    if let Some(dir) = &config.formats.format_dir {
        println!();
        println!("{} ({})", style("User formats:").bold(), dir.display());

        let specs = user_formats(dir)?;
        if specs.is_empty() {
            println!("   (none)");
        }
        for spec in specs {
            println!(
                " {} {:<12} {}",
                marker(&spec.id),
                style(&spec.id).cyan(),
                spec.name
            );
        }
    }

    Ok(())
}

/// Load every `*.json` spec in the format directory, skipping invalid files.
fn user_formats(dir: &Path) -> anyhow::Result<Vec<FormatSpec>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut specs = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        match FormatSpec::from_file(&path) {
            Ok(spec) => specs.push(spec),
            Err(e) => warn!("Skipping {}: {}", path.display(), e),
        }
    }

    specs.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(specs)
}

fn show_format(id: &str, config: &PackslipConfig) -> anyhow::Result<()> {
    let spec = lookup(id, config.formats.format_dir.as_deref())?;

    // Compile to surface pattern errors in user specs.
    spec.compile()?;

    if let Some(path) = config.format_path(id).filter(|p| p.exists()) {
        eprintln!("{} Loaded from {}", style("ℹ").blue(), path.display());
    }

    println!("{}", spec.to_json()?);

    Ok(())
}

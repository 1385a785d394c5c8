//! Subcommands and the helpers they share.

pub mod batch;
pub mod config;
pub mod formats;
pub mod parse;

use std::path::Path;

use console::style;
use tracing::debug;

use packslip_core::{FormatSpec, LineItemParser, PackslipConfig, SessionError};

/// Load the config from an explicit path, the default location, or defaults.
pub fn load_config(path: Option<&str>) -> anyhow::Result<PackslipConfig> {
    if let Some(path) = path {
        return Ok(PackslipConfig::from_file(Path::new(path))?);
    }

    let default_path = config::default_config_path();
    if default_path.exists() {
        debug!("Using config from {}", default_path.display());
        Ok(PackslipConfig::from_file(&default_path)?)
    } else {
        Ok(PackslipConfig::default())
    }
}

/// Build a parser from `--format-file`, `--format` or the configured default format.
pub fn build_parser(
    format_id: Option<&str>,
    format_file: Option<&Path>,
    config: &PackslipConfig,
) -> anyhow::Result<LineItemParser> {
    let parser = if let Some(path) = format_file {
        let spec = FormatSpec::from_file(path)?;
        LineItemParser::from_spec(&spec)?
    } else {
        let id = format_id
            .or(config.formats.default_format.as_deref())
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "No format given. Use --format <id> or set formats.default_format.\n\
                     Run 'packslip formats list' to see available formats."
                )
            })?;
        LineItemParser::for_format(id, config.formats.format_dir.as_deref())?
    };

    debug!("Using format {}", parser.format().id());
    Ok(parser.with_session_config(config.session.clone()))
}

/// Print a fatal session error with its diagnostic sample.
pub fn report_session_error(error: &SessionError) {
    eprintln!("{} {}", style("✗").red(), error);

    if let SessionError::NoRecognizedFormat { sample, .. } = error {
        if !sample.is_empty() {
            eprintln!();
            eprintln!("{}", style("First lines that did not match:").yellow());
            for line in sample {
                eprintln!("  {}", line);
            }
        }
    }
}

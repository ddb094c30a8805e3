//! Shared bootstrap for the demo programs: logging, config overrides and
//! report formatting.

use std::fs;
use std::path::Path;

use tabml::core::{MlError, MlResult};
use tabml::pipeline::ExperimentConfig;
use tracing_subscriber::EnvFilter;

/// Install a global subscriber that writes to stderr, leaving stdout for the
/// program's report. Filter comes from `RUST_LOG`, defaulting to `warn`.
/// Calling it again is a no-op.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Apply the JSON override file named by the first CLI argument, if any.
pub fn load_config(defaults: ExperimentConfig) -> MlResult<ExperimentConfig> {
    config_from_args(defaults, std::env::args().skip(1))
}

pub fn config_from_args(
    defaults: ExperimentConfig,
    mut args: impl Iterator<Item = String>,
) -> MlResult<ExperimentConfig> {
    match args.next() {
        Some(path) => {
            let config = apply_override_file(&defaults, Path::new(&path))?;
            tracing::info!(path = %path, "applied config overrides");
            Ok(config)
        }
        None => {
            defaults.validate()?;
            Ok(defaults)
        }
    }
}

fn apply_override_file(defaults: &ExperimentConfig, path: &Path) -> MlResult<ExperimentConfig> {
    let json = fs::read_to_string(path).map_err(|source| MlError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    defaults.with_overrides(&json)
}

/// Fraction as a percentage with two decimals, e.g. `0.9731` → `97.31%`.
pub fn percent(value: f64) -> String {
    format!("{:.2}%", value * 100.0)
}

/// Round to a whole number and group thousands with commas.
pub fn thousands(value: f64) -> String {
    let rounded = value.round();
    let digits = format!("{}", rounded.abs() as u64);
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if rounded < 0.0 {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

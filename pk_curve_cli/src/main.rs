use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{ArgAction, Parser, ValueHint};
use pk_curve::{CurveRequest, SampledCurve};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Calculates drug concentration over time and writes the sampled curve.
#[derive(Parser, Debug)]
#[command(author, version, about = "Concentration curve computation CLI", long_about = None)]
struct Cli {
    /// The drug's elimination half-life (time expression, e.g. `6` or `90m`)
    #[arg(long)]
    hl: String,

    /// The drug's time to maximum concentration (time expression)
    #[arg(long)]
    tmax: String,

    /// Duration to simulate, up to 720 hours (time expression)
    #[arg(long, default_value = "24")]
    duration: String,

    /// Dose magnitudes, whitespace separated (units are arbitrary)
    #[arg(long, default_value = "1")]
    doses: String,

    /// Time each dose is given at (time expressions, whitespace separated)
    #[arg(long, default_value = "0")]
    offsets: String,

    /// Output CSV path (`-` for stdout)
    #[arg(short, long, default_value = "concentration.csv", value_hint = ValueHint::FilePath)]
    output: PathBuf,

    /// Optional JSON summary path
    #[arg(long, value_hint = ValueHint::FilePath)]
    json: Option<PathBuf>,

    /// Verbose logging
    #[arg(long, action = ArgAction::SetTrue)]
    verbose: bool,
}

#[derive(Serialize)]
struct Summary<'a> {
    generated: String,
    #[serde(flatten)]
    curve: &'a SampledCurve,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    let request = CurveRequest {
        hl: cli.hl,
        t_max: cli.tmax,
        duration: cli.duration,
        doses: cli.doses,
        offsets: cli.offsets,
    };
    let curve = request
        .evaluate()
        .context("failed to evaluate the dose regimen")?;
    info!(
        "Curve computed: {} samples over {:.1} h, {} dose(s)",
        curve.hours.len(),
        curve.hours.last().copied().unwrap_or_default(),
        curve.doses.len()
    );

    if cli.output.as_os_str() == "-" {
        io::stdout()
            .write_all(curve.to_csv().as_bytes())
            .context("failed to write CSV to stdout")?;
    } else {
        fs::write(&cli.output, curve.to_csv())
            .with_context(|| format!("failed to write {}", cli.output.display()))?;
        info!("Wrote curve CSV: {}", cli.output.display());
    }

    if let Some(path) = cli.json.as_ref() {
        let summary = Summary {
            generated: Utc::now().to_rfc3339(),
            curve: &curve,
        };
        let text = serde_json::to_string_pretty(&summary)?;
        fs::write(path, text).with_context(|| format!("failed to write {}", path.display()))?;
        info!("Wrote summary JSON: {}", path.display());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_describe_a_single_unit_dose_day() {
        let cli = Cli::try_parse_from(["pk-curve", "--hl", "6", "--tmax", "2"]).unwrap();
        assert_eq!(cli.duration, "24");
        assert_eq!(cli.doses, "1");
        assert_eq!(cli.offsets, "0");
        assert_eq!(cli.output, PathBuf::from("concentration.csv"));
        assert!(cli.json.is_none());
    }

    #[test]
    fn half_life_and_peak_time_are_required() {
        assert!(Cli::try_parse_from(["pk-curve"]).is_err());
        assert!(Cli::try_parse_from(["pk-curve", "--hl", "6"]).is_err());
    }
}

//! Command-line interface for `geoprobe`.
//!
//! `geoprobe <DATASET>` opens a vector dataset, logs the extent and spatial
//! reference of its first layer, and exits with a code identifying the
//! failure, if any:
//!
//! | Code | Meaning                                     |
//! |------|---------------------------------------------|
//! | 0    | success                                     |
//! | 1    | dataset could not be opened                 |
//! | 2    | command-line usage error                    |
//! | 3    | dataset has no layer                        |
//! | 4    | layer has no spatial reference              |
//! | 5    | unsupported format or driver                |
//! | 6    | layer extent unavailable                    |
//! | 7    | invalid configuration (e.g. open options)   |
//! | 10   | internal setup failure                      |
//!
//! The CLI is built using [`clap`] for argument parsing and [`tracing`] for
//! structured logging. Log lines go to standard error, so `--json` output on
//! standard output stays machine-readable.

mod display;

use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{Level, error};
use tracing_log::LogTracer;
use tracing_subscriber::FmtSubscriber;

use geoprobe_core::drivers::get_drivers;
use geoprobe_core::{ProbeError, ProbeOptions, probe, register_all_drivers};

/// Exit code for failures outside the probe itself.
const EXIT_INTERNAL: u8 = 10;

#[derive(Parser)]
#[command(
    name = "geoprobe",
    version,
    about = "Report the extent and spatial reference of a vector geospatial dataset",
    long_about = "geoprobe opens a vector dataset, reads the bounding extent and the spatial \
                  reference of its first layer, and logs both."
)]
/// Command-line arguments and options for `geoprobe`.
struct Cli {
    /// Path to the dataset: a file, or a directory of shapefiles.
    #[arg(value_name = "DATASET", required_unless_present = "list_drivers")]
    dataset: Option<PathBuf>,

    /// Enable debug (DEBUG level) logging output with detailed diagnostics.
    #[arg(short, long, conflicts_with = "quiet")]
    debug: bool,

    /// Only log warnings and errors.
    #[arg(short, long)]
    quiet: bool,

    /// Force a driver instead of detecting the format (e.g., "`GeoJSON`", "`CSV`").
    #[arg(long, value_name = "DRIVER")]
    driver: Option<String>,

    /// Driver open option, e.g. `-o GEOMETRY_COLUMN=wkt`. Repeatable.
    #[arg(short = 'o', long = "open-option", value_name = "KEY=VALUE")]
    open_options: Vec<String>,

    /// Print a table with the full probe report.
    #[arg(long, conflicts_with = "json")]
    details: bool,

    /// Print the probe report as JSON on standard output.
    #[arg(long)]
    json: bool,

    /// Include a SHA-256 checksum of the dataset file in the report.
    #[arg(long)]
    checksum: bool,

    /// List the driver catalogue and exit.
    #[arg(long)]
    list_drivers: bool,
}

impl Cli {
    fn log_level(&self) -> Level {
        if self.debug {
            Level::DEBUG
        } else if self.quiet {
            Level::WARN
        } else {
            Level::INFO
        }
    }

    fn probe_options(&self) -> geoprobe_core::Result<ProbeOptions> {
        let options = ProbeOptions::new()
            .with_checksum(self.checksum)
            .with_open_option_pairs(&self.open_options)?;
        Ok(match &self.driver {
            Some(driver) => options.with_driver(driver),
            None => options,
        })
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(err) = init_logging(cli.log_level()) {
        eprintln!("Error: {err:#}");
        return ExitCode::from(EXIT_INTERNAL);
    }

    if cli.list_drivers {
        println!("{}", display::render_drivers(&get_drivers()));
        return ExitCode::SUCCESS;
    }

    let Some(dataset) = cli.dataset.as_deref() else {
        eprintln!("Error: no dataset given");
        return ExitCode::from(2);
    };

    match run(&cli, dataset) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => match err.downcast_ref::<ProbeError>() {
            Some(probe_error) => {
                report_error(probe_error);
                ExitCode::from(probe_error.exit_code())
            },
            None => {
                error!("{err:#}");
                eprintln!("Error: {err:#}");
                ExitCode::from(EXIT_INTERNAL)
            },
        },
    }
}

/// Installs the global `tracing` subscriber and bridges `log` records from
/// the library crates into it.
fn init_logging(level: Level) -> Result<()> {
    LogTracer::init().context("Failed to bridge log records")?;

    let stderr = std::io::stderr();
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true) // Show module paths for better context
        .with_ansi(stderr.is_terminal())
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to install the log subscriber")?;
    Ok(())
}

fn run(cli: &Cli, dataset: &Path) -> Result<()> {
    let options = cli.probe_options()?;
    let report = probe(register_all_drivers(), dataset, &options)?;

    if cli.json {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
        println!("{json}");
    } else if cli.details {
        println!("{}", display::render_report(&report));
    }
    Ok(())
}

fn report_error(err: &ProbeError) {
    error!(kind = err.kind().as_str(), "{err}");
    eprintln!("Error: {}", err.user_message());
    if let Some(suggestion) = err.recovery_suggestion() {
        eprintln!("Hint: {suggestion}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_dataset_required_unless_listing() {
        assert!(Cli::try_parse_from(["geoprobe"]).is_err());
        let cli = Cli::try_parse_from(["geoprobe", "--list-drivers"]).unwrap();
        assert!(cli.list_drivers);
        assert!(cli.dataset.is_none());
    }

    #[test]
    fn test_log_levels() {
        let cli = Cli::try_parse_from(["geoprobe", "a.shp"]).unwrap();
        assert_eq!(cli.log_level(), Level::INFO);
        let cli = Cli::try_parse_from(["geoprobe", "-d", "a.shp"]).unwrap();
        assert_eq!(cli.log_level(), Level::DEBUG);
        let cli = Cli::try_parse_from(["geoprobe", "--quiet", "a.shp"]).unwrap();
        assert_eq!(cli.log_level(), Level::WARN);
        assert!(Cli::try_parse_from(["geoprobe", "-d", "-q", "a.shp"]).is_err());
    }

    #[test]
    fn test_probe_options_from_flags() {
        let cli = Cli::try_parse_from([
            "geoprobe",
            "--driver",
            "CSV",
            "-o",
            "x_column=east",
            "--open-option",
            "Y_COLUMN=north",
            "--checksum",
            "points.csv",
        ])
        .unwrap();
        let options = cli.probe_options().unwrap();
        assert_eq!(options.driver.as_deref(), Some("CSV"));
        assert_eq!(options.open_options.get("X_COLUMN"), Some("east"));
        assert_eq!(options.open_options.get("Y_COLUMN"), Some("north"));
        assert!(options.checksum);
    }

    #[test]
    fn test_malformed_open_option_is_config_error() {
        let cli = Cli::try_parse_from(["geoprobe", "-o", "oops", "points.csv"]).unwrap();
        let err = cli.probe_options().unwrap_err();
        assert_eq!(err.exit_code(), 7);
    }
}

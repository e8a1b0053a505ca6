//! The `sqlex` command line.
//!
//! Resolves settings from flags, an optional TOML file and defaults, runs
//! the many-to-many suite against the selected backend and prints the
//! report.

use std::io::Write;
use std::process::ExitCode;

use log::{info, warn};
use sqlex_scenario::{Runner, Suite, many_to_many};
use sqlex_verify::Verifier;

pub mod cli;
pub mod config;
pub mod error;

pub use cli::Cli;
pub use config::{CONFIG_ENV, Config, Settings};
pub use error::{CliError, ConfigError, IoContext, Result};

/// How a completed run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Every selected scenario passed or was skipped
    Success,
    /// At least one scenario failed
    Failure,
}

impl From<Status> for ExitCode {
    fn from(status: Status) -> Self {
        match status {
            Status::Success => ExitCode::SUCCESS,
            Status::Failure => ExitCode::from(1),
        }
    }
}

/// Exit status for errors that stop a run before any scenario completes.
pub const EXIT_ERROR: u8 = 2;

/// Execute `cli`, writing listings and reports to `out`.
pub fn run<W: Write>(cli: &Cli, out: &mut W) -> Result<Status> {
    let config = Config::locate(cli.config.as_deref())?;
    let settings = Settings::resolve(cli, config)?;
    let suite = many_to_many::suite();

    if suite.select(settings.scenarios.as_slice()).next().is_none() {
        return Err(ConfigError::Invalid {
            reason: format!("no scenario matches {}", settings.scenarios.join(", ")),
        }
        .into());
    }

    if cli.list {
        list(&suite, &settings, out)?;
        return Ok(Status::Success);
    }

    info!(
        "Running {} on {} ({})",
        suite.name(),
        settings.dialect,
        settings.database
    );
    let mut backend = sqlex_db::connect(settings.dialect, &settings.database)?;
    let report = Runner::new(Verifier::new(settings.verify.clone()))
        .fail_fast(settings.fail_fast)
        .filter(settings.scenarios.iter().cloned())
        .run(&mut backend, &suite)?;

    if cli.json {
        serde_json::to_writer_pretty(&mut *out, &report)?;
        writeln!(out).io_context(|| "Failed to write report".to_string())?;
    } else {
        writeln!(out, "{report}").io_context(|| "Failed to write report".to_string())?;
    }

    if report.is_success() {
        Ok(Status::Success)
    } else {
        warn!("{} scenario(s) failed", report.totals().failed);
        Ok(Status::Failure)
    }
}

fn list<W: Write>(suite: &Suite, settings: &Settings, out: &mut W) -> Result<()> {
    for scenario in suite.select(settings.scenarios.as_slice()) {
        let mut line = scenario.name().to_owned();
        if let Some(dialect) = scenario.dialect() {
            line.push_str(&format!(" ({dialect} only)"));
        }
        if !scenario.description().is_empty() {
            line.push_str(&format!(": {}", scenario.description()));
        }
        writeln!(out, "{line}").io_context(|| "Failed to write scenario list".to_string())?;
    }
    Ok(())
}

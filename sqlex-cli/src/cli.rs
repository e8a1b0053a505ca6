use std::path::PathBuf;

use clap::Parser;
use sqlex_db::Dialect;

#[derive(Debug, Parser)]
#[command(
    name = "sqlex",
    version,
    about = "Run raw-SQL scenarios and check their typed results",
    disable_help_subcommand = true
)]
pub struct Cli {
    /// SQL dialect to run against: sqlite or postgres
    #[arg(value_name = "DIALECT", value_parser = parse_dialect)]
    pub dialect: Option<Dialect>,

    /// SQLite database path or PostgreSQL connection URL
    #[arg(short = 'd', long, value_name = "URL|PATH")]
    pub database: Option<String>,

    /// Read settings from this TOML file instead of $SQLEX_CONFIG
    #[arg(short = 'c', long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Only run scenarios whose name contains NAME (repeatable)
    #[arg(short = 's', long = "scenario", value_name = "NAME")]
    pub scenarios: Vec<String>,

    /// Stop after the first failed scenario
    #[arg(long)]
    pub fail_fast: bool,

    /// List scenarios instead of running them
    #[arg(long)]
    pub list: bool,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

fn parse_dialect(s: &str) -> Result<Dialect, String> {
    s.parse().map_err(|e: sqlex_db::Error| e.to_string())
}

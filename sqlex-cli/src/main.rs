use std::process::ExitCode;

use clap::Parser;
use log::error;
use sqlex_cli::{Cli, EXIT_ERROR};

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let mut stdout = std::io::stdout().lock();
    match sqlex_cli::run(&cli, &mut stdout) {
        Ok(status) => status.into(),
        Err(e) => {
            error!("{e}");
            ExitCode::from(EXIT_ERROR)
        }
    }
}

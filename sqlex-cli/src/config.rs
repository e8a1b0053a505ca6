use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use sqlex_db::Dialect;
use sqlex_verify::{Coercion, MatchMode, RowOrder, TypecastMap, VerifyConfig};

use crate::cli::Cli;
use crate::error::ConfigError;

/// Environment variable naming a config file when `--config` is absent.
pub const CONFIG_ENV: &str = "SQLEX_CONFIG";

/// Settings read from a TOML file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Dialect used when none is given on the command line
    pub dialect: Option<Dialect>,

    /// SQLite path or PostgreSQL URL
    pub database: Option<String>,

    /// Stop at the first failed scenario
    pub fail_fast: bool,

    /// Column comparison mode for row expectations
    pub match_mode: MatchMode,

    /// Whether row order matters unless a step says otherwise
    pub row_order: RowOrder,

    /// Column coercions layered over each suite's defaults
    pub typecasts: BTreeMap<String, Coercion>,
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
            path: path.display().to_string(),
            source: e,
        })?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load the file named by `explicit`, else by `SQLEX_CONFIG`, else
    /// fall back to defaults.
    pub fn locate(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => match std::env::var_os(CONFIG_ENV) {
                Some(path) => Self::from_file(&PathBuf::from(path)),
                None => Ok(Self::default()),
            },
        }
    }

    pub fn verify_config(&self) -> VerifyConfig {
        VerifyConfig {
            typecasts: self
                .typecasts
                .iter()
                .map(|(column, coercion)| (column.clone(), *coercion))
                .collect::<TypecastMap>(),
            mode: self.match_mode,
            order: self.row_order,
        }
    }
}

/// The effective settings for one run: command line over file over
/// defaults.
#[derive(Debug, Clone)]
pub struct Settings {
    pub dialect: Dialect,
    pub database: String,
    pub fail_fast: bool,
    pub scenarios: Vec<String>,
    pub verify: VerifyConfig,
}

impl Settings {
    pub fn resolve(cli: &Cli, config: Config) -> Result<Self, ConfigError> {
        let dialect = cli.dialect.or(config.dialect).unwrap_or_default();
        let database = match (cli.database.clone().or(config.database.clone()), dialect) {
            (Some(database), _) => database,
            (None, Dialect::Sqlite) => ":memory:".to_owned(),
            (None, Dialect::Postgres) => {
                return Err(ConfigError::Invalid {
                    reason: "postgres needs a connection URL in --database or the config file"
                        .to_owned(),
                });
            }
        };

        Ok(Self {
            dialect,
            database,
            fail_fast: cli.fail_fast || config.fail_fast,
            scenarios: cli.scenarios.clone(),
            verify: config.verify_config(),
        })
    }
}

// SPDX-License-Identifier: Apache-2.0

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::ArgMatches;
use serde::Deserialize;

/// Name of the configuration file picked up from the working directory when
/// `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "rectify.toml";

/// Settings read from a TOML file. Command line flags take precedence.
#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct DriverConfig {
    /// CEGIS iteration cap.
    pub max_iterations: Option<usize>,

    /// Emit the report as JSON instead of text.
    pub json: Option<bool>,

    /// Exhaustively re-verify the rectified circuit against the
    /// specification.
    pub check: Option<bool>,
}

impl DriverConfig {
    pub fn from_toml_str(text: &str) -> anyhow::Result<Self> {
        toml::from_str(text).context("parse rectify config")
    }
}

/// Loads the explicitly requested config file, or `rectify.toml` in the
/// working directory if present.
pub fn load_config(explicit: Option<&str>) -> anyhow::Result<Option<DriverConfig>> {
    let path: PathBuf = match explicit {
        Some(path) => {
            let path = PathBuf::from(path);
            if !path.exists() {
                anyhow::bail!("config file does not exist: {}", path.display());
            }
            path
        }
        None => {
            let cwd_path = Path::new(DEFAULT_CONFIG_FILE).to_path_buf();
            if !cwd_path.exists() {
                return Ok(None);
            }
            log::info!("Using {} in current directory", DEFAULT_CONFIG_FILE);
            cwd_path
        }
    };
    let text = std::fs::read_to_string(&path)
        .with_context(|| format!("read config file {}", path.display()))?;
    let config = DriverConfig::from_toml_str(&text)
        .with_context(|| format!("in config file {}", path.display()))?;
    Ok(Some(config))
}

/// Effective iteration cap: the flag, then the config file, then the
/// library default.
pub fn get_max_iterations(
    matches: &ArgMatches,
    config: &Option<DriverConfig>,
    default: usize,
) -> usize {
    if let Some(value) = matches.get_one::<usize>("max_iter") {
        *value
    } else if let Some(value) = config.as_ref().and_then(|c| c.max_iterations) {
        value
    } else {
        default
    }
}

/// A boolean flag is on if given on the command line or enabled in the
/// config file.
pub fn get_bool(matches: &ArgMatches, config_value: Option<bool>, flag: &str) -> bool {
    matches.get_flag(flag) || config_value.unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_config() {
        let config = DriverConfig::from_toml_str("max_iterations = 5\njson = true\n").unwrap();
        assert_eq!(
            config,
            DriverConfig {
                max_iterations: Some(5),
                json: Some(true),
                check: None,
            }
        );
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(DriverConfig::from_toml_str("max_iter = 5\n").is_err());
    }

    #[test]
    fn test_missing_explicit_config() {
        let err = load_config(Some("/definitely/not/here/rectify.toml")).unwrap_err();
        assert!(err.to_string().contains("does not exist"), "{}", err);
    }
}

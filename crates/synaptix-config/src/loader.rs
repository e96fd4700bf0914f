// Copyright 2025 Synaptix Developers
// SPDX-License-Identifier: Apache-2.0

//! Configuration loading
//!
//! Values are layered, lowest precedence first:
//! 1. Section defaults
//! 2. The TOML file (explicit path, else `SYNAPTIX_CONFIG_PATH`)
//! 3. `SYNAPTIX_*` environment variables
//! 4. Caller overrides
//!
//! Environment variables and caller overrides go through the same key table,
//! so `SYNAPTIX_DT=0.5` and the override `simulation.dt = 0.5` are equivalent.

use crate::{ConfigError, ConfigResult, SynaptixConfig};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Environment variable naming the configuration file
pub const CONFIG_PATH_VAR: &str = "SYNAPTIX_CONFIG_PATH";

/// Overridable settings as `(dotted key, environment variable)`
pub const OVERRIDE_KEYS: &[(&str, &str)] = &[
    ("simulation.dt", "SYNAPTIX_DT"),
    ("simulation.t0", "SYNAPTIX_T0"),
    ("simulation.seed", "SYNAPTIX_SEED"),
    ("integration.method", "SYNAPTIX_INTEGRATION"),
    ("optimizer.kind", "SYNAPTIX_OPTIMIZER"),
    ("optimizer.eta", "SYNAPTIX_ETA"),
    ("persistence.param_dir", "SYNAPTIX_PARAM_DIR"),
    ("logging.level", "SYNAPTIX_LOG_LEVEL"),
    ("logging.format", "SYNAPTIX_LOG_FORMAT"),
];

/// Load a configuration and apply environment and caller overrides
///
/// Without a path and without `SYNAPTIX_CONFIG_PATH` the section defaults
/// are the base layer.
///
/// # Errors
///
/// I/O and TOML errors for the file, `InvalidValue` for an override that
/// names no setting or does not parse.
pub fn load_config(
    config_path: Option<&Path>,
    overrides: Option<&HashMap<String, String>>,
) -> ConfigResult<SynaptixConfig> {
    let file = config_path
        .map(Path::to_path_buf)
        .or_else(|| env::var_os(CONFIG_PATH_VAR).map(PathBuf::from));
    let mut config: SynaptixConfig = match file {
        Some(path) => toml::from_str(&fs::read_to_string(&path)?)?,
        None => SynaptixConfig::default(),
    };

    apply_environment_overrides(&mut config)?;
    if let Some(overrides) = overrides {
        apply_overrides(&mut config, overrides)?;
    }
    Ok(config)
}

/// Apply every `SYNAPTIX_*` variable listed in [`OVERRIDE_KEYS`]
pub fn apply_environment_overrides(config: &mut SynaptixConfig) -> ConfigResult<()> {
    for (key, var) in OVERRIDE_KEYS {
        if let Ok(value) = env::var(var) {
            set_override(config, key, &value)?;
        }
    }
    Ok(())
}

/// Apply caller overrides in key order
pub fn apply_overrides(
    config: &mut SynaptixConfig,
    overrides: &HashMap<String, String>,
) -> ConfigResult<()> {
    let mut entries: Vec<_> = overrides.iter().collect();
    entries.sort();
    for (key, value) in entries {
        set_override(config, key, value)?;
    }
    Ok(())
}

/// Set one field from its dotted key; the bare field name (`seed`) also works
pub fn set_override(config: &mut SynaptixConfig, key: &str, value: &str) -> ConfigResult<()> {
    let key = resolve_key(key)
        .ok_or_else(|| ConfigError::InvalidValue(format!("unknown setting '{}'", key)))?;
    let choice = || value.trim().to_lowercase();
    match key {
        "simulation.dt" => config.simulation.dt = parse(key, value)?,
        "simulation.t0" => config.simulation.t0 = parse(key, value)?,
        "simulation.seed" => config.simulation.seed = parse(key, value)?,
        "integration.method" => config.integration.method = choice(),
        "optimizer.kind" => config.optimizer.kind = choice(),
        "optimizer.eta" => config.optimizer.eta = parse(key, value)?,
        "persistence.param_dir" => config.persistence.param_dir = PathBuf::from(value),
        "logging.level" => config.logging.level = choice(),
        "logging.format" => config.logging.format = choice(),
        other => {
            return Err(ConfigError::InvalidValue(format!("unknown setting '{}'", other)));
        }
    }
    Ok(())
}

fn resolve_key(key: &str) -> Option<&'static str> {
    OVERRIDE_KEYS.iter().map(|(dotted, _)| *dotted).find(|dotted| {
        *dotted == key || dotted.split_once('.').map(|(_, field)| field) == Some(key)
    })
}

fn parse<T: FromStr>(key: &str, value: &str) -> ConfigResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue(format!("{} cannot be '{}'", key, value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tempfile::tempdir;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn write(dir: &tempfile::TempDir, body: &str) -> PathBuf {
        let path = dir.path().join("synaptix_configuration.toml");
        fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_sections_from_file() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let dir = tempdir().unwrap();
        let path = write(
            &dir,
            "[simulation]\nseed = 7\n[integration]\nmethod = \"midpoint\"\n[optimizer]\nkind = \"adam\"\n",
        );

        let config = load_config(Some(&path), None).unwrap();
        assert_eq!(config.simulation.seed, 7);
        assert_eq!(config.simulation.dt, 1.0);
        assert_eq!(config.integration.method, "midpoint");
        assert_eq!(config.optimizer.kind, "adam");
    }

    #[test]
    fn test_without_file_defaults_are_the_base() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        env::remove_var(CONFIG_PATH_VAR);
        assert_eq!(load_config(None, None).unwrap(), SynaptixConfig::default());
    }

    #[test]
    fn test_config_path_variable() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let dir = tempdir().unwrap();
        let path = write(&dir, "[simulation]\ndt = 0.1\n");

        env::set_var(CONFIG_PATH_VAR, &path);
        let config = load_config(None, None);
        env::set_var(CONFIG_PATH_VAR, dir.path().join("absent.toml"));
        let missing = load_config(None, None);
        env::remove_var(CONFIG_PATH_VAR);

        assert_eq!(config.unwrap().simulation.dt, 0.1);
        assert!(matches!(missing, Err(ConfigError::IoError(_))));
    }

    #[test]
    fn test_invalid_toml_is_parse_error() {
        let dir = tempdir().unwrap();
        let path = write(&dir, "[simulation\ndt = ");
        let result = load_config(Some(&path), None);
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_malformed_environment_value_is_rejected() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let mut config = SynaptixConfig::default();

        env::set_var("SYNAPTIX_DT", "0.25");
        env::set_var("SYNAPTIX_PARAM_DIR", "/tmp/weights");
        let applied = apply_environment_overrides(&mut config);
        env::set_var("SYNAPTIX_SEED", "not-a-number");
        let rejected = apply_environment_overrides(&mut config);
        for (_, var) in OVERRIDE_KEYS {
            env::remove_var(var);
        }

        assert!(applied.is_ok());
        assert_eq!(config.simulation.dt, 0.25);
        assert_eq!(config.persistence.param_dir, PathBuf::from("/tmp/weights"));
        assert!(matches!(rejected, Err(ConfigError::InvalidValue(msg)) if msg.contains("simulation.seed")));
    }

    #[test]
    fn test_override_precedence() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let dir = tempdir().unwrap();
        let path = write(&dir, "[optimizer]\nkind = \"sgd\"\neta = 0.5\n");

        env::set_var("SYNAPTIX_OPTIMIZER", "adam");
        env::set_var("SYNAPTIX_ETA", "0.1");
        let mut overrides = HashMap::new();
        overrides.insert("optimizer.kind".to_string(), "SGD".to_string());
        let config = load_config(Some(&path), Some(&overrides)).unwrap();
        env::remove_var("SYNAPTIX_OPTIMIZER");
        env::remove_var("SYNAPTIX_ETA");

        // caller wins for kind, environment wins for eta
        assert_eq!(config.optimizer.kind, "sgd");
        assert_eq!(config.optimizer.eta, 0.1);
    }

    #[test]
    fn test_bare_and_dotted_keys() {
        let mut config = SynaptixConfig::default();
        set_override(&mut config, "seed", "8").unwrap();
        set_override(&mut config, "integration.method", " RK2 ").unwrap();
        set_override(&mut config, "method", "euler").unwrap();
        assert_eq!(config.simulation.seed, 8);
        assert_eq!(config.integration.method, "euler");

        assert!(set_override(&mut config, "simulation.steps", "3").is_err());
        assert!(set_override(&mut config, "dt", "fast").is_err());
    }
}

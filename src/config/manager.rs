use super::{
    backtesting::BacktestConfig,
    series::SeriesConfig,
    traits::ConfigSection,
};
use crate::error::ForecastError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Arc, RwLock};

/// Prefix of environment overrides, e.g. `BACKTEST_BACKTEST__N_WINDOWS=4`
pub const ENV_PREFIX: &str = "BACKTEST";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub backtest: BacktestConfig,
    pub series: SeriesConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), ForecastError> {
        validate_section(&self.backtest)?;
        validate_section(&self.series)?;
        Ok(())
    }
}

fn validate_section<S: ConfigSection>(section: &S) -> Result<(), ForecastError> {
    section.validate().map_err(|e| match e {
        ForecastError::Configuration(msg) => {
            ForecastError::Configuration(format!("[{}] {}", S::section_name(), msg))
        }
        other => other,
    })
}

/// `BACKTEST_<SECTION>__<KEY>` variables, e.g. `BACKTEST_SERIES__N_SERIES=20`
fn env_overrides(source: Option<config::Map<String, String>>) -> config::Environment {
    config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
        .source(source)
}

pub struct ConfigManager {
    config: Arc<RwLock<AppConfig>>,
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigManager {
    pub fn new() -> Self {
        Self {
            config: Arc::new(RwLock::new(AppConfig::default())),
        }
    }

    /// Load a TOML file, layered with `BACKTEST_<SECTION>__<KEY>` environment overrides
    pub fn load_from_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ForecastError> {
        self.load(path.as_ref(), env_overrides(None))
    }

    fn load(&self, path: &Path, env: config::Environment) -> Result<(), ForecastError> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path).format(config::FileFormat::Toml))
            .add_source(env)
            .build()
            .map_err(|e| ForecastError::Configuration(format!("Failed to read config: {}", e)))?;

        let config: AppConfig = settings
            .try_deserialize()
            .map_err(|e| ForecastError::Configuration(format!("Failed to parse config: {}", e)))?;

        config.validate()?;
        log::debug!("Loaded configuration from {}", path.display());

        *self.write()? = config;
        Ok(())
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ForecastError> {
        let config = self.get()?;
        let toml_str = toml::to_string_pretty(&config)
            .map_err(|e| ForecastError::Configuration(format!("Failed to serialize: {}", e)))?;

        std::fs::write(path, toml_str)
            .map_err(|e| ForecastError::Configuration(format!("Failed to write config: {}", e)))?;

        Ok(())
    }

    pub fn get(&self) -> Result<AppConfig, ForecastError> {
        let config = self
            .config
            .read()
            .map_err(|_| ForecastError::Configuration("Config lock poisoned".to_string()))?;
        Ok(config.clone())
    }

    /// Apply `f` and keep the result only if it still validates
    pub fn update<F>(&self, f: F) -> Result<(), ForecastError>
    where
        F: FnOnce(&mut AppConfig),
    {
        let mut config = self.write()?;
        let mut candidate = config.clone();
        f(&mut candidate);
        candidate.validate()?;
        *config = candidate;
        Ok(())
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, AppConfig>, ForecastError> {
        self.config
            .write()
            .map_err(|_| ForecastError::Configuration("Config lock poisoned".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::time::Frequency;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("backtest-splits-{}-{}.toml", name, std::process::id()))
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let manager = ConfigManager::new();
        manager
            .update(|c| {
                c.backtest.n_windows = 4;
                c.backtest.freq = Frequency::hours(6);
                c.series.equal_ends = true;
            })
            .unwrap();

        let path = temp_path("round-trip");
        manager.save_to_file(&path).unwrap();

        let loaded = ConfigManager::new();
        loaded.load_from_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(loaded.get().unwrap(), manager.get().unwrap());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let path = temp_path("partial");
        std::fs::write(&path, "[backtest]\nwindow_size = 3\nfreq = \"1\"\n").unwrap();

        let manager = ConfigManager::new();
        manager.load_from_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        let config = manager.get().unwrap();
        assert_eq!(config.backtest.window_size, 3);
        assert_eq!(config.backtest.freq, Frequency::Steps(1));
        assert_eq!(config.backtest.n_windows, 2);
        assert_eq!(config.series, SeriesConfig::default());
    }

    #[test]
    fn test_invalid_update_is_rejected() {
        let manager = ConfigManager::new();
        let result = manager.update(|c| c.backtest.window_size = 0);
        assert!(result.is_err());
        assert_eq!(manager.get().unwrap().backtest.window_size, 7);
    }

    #[test]
    fn test_environment_overrides_file() {
        let path = temp_path("env");
        std::fs::write(&path, "[backtest]\nn_windows = 3\n").unwrap();

        let mut vars = config::Map::new();
        vars.insert("BACKTEST_BACKTEST__N_WINDOWS".to_string(), "4".to_string());
        vars.insert("BACKTEST_BACKTEST__COLUMNS__ID_COL".to_string(), "series".to_string());
        vars.insert("BACKTEST_SERIES__SEED".to_string(), "9".to_string());
        vars.insert("OTHER_BACKTEST__WINDOW_SIZE".to_string(), "1".to_string());

        let manager = ConfigManager::new();
        manager.load(&path, env_overrides(Some(vars))).unwrap();
        std::fs::remove_file(&path).unwrap();

        let config = manager.get().unwrap();
        assert_eq!(config.backtest.n_windows, 4);
        assert_eq!(config.backtest.columns.id_col, "series");
        assert_eq!(config.backtest.window_size, 7);
        assert_eq!(config.series.seed, 9);
    }

    #[test]
    fn test_validation_errors_name_the_section() {
        let config = AppConfig {
            series: SeriesConfig {
                n_series: 0,
                ..SeriesConfig::default()
            },
            ..AppConfig::default()
        };
        match config.validate() {
            Err(ForecastError::Configuration(msg)) => assert!(msg.starts_with("[series]")),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_invalid_file_is_rejected() {
        let path = temp_path("invalid");
        std::fs::write(&path, "[series]\nmin_length = 10\nmax_length = 5\n").unwrap();

        let manager = ConfigManager::new();
        assert!(manager.load_from_file(&path).is_err());
        std::fs::remove_file(&path).unwrap();
    }
}

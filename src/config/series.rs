use super::traits::ConfigSection;
use crate::error::ForecastError;
use serde::{Deserialize, Serialize};

/// Shape of a synthetic daily panel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeriesConfig {
    pub n_series: usize,
    pub min_length: usize,
    pub max_length: usize,
    pub n_static_features: usize,
    /// Store `static_{i}` columns as categoricals instead of integers
    pub static_as_categorical: bool,
    pub equal_ends: bool,
    pub seed: u64,
}

impl Default for SeriesConfig {
    fn default() -> Self {
        Self {
            n_series: 10,
            min_length: 50,
            max_length: 500,
            n_static_features: 0,
            static_as_categorical: true,
            equal_ends: false,
            seed: 0,
        }
    }
}

impl SeriesConfig {
    pub fn new(n_series: usize) -> Self {
        Self {
            n_series,
            ..Self::default()
        }
    }
}

impl ConfigSection for SeriesConfig {
    fn section_name() -> &'static str {
        "series"
    }

    fn validate(&self) -> Result<(), ForecastError> {
        if self.n_series == 0 {
            return Err(ForecastError::Configuration(
                "Number of series must be at least 1".to_string()
            ));
        }
        if self.min_length == 0 {
            return Err(ForecastError::Configuration(
                "Minimum series length must be at least 1".to_string()
            ));
        }
        if self.min_length > self.max_length {
            return Err(ForecastError::Configuration(format!(
                "Minimum length {} exceeds maximum length {}",
                self.min_length, self.max_length
            )));
        }
        Ok(())
    }
}

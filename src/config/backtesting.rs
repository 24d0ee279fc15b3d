use super::traits::ConfigSection;
use crate::data::time::Frequency;
use crate::error::ForecastError;
use crate::types::PanelColumns;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestConfig {
    pub n_windows: usize,
    pub window_size: usize,
    pub freq: Frequency,
    pub columns: PanelColumns,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            n_windows: 2,
            window_size: 7,
            freq: Frequency::days(1),
            columns: PanelColumns::default(),
        }
    }
}

impl ConfigSection for BacktestConfig {
    fn section_name() -> &'static str {
        "backtest"
    }

    fn validate(&self) -> Result<(), ForecastError> {
        if self.n_windows == 0 {
            return Err(ForecastError::Configuration(
                "Number of windows must be at least 1".to_string()
            ));
        }
        if self.window_size == 0 {
            return Err(ForecastError::Configuration(
                "Window size must be at least 1".to_string()
            ));
        }
        if !self.freq.is_positive() {
            return Err(ForecastError::Configuration(
                "Frequency must be a positive step".to_string()
            ));
        }
        let columns = &self.columns;
        if columns.id_col == columns.time_col
            || columns.id_col == columns.target_col
            || columns.time_col == columns.target_col
        {
            return Err(ForecastError::Configuration(
                "Id, time and target columns must have distinct names".to_string()
            ));
        }
        Ok(())
    }
}

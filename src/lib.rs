pub mod config;
pub mod data;
pub mod error;
pub mod splitters;
pub mod types;

pub use data::{
    data_indptr_from_sorted, ensure_sorted, generate_daily_series, generate_prices_for_series,
    Frequency, GroupedArray, PartitionedFrame,
};
pub use error::{ForecastError, Result};
pub use splitters::{backtest_splits, split_info, BacktestSplit, BacktestSplits, PanelFrame};
pub use types::PanelColumns;

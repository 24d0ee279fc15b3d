pub mod traits;
pub mod backtesting;
pub mod series;
pub mod manager;

pub use manager::{ConfigManager, AppConfig};
pub use backtesting::BacktestConfig;
pub use series::SeriesConfig;
pub use traits::ConfigSection;

pub mod base;
pub mod rolling;
pub mod types;
pub mod window;

pub use base::PanelFrame;
pub use rolling::{backtest_splits, BacktestSplits};
pub use types::{BacktestSplit, WindowPlan, WindowSummary};
pub use window::{split_info, WindowPlanner};

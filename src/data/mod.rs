pub mod generators;
pub mod grouped;
pub mod partitioned;
pub mod sorting;
pub mod time;

pub use generators::{generate_daily_series, generate_prices_for_series};
pub use grouped::{data_indptr_from_sorted, group_offsets, GroupedArray};
pub use partitioned::PartitionedFrame;
pub use sorting::{ensure_sorted, is_sorted};
pub use time::{Frequency, TimeAxis};

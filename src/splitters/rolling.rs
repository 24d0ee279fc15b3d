use super::base::PanelFrame;
use super::types::{BacktestSplit, WindowPlan};
use super::window::WindowPlanner;
use crate::data::time::Frequency;
use crate::error::{ForecastError, Result};
use crate::types::PanelColumns;
use polars::prelude::*;
use rayon::prelude::*;
use std::iter::FusedIterator;

/// Lazy rolling-window backtest over a panel table.
///
/// Yields exactly `n_windows` splits. Window `i` validates on the
/// `window_size` steps that start `(n_windows - i) * window_size` steps
/// before each group's last timestamp, and trains on everything up to that
/// point. Nothing is computed until [`Iterator::next`] is called; after an
/// error the iterator is exhausted.
pub struct BacktestSplits<F: PanelFrame> {
    frame: F,
    columns: PanelColumns,
    n_windows: usize,
    window_size: usize,
    freq: Frequency,
    planners: Option<Vec<WindowPlanner>>,
    next_index: usize,
}

/// Rolling-window train/validation splits of `frame`.
///
/// The frame is sorted by (group, time) once, up front; the caller's frame
/// is left untouched.
pub fn backtest_splits<F: PanelFrame>(
    frame: &F,
    n_windows: usize,
    window_size: usize,
    freq: Frequency,
    cols: &PanelColumns,
) -> Result<BacktestSplits<F>> {
    BacktestSplits::new(frame, n_windows, window_size, freq, cols)
}

impl<F: PanelFrame> BacktestSplits<F> {
    pub fn new(
        frame: &F,
        n_windows: usize,
        window_size: usize,
        freq: Frequency,
        cols: &PanelColumns,
    ) -> Result<Self> {
        if n_windows == 0 {
            return Err(ForecastError::Configuration(
                "Number of windows must be at least 1".to_string(),
            ));
        }
        if window_size == 0 {
            return Err(ForecastError::Configuration(
                "Window size must be at least 1".to_string(),
            ));
        }
        if !freq.is_positive() {
            return Err(ForecastError::Configuration(format!(
                "Frequency must be a positive step, got '{}'",
                freq
            )));
        }

        Ok(Self {
            frame: frame.sorted(cols)?,
            columns: cols.clone(),
            n_windows,
            window_size,
            freq,
            planners: None,
            next_index: 0,
        })
    }

    pub fn n_windows(&self) -> usize {
        self.n_windows
    }

    /// Steps back from each group's end used by window `window`
    pub fn offset(&self, window: usize) -> usize {
        (self.n_windows - window) * self.window_size
    }

    fn split(&mut self, window: usize) -> Result<BacktestSplit<F>> {
        if self.planners.is_none() {
            let columns = &self.columns;
            let built = self.frame.map_partitions(|df| WindowPlanner::new(df, columns))?;
            self.planners = Some(built);
        }
        let planners = self.planners.as_deref().unwrap_or_default();

        let offset = self.offset(window);
        let plans = planners
            .par_iter()
            .map(|planner| planner.plan(offset, self.window_size, &self.freq))
            .collect::<Result<Vec<_>>>()?;

        let Some(plan) = WindowPlan::concat(plans)? else {
            return Ok(BacktestSplit {
                window,
                cutoffs: WindowPlan::empty_cutoffs(&self.columns)?,
                train: self.frame.filter_rows(&BooleanChunked::from_slice("is_train".into(), &[]))?,
                valid: self.frame.filter_rows(&BooleanChunked::from_slice("is_valid".into(), &[]))?,
            });
        };

        let train = self.frame.filter_rows(&plan.train_mask())?;
        let valid = self.frame.filter_rows(&plan.valid_mask())?;
        let cutoffs = plan.cutoffs()?;

        log::debug!(
            "Window {}/{} (offset {}): {} cutoffs, {} train rows, {} valid rows",
            window + 1,
            self.n_windows,
            offset,
            cutoffs.height(),
            train.height(),
            valid.height()
        );
        if cutoffs.height() == 0 {
            log::warn!(
                "Window {} has no validation rows in any group (offset {} x '{}')",
                window,
                offset,
                self.freq
            );
        }

        Ok(BacktestSplit {
            window,
            cutoffs,
            train,
            valid,
        })
    }
}

impl<F: PanelFrame> Iterator for BacktestSplits<F> {
    type Item = Result<BacktestSplit<F>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next_index >= self.n_windows {
            return None;
        }

        let window = self.next_index;
        self.next_index += 1;

        let result = self.split(window);
        if result.is_err() {
            self.next_index = self.n_windows;
        }
        Some(result)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.n_windows - self.next_index;
        (remaining, Some(remaining))
    }
}

impl<F: PanelFrame> ExactSizeIterator for BacktestSplits<F> {}

impl<F: PanelFrame> FusedIterator for BacktestSplits<F> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::partitioned::PartitionedFrame;
    use polars::df;

    fn panel() -> DataFrame {
        df! {
            "unique_id" => &["a"; 10],
            "ds" => &[1i64, 2, 3, 4, 5, 6, 7, 8, 9, 10],
            "y" => &[0.0; 10],
        }
        .unwrap()
    }

    #[test]
    fn test_rejects_empty_configuration() {
        let df = panel();
        let cols = PanelColumns::default();
        assert!(backtest_splits(&df, 0, 3, Frequency::Steps(1), &cols).is_err());
        assert!(backtest_splits(&df, 2, 0, Frequency::Steps(1), &cols).is_err());
        assert!(backtest_splits(&df, 2, 3, Frequency::Steps(0), &cols).is_err());
    }

    #[test]
    fn test_offsets_walk_forward() {
        let splits = backtest_splits(&panel(), 3, 2, Frequency::Steps(1), &PanelColumns::default()).unwrap();
        assert_eq!(splits.offset(0), 6);
        assert_eq!(splits.offset(1), 4);
        assert_eq!(splits.offset(2), 2);
        assert_eq!(splits.len(), 3);
    }

    #[test]
    fn test_fused_after_error() {
        // Step shift overflows on the first window
        let df = df! {
            "unique_id" => &["a"],
            "ds" => &[i64::MIN + 1],
            "y" => &[0.0],
        }
        .unwrap();

        let mut splits = backtest_splits(&df, 2, 1, Frequency::Steps(1), &PanelColumns::default()).unwrap();
        assert!(splits.next().unwrap().is_err());
        assert!(splits.next().is_none());
    }

    #[test]
    fn test_frame_without_chunks_keeps_cutoff_columns() {
        let frame = PartitionedFrame::new(Vec::new());
        let mut splits = backtest_splits(&frame, 1, 1, Frequency::Steps(1), &PanelColumns::default()).unwrap();
        let split = splits.next().unwrap().unwrap();

        let names: Vec<String> = split.cutoffs.get_column_names().iter().map(|n| n.to_string()).collect();
        assert_eq!(names, vec!["unique_id", "cutoff"]);
        assert_eq!(split.cutoffs.height(), 0);
        assert_eq!(split.train.n_partitions(), 0);
    }

    #[test]
    fn test_empty_partitioned_frame_matches_in_memory_schema() {
        let cols = PanelColumns::default();
        let df = panel().clear();
        let frame = PartitionedFrame::from_sorted(&df, 2, &cols).unwrap();

        let chunked = backtest_splits(&frame, 1, 1, Frequency::Steps(1), &cols).unwrap().next().unwrap().unwrap();
        let whole = backtest_splits(&df, 1, 1, Frequency::Steps(1), &cols).unwrap().next().unwrap().unwrap();
        assert_eq!(chunked.cutoffs.schema(), whole.cutoffs.schema());
        assert_eq!(chunked.cutoffs.column("cutoff").unwrap().dtype(), &DataType::Int64);
    }

    #[test]
    fn test_empty_frame_yields_empty_splits() {
        let df = panel().slice(0, 0);
        let splits: Vec<_> = backtest_splits(&df, 2, 1, Frequency::Steps(1), &PanelColumns::default())
            .unwrap()
            .collect::<Result<Vec<_>>>()
            .unwrap();
        assert_eq!(splits.len(), 2);
        assert!(splits.iter().all(|s| s.train.height() == 0 && s.valid.height() == 0));
    }
}

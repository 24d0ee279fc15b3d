use super::types::{WindowPlan, TRAIN_END_COL};
use crate::data::grouped::group_offsets;
use crate::data::sorting::group_keys;
use crate::data::time::{Frequency, TimeAxis};
use crate::error::{ForecastError, Result};
use crate::types::PanelColumns;
use polars::prelude::*;

/// Computes per-row train/validation assignments over a group-sorted table.
///
/// Group boundaries, timestamps and each group's last timestamp do not
/// depend on the window, so they are gathered once here and reused by
/// every call to [`plan`](Self::plan).
#[derive(Debug, Clone)]
pub struct WindowPlanner {
    ids: Column,
    times: TimeAxis,
    indptr: Vec<usize>,
    last_dates: Vec<i64>,
}

impl WindowPlanner {
    /// `df` must be sorted by (group, time)
    pub fn new(df: &DataFrame, cols: &PanelColumns) -> Result<Self> {
        let ids = df.column(&cols.id_col)?.clone();
        let keys = group_keys(&ids)?;
        let indptr = group_offsets(&keys);
        let times = TimeAxis::from_column(df.column(&cols.time_col)?)?;

        let last_dates = indptr
            .windows(2)
            .map(|w| times.values()[w[0]..w[1]].iter().copied().max().unwrap_or(i64::MIN))
            .collect();

        Ok(Self {
            ids,
            times,
            indptr,
            last_dates,
        })
    }

    pub fn n_groups(&self) -> usize {
        self.indptr.len() - 1
    }

    /// Assign rows to the window that starts `offset` steps before each group's end.
    ///
    /// For every row of a group whose last timestamp is `last`:
    /// `train_end = last - offset * freq`, `valid_end = last - (offset - window_size) * freq`,
    /// the row is valid when `train_end < ds <= valid_end` and in train when
    /// `ds <= train_end`. Both bounds are measured from `last`, so consecutive
    /// windows share their boundary even for calendar-month steps. A group that
    /// has no rows in that range simply gets an empty window.
    pub fn plan(&self, offset: usize, window_size: usize, freq: &Frequency) -> Result<WindowPlan> {
        let back = i64::try_from(offset)
            .map_err(|_| ForecastError::InvalidInput(format!("Window offset {} is too large", offset)))?;
        let span = i64::try_from(window_size)
            .map_err(|_| ForecastError::InvalidInput(format!("Window size {} is too large", window_size)))?;

        let n_rows = self.times.len();
        let mut train_end = Vec::with_capacity(n_rows);
        let mut is_valid = Vec::with_capacity(n_rows);
        let mut is_train = Vec::with_capacity(n_rows);
        let mut is_cutoff = Vec::with_capacity(n_rows);

        for (bounds, &last) in self.indptr.windows(2).zip(&self.last_dates) {
            let group_train_end = self.times.shift(last, -back, freq)?;
            let group_valid_end = self.times.shift(last, span - back, freq)?;

            let mut has_valid = false;
            for &ds in &self.times.values()[bounds[0]..bounds[1]] {
                let valid = ds > group_train_end && ds <= group_valid_end;
                train_end.push(group_train_end);
                is_valid.push(valid);
                is_train.push(ds <= group_train_end);
                is_cutoff.push(valid && !has_valid);
                has_valid |= valid;
            }
        }

        Ok(WindowPlan {
            ids: self.ids.clone(),
            train_end: self.times.to_column(TRAIN_END_COL, train_end)?,
            is_valid,
            is_train,
            is_cutoff,
        })
    }
}

/// `[id, train_end, is_valid]` for every row of a group-sorted table
pub fn split_info(
    df: &DataFrame,
    offset: usize,
    window_size: usize,
    freq: &Frequency,
    cols: &PanelColumns,
) -> Result<DataFrame> {
    WindowPlanner::new(df, cols)?
        .plan(offset, window_size, freq)?
        .to_frame()
}

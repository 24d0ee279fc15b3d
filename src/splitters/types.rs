use super::base::PanelFrame;
use crate::error::Result;
use crate::types::PanelColumns;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

pub const TRAIN_END_COL: &str = "train_end";
pub const IS_VALID_COL: &str = "is_valid";
pub const CUTOFF_COL: &str = "cutoff";

/// Per-row window assignment for one backtest iteration
#[derive(Debug, Clone)]
pub struct WindowPlan {
    pub(crate) ids: Column,
    pub(crate) train_end: Column,
    pub(crate) is_valid: Vec<bool>,
    pub(crate) is_train: Vec<bool>,
    /// First validation row of each group
    pub(crate) is_cutoff: Vec<bool>,
}

impl WindowPlan {
    pub fn len(&self) -> usize {
        self.is_valid.len()
    }

    pub fn is_empty(&self) -> bool {
        self.is_valid.is_empty()
    }

    pub fn train_end(&self) -> &Column {
        &self.train_end
    }

    pub fn is_valid(&self) -> &[bool] {
        &self.is_valid
    }

    /// Rows with `ds <= train_end`
    pub fn train_mask(&self) -> BooleanChunked {
        BooleanChunked::from_slice("is_train".into(), &self.is_train)
    }

    pub fn valid_mask(&self) -> BooleanChunked {
        BooleanChunked::from_slice(IS_VALID_COL.into(), &self.is_valid)
    }

    /// `[id, train_end, is_valid]`, one row per input row
    pub fn to_frame(&self) -> Result<DataFrame> {
        Ok(DataFrame::new(vec![
            self.ids.clone(),
            self.train_end.clone(),
            Column::new(IS_VALID_COL.into(), &self.is_valid),
        ])?)
    }

    /// `train_end` of every group with a non-empty validation window, as `[id, cutoff]`
    pub fn cutoffs(&self) -> Result<DataFrame> {
        let frame = DataFrame::new(vec![
            self.ids.clone(),
            self.train_end.clone().with_name(CUTOFF_COL.into()),
        ])?;
        let mask = BooleanChunked::from_slice("is_cutoff".into(), &self.is_cutoff);
        Ok(frame.filter(&mask)?)
    }

    /// `[id, cutoff]` with no rows, for a frame without any chunks to take dtypes from
    pub fn empty_cutoffs(cols: &PanelColumns) -> Result<DataFrame> {
        Ok(DataFrame::new(vec![
            Column::new_empty(cols.id_col.as_str().into(), &DataType::Null),
            Column::new_empty(CUTOFF_COL.into(), &DataType::Null),
        ])?)
    }

    /// Join per-chunk plans in chunk order
    pub fn concat(plans: Vec<WindowPlan>) -> Result<Option<WindowPlan>> {
        let mut plans = plans.into_iter();
        let Some(mut out) = plans.next() else {
            return Ok(None);
        };

        for plan in plans {
            out.ids.append(&plan.ids)?;
            out.train_end.append(&plan.train_end)?;
            out.is_valid.extend(plan.is_valid);
            out.is_train.extend(plan.is_train);
            out.is_cutoff.extend(plan.is_cutoff);
        }
        Ok(Some(out))
    }
}

/// One backtest window: cutoffs plus the train and validation subsets
#[derive(Debug, Clone)]
pub struct BacktestSplit<F> {
    pub window: usize,
    pub cutoffs: DataFrame,
    pub train: F,
    pub valid: F,
}

impl<F: PanelFrame> BacktestSplit<F> {
    pub fn summary(&self) -> WindowSummary {
        WindowSummary {
            window: self.window,
            n_cutoffs: self.cutoffs.height(),
            train_rows: self.train.height(),
            valid_rows: self.valid.height(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowSummary {
    pub window: usize,
    pub n_cutoffs: usize,
    pub train_rows: usize,
    pub valid_rows: usize,
}

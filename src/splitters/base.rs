use super::window::split_info;
use crate::data::partitioned::{concat_frames, PartitionedFrame};
use crate::data::sorting::ensure_sorted;
use crate::data::time::Frequency;
use crate::error::{ForecastError, Result};
use crate::types::PanelColumns;
use polars::prelude::*;
use rayon::prelude::*;

/// A table-like object the window computation can run over.
///
/// Implemented for an in-memory [`DataFrame`] and for a [`PartitionedFrame`],
/// where every chunk is processed independently and results are concatenated
/// in chunk order.
pub trait PanelFrame: Sized + Send + Sync {
    /// Total number of rows
    fn height(&self) -> usize;

    /// Apply a pure per-chunk function, collecting one result per chunk
    fn map_partitions<T, F>(&self, f: F) -> Result<Vec<T>>
    where
        T: Send,
        F: Fn(&DataFrame) -> Result<T> + Send + Sync;

    /// Order rows by (group, time) within every chunk
    fn sorted(&self, cols: &PanelColumns) -> Result<Self>;

    /// Keep the rows flagged in `mask`, aligned with the concatenated row order
    fn filter_rows(&self, mask: &BooleanChunked) -> Result<Self>;

    /// Per-row `train_end` and `is_valid` for one window, concatenated across chunks
    fn split_info(
        &self,
        offset: usize,
        window_size: usize,
        freq: &Frequency,
        cols: &PanelColumns,
    ) -> Result<DataFrame> {
        let frames = self.map_partitions(|df| split_info(df, offset, window_size, freq, cols))?;
        concat_frames(&frames)
    }
}

impl PanelFrame for DataFrame {
    fn height(&self) -> usize {
        DataFrame::height(self)
    }

    fn map_partitions<T, F>(&self, f: F) -> Result<Vec<T>>
    where
        T: Send,
        F: Fn(&DataFrame) -> Result<T> + Send + Sync,
    {
        Ok(vec![f(self)?])
    }

    fn sorted(&self, cols: &PanelColumns) -> Result<Self> {
        ensure_sorted(self, cols)
    }

    fn filter_rows(&self, mask: &BooleanChunked) -> Result<Self> {
        Ok(self.filter(mask)?)
    }
}

impl PanelFrame for PartitionedFrame {
    fn height(&self) -> usize {
        self.partitions().iter().map(|p| p.height()).sum()
    }

    fn map_partitions<T, F>(&self, f: F) -> Result<Vec<T>>
    where
        T: Send,
        F: Fn(&DataFrame) -> Result<T> + Send + Sync,
    {
        self.partitions().par_iter().map(|p| f(p)).collect()
    }

    fn sorted(&self, cols: &PanelColumns) -> Result<Self> {
        Ok(PartitionedFrame::new(self.map_partitions(|df| ensure_sorted(df, cols))?))
    }

    fn filter_rows(&self, mask: &BooleanChunked) -> Result<Self> {
        if mask.len() != PanelFrame::height(self) {
            return Err(ForecastError::InvalidInput(format!(
                "Row mask has {} entries for a frame with {} rows",
                mask.len(),
                PanelFrame::height(self)
            )));
        }

        let mut offset = 0;
        let mut chunks = Vec::with_capacity(self.n_partitions());
        for partition in self.partitions() {
            let chunk_mask = mask.slice(offset as i64, partition.height());
            chunks.push(partition.filter(&chunk_mask)?);
            offset += partition.height();
        }
        Ok(PartitionedFrame::new(chunks))
    }
}

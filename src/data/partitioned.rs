use super::grouped::group_offsets;
use super::sorting::group_keys;
use crate::error::{ForecastError, Result};
use crate::types::PanelColumns;
use polars::prelude::*;

/// A panel table split into chunks, each holding complete groups.
///
/// No group may span two chunks. Row identity is the concatenation of the
/// chunks in order.
#[derive(Debug, Clone, Default)]
pub struct PartitionedFrame {
    partitions: Vec<DataFrame>,
}

impl PartitionedFrame {
    pub fn new(partitions: Vec<DataFrame>) -> Self {
        Self { partitions }
    }

    /// Split a group-sorted frame into at most `n_partitions` chunks along group boundaries.
    ///
    /// An empty frame becomes a single empty chunk so its schema survives.
    pub fn from_sorted(df: &DataFrame, n_partitions: usize, cols: &PanelColumns) -> Result<Self> {
        if n_partitions == 0 {
            return Err(ForecastError::Configuration(
                "Number of partitions must be at least 1".to_string(),
            ));
        }

        let keys = group_keys(df.column(&cols.id_col)?)?;
        let indptr = group_offsets(&keys);
        let n_groups = indptr.len() - 1;
        let groups_per_partition = n_groups.div_ceil(n_partitions).max(1);

        let mut partitions: Vec<DataFrame> = indptr
            .iter()
            .step_by(groups_per_partition)
            .zip(
                indptr
                    .iter()
                    .skip(groups_per_partition)
                    .step_by(groups_per_partition)
                    .chain(indptr.last()),
            )
            .filter(|(start, end)| end > start)
            .map(|(&start, &end)| df.slice(start as i64, end - start))
            .collect();
        if partitions.is_empty() {
            partitions.push(df.clear());
        }

        Ok(Self { partitions })
    }

    pub fn partitions(&self) -> &[DataFrame] {
        &self.partitions
    }

    pub fn n_partitions(&self) -> usize {
        self.partitions.len()
    }

    /// Concatenate all chunks into a single frame
    pub fn collect(&self) -> Result<DataFrame> {
        concat_frames(&self.partitions)
    }
}

pub(crate) fn concat_frames(frames: &[DataFrame]) -> Result<DataFrame> {
    let Some((first, rest)) = frames.split_first() else {
        return Ok(DataFrame::empty());
    };

    let mut out = first.clone();
    for frame in rest {
        out.vstack_mut(frame)?;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::df;

    fn panel() -> DataFrame {
        df! {
            "unique_id" => &["a", "a", "b", "c", "c", "c", "d"],
            "ds" => &[1i64, 2, 1, 1, 2, 3, 1],
            "y" => &[0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0],
        }
        .unwrap()
    }

    #[test]
    fn test_partitions_keep_groups_whole() {
        let frame = PartitionedFrame::from_sorted(&panel(), 2, &PanelColumns::default()).unwrap();
        assert_eq!(frame.n_partitions(), 2);
        assert_eq!(frame.partitions()[0].height(), 3); // a, b
        assert_eq!(frame.partitions()[1].height(), 4); // c, d
    }

    #[test]
    fn test_more_partitions_than_groups() {
        let frame = PartitionedFrame::from_sorted(&panel(), 10, &PanelColumns::default()).unwrap();
        assert_eq!(frame.n_partitions(), 4);
        assert!(frame.collect().unwrap().equals(&panel()));
    }

    #[test]
    fn test_empty_frame_keeps_schema() {
        let frame = PartitionedFrame::from_sorted(&panel().clear(), 3, &PanelColumns::default()).unwrap();
        assert_eq!(frame.n_partitions(), 1);
        assert_eq!(frame.partitions()[0].height(), 0);
        assert_eq!(frame.partitions()[0].schema(), panel().schema());
    }

    #[test]
    fn test_zero_partitions_rejected() {
        assert!(PartitionedFrame::from_sorted(&panel(), 0, &PanelColumns::default()).is_err());
    }
}

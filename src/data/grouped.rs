use super::sorting::group_keys;
use crate::error::Result;
use crate::types::PanelColumns;
use polars::prelude::*;

/// Offsets delimiting each contiguous run of equal keys.
///
/// Runs are counted in encounter order and prefix-summed behind a leading 0,
/// so the result has one more element than there are runs and ends at
/// `keys.len()`. Keys must already be group-contiguous: a group split into
/// several runs is reported as several groups.
pub fn group_offsets<T: PartialEq>(keys: &[T]) -> Vec<usize> {
    let mut sizes: Vec<usize> = Vec::new();

    for (i, key) in keys.iter().enumerate() {
        if i > 0 && keys[i - 1] == *key {
            if let Some(size) = sizes.last_mut() {
                *size += 1;
            }
        } else {
            sizes.push(1);
        }
    }

    let mut indptr = Vec::with_capacity(sizes.len() + 1);
    indptr.push(0);
    let mut total = 0;
    for size in sizes {
        total += size;
        indptr.push(total);
    }
    indptr
}

/// Target values in row order together with the group offset index.
///
/// `df` must be sorted by group (see [`ensure_sorted`](super::sorting::ensure_sorted)).
/// Null targets become NaN.
pub fn data_indptr_from_sorted(df: &DataFrame, cols: &PanelColumns) -> Result<(Vec<f64>, Vec<usize>)> {
    let keys = group_keys(df.column(&cols.id_col)?)?;
    let indptr = group_offsets(&keys);

    let target = df.column(&cols.target_col)?.cast(&DataType::Float64)?;
    let data: Vec<f64> = target
        .f64()?
        .iter()
        .map(|v| v.unwrap_or(f64::NAN))
        .collect();

    Ok((data, indptr))
}

/// Flat target values of a group-sorted panel with per-group slice access
#[derive(Debug, Clone, PartialEq)]
pub struct GroupedArray {
    data: Vec<f64>,
    indptr: Vec<usize>,
}

impl GroupedArray {
    pub fn new(data: Vec<f64>, indptr: Vec<usize>) -> Self {
        debug_assert_eq!(indptr.first().copied(), Some(0));
        debug_assert_eq!(indptr.last().copied(), Some(data.len()));
        Self { data, indptr }
    }

    pub fn from_sorted(df: &DataFrame, cols: &PanelColumns) -> Result<Self> {
        let (data, indptr) = data_indptr_from_sorted(df, cols)?;
        Ok(Self::new(data, indptr))
    }

    pub fn n_groups(&self) -> usize {
        self.indptr.len() - 1
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn data(&self) -> &[f64] {
        &self.data
    }

    pub fn indptr(&self) -> &[usize] {
        &self.indptr
    }

    pub fn group(&self, idx: usize) -> Option<&[f64]> {
        let start = *self.indptr.get(idx)?;
        let end = *self.indptr.get(idx + 1)?;
        Some(&self.data[start..end])
    }

    pub fn iter_groups(&self) -> impl Iterator<Item = &[f64]> + '_ {
        self.indptr.windows(2).map(|w| &self.data[w[0]..w[1]])
    }
}

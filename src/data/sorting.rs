use super::time::TimeAxis;
use crate::error::{ForecastError, Result};
use crate::types::{GroupKey, PanelColumns};
use polars::prelude::*;

/// Extract the group identifier of every row
pub fn group_keys(column: &Column) -> Result<Vec<GroupKey>> {
    if column.null_count() > 0 {
        return Err(ForecastError::InvalidInput(format!(
            "Column '{}' contains {} null group ids",
            column.name(),
            column.null_count()
        )));
    }

    let keys = match column.dtype() {
        DataType::String => string_keys(column)?,
        DataType::Categorical(..) | DataType::Enum(..) => {
            string_keys(&column.cast(&DataType::String)?)?
        }
        dtype if dtype.is_integer() => {
            let physical = column.cast(&DataType::Int64)?;
            physical.i64()?.into_no_null_iter().map(GroupKey::Int).collect()
        }
        other => {
            return Err(ForecastError::InvalidInput(format!(
                "Column '{}' has unsupported group id dtype {:?}",
                column.name(),
                other
            )))
        }
    };

    Ok(keys)
}

fn string_keys(column: &Column) -> Result<Vec<GroupKey>> {
    Ok(column
        .str()?
        .into_no_null_iter()
        .map(|id| GroupKey::Str(id.to_string()))
        .collect())
}

/// Turn group keys back into a column
pub(crate) fn keys_to_column(name: &str, keys: &[GroupKey]) -> Column {
    match keys.first() {
        Some(GroupKey::Int(_)) => {
            let values: Vec<i64> = keys
                .iter()
                .filter_map(|key| match key {
                    GroupKey::Int(v) => Some(*v),
                    GroupKey::Str(_) => None,
                })
                .collect();
            Column::new(name.into(), values)
        }
        _ => {
            let values: Vec<&str> = keys
                .iter()
                .filter_map(|key| match key {
                    GroupKey::Str(s) => Some(s.as_str()),
                    GroupKey::Int(_) => None,
                })
                .collect();
            Column::new(name.into(), values)
        }
    }
}

fn is_sorted_by_key(keys: &[GroupKey], times: &[i64]) -> bool {
    keys.windows(2)
        .zip(times.windows(2))
        .all(|(k, t)| (&k[0], t[0]) <= (&k[1], t[1]))
}

/// Whether rows are ordered by group id, then by time
pub fn is_sorted(df: &DataFrame, cols: &PanelColumns) -> Result<bool> {
    let keys = group_keys(df.column(&cols.id_col)?)?;
    let times = TimeAxis::from_column(df.column(&cols.time_col)?)?;
    Ok(is_sorted_by_key(&keys, times.values()))
}

/// Return `df` ordered by (group id, time).
///
/// An already ordered frame is returned as is; otherwise rows are stably
/// re-sorted into a new frame. The input frame is never modified.
pub fn ensure_sorted(df: &DataFrame, cols: &PanelColumns) -> Result<DataFrame> {
    let keys = group_keys(df.column(&cols.id_col)?)?;
    let times = TimeAxis::from_column(df.column(&cols.time_col)?)?;
    let times = times.values();

    if is_sorted_by_key(&keys, times) {
        return Ok(df.clone());
    }

    log::debug!(
        "Sorting {} rows by ('{}', '{}')",
        df.height(),
        cols.id_col,
        cols.time_col
    );

    let mut order: Vec<IdxSize> = (0..df.height() as IdxSize).collect();
    order.sort_by(|&a, &b| {
        let (a, b) = (a as usize, b as usize);
        (&keys[a], times[a]).cmp(&(&keys[b], times[b]))
    });

    let indices = IdxCa::from_vec("order".into(), order);
    Ok(df.take(&indices)?)
}

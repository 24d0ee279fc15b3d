use crate::data::sorting::{group_keys, keys_to_column};
use crate::data::time::{Frequency, TimeAxis, TimeKind};
use crate::error::{ForecastError, Result};
use crate::types::{GroupKey, PanelColumns};
use polars::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;

pub const PRODUCT_COL: &str = "product_id";
pub const PRICE_COL: &str = "price";

/// Daily price catalog covering every product's dates plus `horizon` days.
///
/// `series` must have a `product_id` column, a `Date` time column and all
/// groups must end on the same date. Returns `[ds, product_id, price]`
/// sorted by product, then date.
pub fn generate_prices_for_series(
    series: &DataFrame,
    horizon: usize,
    seed: u64,
    cols: &PanelColumns,
) -> Result<DataFrame> {
    let ids = group_keys(series.column(&cols.id_col)?)?;
    let times = TimeAxis::from_column(series.column(&cols.time_col)?)?;
    if times.kind() != TimeKind::Date {
        return Err(ForecastError::InvalidInput(format!(
            "Column '{}' must be a Date column to generate daily prices",
            cols.time_col
        )));
    }

    let mut last_dates: BTreeMap<&GroupKey, i64> = BTreeMap::new();
    for (id, &ds) in ids.iter().zip(times.values()) {
        let last = last_dates.entry(id).or_insert(ds);
        *last = (*last).max(ds);
    }
    let mut distinct_ends: Vec<i64> = last_dates.values().copied().collect();
    distinct_ends.sort_unstable();
    distinct_ends.dedup();
    if distinct_ends.len() > 1 {
        return Err(ForecastError::InvalidInput("series must have equal ends.".to_string()));
    }

    let products = match series.column(PRODUCT_COL) {
        Ok(column) => group_keys(column)?,
        Err(_) => {
            return Err(ForecastError::InvalidInput(
                "series must have a product_id column.".to_string(),
            ))
        }
    };

    let mut spans: BTreeMap<&GroupKey, (i64, i64)> = BTreeMap::new();
    for (product, &ds) in products.iter().zip(times.values()) {
        let span = spans.entry(product).or_insert((ds, ds));
        span.0 = span.0.min(ds);
        span.1 = span.1.max(ds);
    }

    let horizon = i64::try_from(horizon)
        .map_err(|_| ForecastError::InvalidInput(format!("Horizon {} is too large", horizon)))?;
    let day = Frequency::days(1);
    let mut rng = StdRng::seed_from_u64(seed);

    let mut ds: Vec<i64> = Vec::new();
    let mut product_ids: Vec<GroupKey> = Vec::new();
    let mut prices: Vec<f64> = Vec::new();
    for (&product, &(start, end)) in &spans {
        let last = times.shift(end, horizon, &day)?;
        for date in start..=last {
            ds.push(date);
            product_ids.push(product.clone());
            prices.push(rng.gen::<f64>());
        }
    }

    Ok(DataFrame::new(vec![
        times.to_column(&cols.time_col, ds)?,
        keys_to_column(PRODUCT_COL, &product_ids),
        Column::new(PRICE_COL.into(), prices),
    ])?)
}

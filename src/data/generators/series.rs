use crate::config::{ConfigSection, SeriesConfig};
use crate::error::{ForecastError, Result};
use crate::types::PanelColumns;
use chrono::{Duration, NaiveDate};
use polars::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Generate `n_series` daily series with lengths in `[min_length, max_length]`.
///
/// Every series starts on 2000-01-01, or with `equal_ends` every series ends
/// on the last of `max_length` days. Static features are columns `static_{i}`
/// holding a per-series value in `[0, 100)`, categorical unless
/// `static_as_categorical` is off; the first one also scales the target. Output is sorted by (id, date). The same seed always produces
/// the same panel.
pub fn generate_daily_series(config: &SeriesConfig, cols: &PanelColumns) -> Result<DataFrame> {
    config.validate()?;
    let mut rng = StdRng::seed_from_u64(config.seed);

    let lengths: Vec<usize> = (0..config.n_series)
        .map(|_| rng.gen_range(config.min_length..=config.max_length))
        .collect();
    let total_length: usize = lengths.iter().sum();
    let n_digits = (config.n_series as f64).log10().ceil() as usize;

    let start = NaiveDate::from_ymd_opt(2000, 1, 1)
        .ok_or_else(|| ForecastError::InvalidInput("Invalid start date".to_string()))?;
    let dates: Vec<NaiveDate> = (0..config.max_length)
        .map(|day| start + Duration::days(day as i64))
        .collect();

    let mut ids: Vec<String> = Vec::with_capacity(total_length);
    let mut ds: Vec<NaiveDate> = Vec::with_capacity(total_length);
    for (i, &length) in lengths.iter().enumerate() {
        let id = format!("id_{:0width$}", i, width = n_digits);
        let series_dates = if config.equal_ends {
            &dates[config.max_length - length..]
        } else {
            &dates[..length]
        };
        ids.extend(std::iter::repeat(id).take(length));
        ds.extend_from_slice(series_dates);
    }

    let mut y: Vec<f64> = (0..total_length)
        .map(|row| (row % 7) as f64 + rng.gen::<f64>() * 0.5)
        .collect();

    let mut static_columns = Vec::with_capacity(config.n_static_features);
    for feature in 0..config.n_static_features {
        let per_series: Vec<i64> = (0..config.n_series).map(|_| rng.gen_range(0..100)).collect();
        let values: Vec<i64> = per_series
            .iter()
            .zip(&lengths)
            .flat_map(|(&value, &length)| std::iter::repeat(value).take(length))
            .collect();

        if feature == 0 {
            for (target, &value) in y.iter_mut().zip(&values) {
                *target *= 1.0 + value as f64;
            }
        }
        let column = Column::new(format!("static_{}", feature).into(), values);
        static_columns.push(if config.static_as_categorical {
            column
                .cast(&DataType::String)?
                .cast(&DataType::from_categories(Categories::global()))?
        } else {
            column
        });
    }

    let mut columns = vec![
        Column::new(cols.id_col.as_str().into(), ids),
        Column::new(cols.time_col.as_str().into(), ds),
        Column::new(cols.target_col.as_str().into(), y),
    ];
    columns.extend(static_columns);

    log::debug!(
        "Generated {} series with {} rows (seed {})",
        config.n_series,
        total_length,
        config.seed
    );

    Ok(DataFrame::new(columns)?)
}

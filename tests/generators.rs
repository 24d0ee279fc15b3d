use backtest_splits::config::SeriesConfig;
use backtest_splits::data::sorting::is_sorted;
use backtest_splits::data::time::TimeAxis;
use backtest_splits::{
    data_indptr_from_sorted, ensure_sorted, generate_daily_series, generate_prices_for_series,
    PanelColumns,
};
use polars::prelude::*;
use std::collections::HashSet;

fn series_config(equal_ends: bool) -> SeriesConfig {
    SeriesConfig {
        n_series: 6,
        min_length: 10,
        max_length: 20,
        n_static_features: 2,
        static_as_categorical: false,
        equal_ends,
        seed: 42,
    }
}

fn days(df: &DataFrame, name: &str) -> Vec<i64> {
    TimeAxis::from_column(df.column(name).unwrap()).unwrap().values().to_vec()
}

#[test]
fn test_same_seed_same_panel() {
    let cols = PanelColumns::default();
    let a = generate_daily_series(&series_config(false), &cols).unwrap();
    let b = generate_daily_series(&series_config(false), &cols).unwrap();
    assert!(a.equals(&b));

    let other = SeriesConfig { seed: 43, ..series_config(false) };
    let c = generate_daily_series(&other, &cols).unwrap();
    assert!(!a.equals(&c));
}

#[test]
fn test_panel_columns_and_types() {
    let df = generate_daily_series(&series_config(false), &PanelColumns::default()).unwrap();
    let names: Vec<String> = df.get_column_names().iter().map(|n| n.to_string()).collect();
    assert_eq!(names, vec!["unique_id", "ds", "y", "static_0", "static_1"]);
    assert_eq!(df.column("ds").unwrap().dtype(), &DataType::Date);
    assert_eq!(df.column("unique_id").unwrap().dtype(), &DataType::String);
    assert_eq!(df.column("y").unwrap().dtype(), &DataType::Float64);
    assert_eq!(df.column("static_0").unwrap().dtype(), &DataType::Int64);
}

#[test]
fn test_categorical_static_features_can_be_grouped() {
    let config = SeriesConfig {
        static_as_categorical: true,
        ..series_config(false)
    };
    let series = generate_daily_series(&config, &PanelColumns::default()).unwrap();
    assert!(series.column("static_0").unwrap().dtype().is_categorical());

    let by_static = PanelColumns::new("static_0", "ds", "y");
    let sorted = ensure_sorted(&series, &by_static).unwrap();
    assert!(is_sorted(&sorted, &by_static).unwrap());
    assert!(sorted.column("static_0").unwrap().dtype().is_categorical());

    let (values, indptr) = data_indptr_from_sorted(&sorted, &by_static).unwrap();
    let distinct: HashSet<String> = series
        .column("static_0")
        .unwrap()
        .cast(&DataType::String)
        .unwrap()
        .str()
        .unwrap()
        .into_no_null_iter()
        .map(String::from)
        .collect();
    assert_eq!(indptr.len(), distinct.len() + 1);
    assert_eq!(values.len(), series.height());
}

#[test]
fn test_equal_ends() {
    let cols = PanelColumns::default();
    let df = generate_daily_series(&series_config(true), &cols).unwrap();
    let ds = days(&df, "ds");
    let last = *ds.iter().max().unwrap();

    let ids = df.column("unique_id").unwrap().str().unwrap();
    for i in 0..df.height() {
        let ends_series = i + 1 == df.height() || ids.get(i) != ids.get(i + 1);
        if ends_series {
            assert_eq!(ds[i], last);
        }
    }
}

#[test]
fn test_prices_cover_dates_plus_horizon() {
    let cols = PanelColumns::default();
    let mut series = generate_daily_series(&series_config(true), &cols).unwrap();
    let products: Vec<i64> = series
        .column("static_1")
        .unwrap()
        .i64()
        .unwrap()
        .into_no_null_iter()
        .map(|v| v % 3)
        .collect();
    series.with_column(Column::new("product_id".into(), products)).unwrap();

    let prices = generate_prices_for_series(&series, 7, 0, &cols).unwrap();
    let names: Vec<String> = prices.get_column_names().iter().map(|n| n.to_string()).collect();
    assert_eq!(names, vec!["ds", "product_id", "price"]);

    let series_days = days(&series, "ds");
    let price_days = days(&prices, "ds");
    let first = *series_days.iter().min().unwrap();
    let last = *series_days.iter().max().unwrap();
    assert!(price_days.iter().all(|d| *d >= first && *d <= last + 7));
    assert_eq!(*price_days.iter().max().unwrap(), last + 7);
    assert!(prices
        .column("price")
        .unwrap()
        .f64()
        .unwrap()
        .into_no_null_iter()
        .all(|p| (0.0..1.0).contains(&p)));
}

#[test]
fn test_prices_require_equal_ends_and_product_id() {
    let cols = PanelColumns::default();
    let unequal = generate_daily_series(&series_config(false), &cols).unwrap();
    assert!(generate_prices_for_series(&unequal, 7, 0, &cols).is_err());

    let equal = generate_daily_series(&series_config(true), &cols).unwrap();
    assert!(generate_prices_for_series(&equal, 7, 0, &cols).is_err());
}

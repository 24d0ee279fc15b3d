use backtest_splits::config::ConfigManager;
use backtest_splits::{backtest_splits, generate_daily_series};

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let manager = ConfigManager::new();
    if let Some(path) = std::env::args().nth(1) {
        manager.load_from_file(&path)?;
        log::info!("Using configuration from {}", path);
    }
    let config = manager.get()?;
    let backtest = &config.backtest;

    let series = generate_daily_series(&config.series, &backtest.columns)?;
    log::info!(
        "Generated {} rows across {} series",
        series.height(),
        config.series.n_series
    );

    let splits = backtest_splits(
        &series,
        backtest.n_windows,
        backtest.window_size,
        backtest.freq,
        &backtest.columns,
    )?;

    for split in splits {
        let split = split?;
        println!("{}", serde_json::to_string(&split.summary())?);
    }

    Ok(())
}

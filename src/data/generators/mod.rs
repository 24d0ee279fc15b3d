mod prices;
mod series;

pub use prices::generate_prices_for_series;
pub use series::generate_daily_series;

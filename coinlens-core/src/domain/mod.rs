//! Domain types for CoinLens

pub mod bar;
pub mod series;

pub use bar::Bar;
pub use series::{PriceSeries, SeriesError};

/// Asset identifier alias (e.g. "BTC", "ETH").
pub type Asset = String;

//! Deterministic synthetic fallback series.
//!
//! Used only when no real history can be read for an asset. The series is a
//! seeded random walk around a per-asset base price; callers learn it is
//! synthetic through `DataSource::Synthetic`, never by inspecting the bars.

use chrono::{Duration, NaiveDateTime};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::domain::{Bar, PriceSeries};

pub const SYNTHETIC_BARS: usize = 90;
pub const SYNTHETIC_DRIFT: f64 = 0.001;
pub const SYNTHETIC_VOLATILITY: f64 = 0.03;
/// Prices never fall below this fraction of the base price.
pub const SYNTHETIC_FLOOR_RATIO: f64 = 0.1;
pub const DEFAULT_BASE_PRICE: f64 = 100.0;

const BASE_PRICES: [(&str, f64); 22] = [
    ("BITCOIN", 45_000.0),
    ("ETHEREUM", 3_100.0),
    ("TETHER", 1.0),
    ("SOLANA", 180.0),
    ("CARDANO", 0.6),
    ("DOGECOIN", 0.15),
    ("BTC", 45_000.0),
    ("ETH", 3_100.0),
    ("BNB", 890.0),
    ("XRP", 0.62),
    ("ADA", 0.6),
    ("SOL", 180.0),
    ("DOT", 20.0),
    ("DOGE", 0.15),
    ("AVAX", 35.0),
    ("MATIC", 0.8),
    ("LINK", 15.0),
    ("UNI", 7.0),
    ("LTC", 80.0),
    ("BCH", 300.0),
    ("ETC", 25.0),
    ("USDT", 1.0),
];

/// Reference price for an asset (case-insensitive), or [`DEFAULT_BASE_PRICE`].
pub fn base_price(asset: &str) -> f64 {
    let upper = asset.to_uppercase();
    BASE_PRICES
        .iter()
        .find(|(name, _)| *name == upper)
        .map(|(_, price)| *price)
        .unwrap_or(DEFAULT_BASE_PRICE)
}

/// Standard normal draw via the Box-Muller transform.
pub(crate) fn standard_normal(rng: &mut StdRng) -> f64 {
    // 1 - U keeps u1 in (0, 1] so ln stays finite
    let u1: f64 = 1.0 - rng.gen::<f64>();
    let u2: f64 = rng.gen();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}

/// Seeded RNG for an asset name.
pub(crate) fn asset_rng(asset: &str) -> StdRng {
    let seed_bytes = blake3::hash(asset.as_bytes());
    StdRng::from_seed(*seed_bytes.as_bytes())
}

/// Generate the fallback series: [`SYNTHETIC_BARS`] daily bars ending at `end`.
pub fn synthetic_series(asset: &str, end: NaiveDateTime) -> PriceSeries {
    let base = base_price(asset);
    let floor = base * SYNTHETIC_FLOOR_RATIO;
    let mut rng = asset_rng(asset);
    let first = end - Duration::days(SYNTHETIC_BARS as i64 - 1);

    let mut price = base;
    let bars = (0..SYNTHETIC_BARS)
        .map(|i| {
            let change = SYNTHETIC_DRIFT + SYNTHETIC_VOLATILITY * standard_normal(&mut rng);
            price = (price * (1.0 + change)).max(floor);
            let close = price;
            let open = close * (1.0 + rng.gen_range(-0.01..0.01));
            let high = (close * (1.0 + rng.gen_range(0.0..0.02))).max(open);
            let low = (close * (1.0 - rng.gen_range(0.0..0.02))).min(open);
            Bar {
                timestamp: first + Duration::days(i as i64),
                open,
                high,
                low,
                close,
                volume: rng.gen_range(1e6..1e8),
            }
        })
        .collect();

    PriceSeries::from_unsorted(bars)
}

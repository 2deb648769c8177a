use crate::math::utils::round_to_places;
use serde::{Deserialize, Serialize};

/// Progress at which a sale leaves the launch stage.
pub const HEATING_UP_THRESHOLD: f64 = 33.3;
/// Progress at which a sale is considered hot.
pub const HOT_THRESHOLD: f64 = 66.6;
/// Progress at which a sale has graduated.
pub const COMPLETE_THRESHOLD: f64 = 100.0;

/// Percentage of the way from `init_price` to `end_price`, clamped to `[0, 100]`
/// and rounded to 2 decimals. A degenerate curve (`init == end`) yields 0.
pub fn compute_finish_rate(current_price: f64, init_price: f64, end_price: f64) -> f64 {
    let numerator = current_price - init_price;
    let denominator = end_price - init_price;
    if denominator == 0.0 {
        return 0.0;
    }
    let ratio = numerator / denominator;
    if ratio.is_nan() {
        return 0.0;
    }
    round_to_places(ratio.clamp(0.0, 1.0) * 100.0, 2)
}

/// Stage of the three-stage progress bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SaleStage {
    Launch,
    HeatingUp,
    Hot,
    Graduated,
}

impl SaleStage {
    pub fn from_finish_rate(finish_rate: f64) -> Self {
        if finish_rate >= COMPLETE_THRESHOLD {
            SaleStage::Graduated
        } else if finish_rate >= HOT_THRESHOLD {
            SaleStage::Hot
        } else if finish_rate >= HEATING_UP_THRESHOLD {
            SaleStage::HeatingUp
        } else {
            SaleStage::Launch
        }
    }
}

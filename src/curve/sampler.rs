use crate::curve::oracle::curve_for;
use crate::curve::types::{CurveParameters, CurvePoint};
use crate::errors::ProgressError;
use crate::math::utils::{prices_equal, round_price, u256_to_f64};

/// Default number of samples drawn for a chart.
pub const DEFAULT_POINT_COUNT: usize = 40;

/// Samples the curve at `point_count` evenly spaced supply values from zero to
/// the sale target, inclusive. `x` is expressed in whole base tokens.
pub fn sample(params: &CurveParameters, point_count: usize) -> Result<Vec<CurvePoint>, ProgressError> {
    if point_count < 2 {
        return Err(ProgressError::InvalidPointCount(point_count));
    }

    let curve = curve_for(params.kind);
    curve.validate(params)?;

    let total_sell = u256_to_f64(params.reserves.total_sell_a);
    let base_unit = 10_f64.powi(params.decimals_a as i32);
    let last = (point_count - 1) as f64;

    (0..point_count)
        .map(|i| {
            let sold = if i == point_count - 1 {
                total_sell
            } else {
                total_sell * i as f64 / last
            };
            let price = curve.price_at(params, sold)?;
            Ok(CurvePoint::new(sold / base_unit, price))
        })
        .collect()
}

/// Marks the live price on a sampled series, returning a new series.
///
/// The first point whose price is at or above `current_price` is located. If it
/// already carries that price (12-decimal precision) it is marked; otherwise a
/// marker point is inserted before it, sharing its `x`. When the live price is
/// above every sample the series is returned without a marker.
pub fn locate_or_insert_current(points: &[CurvePoint], current_price: f64) -> Vec<CurvePoint> {
    let price = round_price(current_price);
    let mut rebuilt: Vec<CurvePoint> = points
        .iter()
        .map(|p| CurvePoint { current: None, ..*p })
        .collect();

    let Some(idx) = rebuilt.iter().position(|p| price <= round_price(p.y)) else {
        return rebuilt;
    };

    let matches_previous = idx > 0 && prices_equal(rebuilt[idx - 1].y, price);
    let matches_found = prices_equal(rebuilt[idx].y, price);

    if !matches_previous && !matches_found {
        let marker = CurvePoint {
            x: rebuilt[idx].x,
            y: price,
            current: Some(price),
        };
        rebuilt.insert(idx, marker);
    } else if matches_found {
        rebuilt[idx].current = Some(price);
    }

    rebuilt
}

/// Samples the curve and marks the pool's live price on it.
pub fn build_curve_points(
    params: &CurveParameters,
    point_count: usize,
) -> Result<Vec<CurvePoint>, ProgressError> {
    let points = sample(params, point_count)?;
    let current_price = curve_for(params.kind).price(params)?;
    Ok(locate_or_insert_current(&points, current_price))
}

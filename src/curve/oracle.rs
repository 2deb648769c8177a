use crate::curve::types::{CurveKind, CurveParameters};
use crate::errors::ProgressError;
use crate::math::utils::{decimal_scale, round_price, u256_to_f64};
use alloy_primitives::U256;
use std::fmt::Debug;

/// Largest decimal precision accepted for either side of the pool.
pub const MAX_DECIMALS: u8 = 18;

/// 2^64, the denominator of the Q64.64 slope used by the linear curve.
const Q64: f64 = (1u64 << 63) as f64 * 2.0;

/// Defines the price function of a bonding-curve family.
///
/// Implementors only provide raw prices (quote per base in raw units); the
/// provided methods handle validation, decimal scaling and 12-decimal rounding.
pub trait PricingCurve: Debug + Send + Sync {
    /// Raw price once `sold` base tokens (raw units) have been sold.
    fn raw_price_at(&self, params: &CurveParameters, sold: f64) -> Result<f64, ProgressError>;

    /// Raw price implied by the pool's live reserves.
    fn raw_current_price(&self, params: &CurveParameters) -> Result<f64, ProgressError>;

    /// Curve-specific parameter checks run before any evaluation.
    fn check(&self, _params: &CurveParameters) -> Result<(), ProgressError> {
        Ok(())
    }

    fn validate(&self, params: &CurveParameters) -> Result<(), ProgressError> {
        if params.decimals_a > MAX_DECIMALS || params.decimals_b > MAX_DECIMALS {
            return Err(ProgressError::InvalidParameters(format!(
                "decimals ({}, {}) exceed {}",
                params.decimals_a, params.decimals_b, MAX_DECIMALS
            )));
        }
        if params.reserves.total_sell_a == U256::ZERO {
            return Err(ProgressError::InvalidParameters(
                "total sell amount cannot be zero".to_string(),
            ));
        }
        if params.reserves.virtual_a == U256::ZERO {
            return Err(ProgressError::CurveEvaluation(
                "virtual base reserve cannot be zero".to_string(),
            ));
        }
        self.check(params)
    }

    /// Nominal price at `sold` base tokens sold (raw units).
    fn price_at(&self, params: &CurveParameters, sold: f64) -> Result<f64, ProgressError> {
        self.validate(params)?;
        let raw = self.raw_price_at(params, sold)?;
        nominal(params, raw)
    }

    /// Nominal live price of the pool.
    fn price(&self, params: &CurveParameters) -> Result<f64, ProgressError> {
        self.validate(params)?;
        let raw = self.raw_current_price(params)?;
        nominal(params, raw)
    }

    /// Nominal price before anything was sold.
    fn init_price(&self, params: &CurveParameters) -> Result<f64, ProgressError> {
        self.price_at(params, 0.0)
    }

    /// Nominal price once the whole sale target has been sold.
    fn end_price(&self, params: &CurveParameters) -> Result<f64, ProgressError> {
        self.price_at(params, u256_to_f64(params.reserves.total_sell_a))
    }
}

fn nominal(params: &CurveParameters, raw: f64) -> Result<f64, ProgressError> {
    let price = raw * decimal_scale(params.decimals_a, params.decimals_b);
    if !price.is_finite() || price < 0.0 {
        return Err(ProgressError::CurveEvaluation(format!(
            "price evaluated to {}",
            price
        )));
    }
    Ok(round_price(price))
}

/// Constant product curve over virtual reserves: `(A - s) * (B + b) = A * B`.
#[derive(Debug, Clone, Copy)]
pub struct ConstantProductCurve;

impl PricingCurve for ConstantProductCurve {
    fn check(&self, params: &CurveParameters) -> Result<(), ProgressError> {
        if params.reserves.virtual_a <= params.reserves.total_sell_a {
            return Err(ProgressError::CurveEvaluation(format!(
                "virtual base reserve {} does not cover sell target {}",
                params.reserves.virtual_a, params.reserves.total_sell_a
            )));
        }
        if params.reserves.virtual_a <= params.reserves.real_a {
            return Err(ProgressError::CurveEvaluation(format!(
                "virtual base reserve {} exhausted by {} sold",
                params.reserves.virtual_a, params.reserves.real_a
            )));
        }
        Ok(())
    }

    fn raw_price_at(&self, params: &CurveParameters, sold: f64) -> Result<f64, ProgressError> {
        let virtual_a = u256_to_f64(params.reserves.virtual_a);
        let virtual_b = u256_to_f64(params.reserves.virtual_b);
        let remaining = virtual_a - sold;
        if remaining <= 0.0 {
            return Err(ProgressError::CurveEvaluation(format!(
                "supply {} outside curve domain",
                sold
            )));
        }
        let ratio = virtual_a / remaining;
        Ok(virtual_b / virtual_a * ratio * ratio)
    }

    fn raw_current_price(&self, params: &CurveParameters) -> Result<f64, ProgressError> {
        let base = u256_to_f64(params.reserves.virtual_a) - u256_to_f64(params.reserves.real_a);
        let quote = u256_to_f64(params.reserves.virtual_b) + u256_to_f64(params.reserves.real_b);
        Ok(quote / base)
    }
}

/// Fixed price sale: every token costs `B / A`.
#[derive(Debug, Clone, Copy)]
pub struct FixedProductCurve;

impl PricingCurve for FixedProductCurve {
    fn raw_price_at(&self, params: &CurveParameters, _sold: f64) -> Result<f64, ProgressError> {
        Ok(u256_to_f64(params.reserves.virtual_b) / u256_to_f64(params.reserves.virtual_a))
    }

    fn raw_current_price(&self, params: &CurveParameters) -> Result<f64, ProgressError> {
        self.raw_price_at(params, 0.0)
    }
}

/// Linear curve `price = a * s`, with the slope `a` stored in `virtual_a` as Q64.64.
#[derive(Debug, Clone, Copy)]
pub struct LinearProductCurve;

impl LinearProductCurve {
    fn slope(params: &CurveParameters) -> f64 {
        u256_to_f64(params.reserves.virtual_a) / Q64
    }
}

impl PricingCurve for LinearProductCurve {
    fn raw_price_at(&self, params: &CurveParameters, sold: f64) -> Result<f64, ProgressError> {
        if sold < 0.0 {
            return Err(ProgressError::CurveEvaluation(format!(
                "supply {} outside curve domain",
                sold
            )));
        }
        Ok(Self::slope(params) * sold)
    }

    fn raw_current_price(&self, params: &CurveParameters) -> Result<f64, ProgressError> {
        self.raw_price_at(params, u256_to_f64(params.reserves.real_a))
    }
}

/// Returns the price function for a curve kind.
pub fn curve_for(kind: CurveKind) -> &'static dyn PricingCurve {
    match kind {
        CurveKind::ConstantProduct => &ConstantProductCurve,
        CurveKind::FixedProduct => &FixedProductCurve,
        CurveKind::LinearProduct => &LinearProductCurve,
    }
}

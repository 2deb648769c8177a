use alloy_primitives::U256;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The pricing-function family governing a sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CurveKind {
    #[default]
    ConstantProduct,
    FixedProduct,
    LinearProduct,
}

impl CurveKind {
    /// Decodes the on-chain curve type discriminant.
    /// Unknown values fall back to the constant product curve.
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => CurveKind::FixedProduct,
            2 => CurveKind::LinearProduct,
            _ => CurveKind::ConstantProduct,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CurveKind::ConstantProduct => "Constant Product Curve",
            CurveKind::FixedProduct => "Fixed Product Curve",
            CurveKind::LinearProduct => "Linear Product Curve",
        }
    }
}

impl fmt::Display for CurveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Raw reserve figures of a bonding-curve pool, in raw (undecimalized) units.
///
/// Token A is the base asset being sold, token B the quote asset it is sold for.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PoolReserves {
    pub virtual_a: U256,
    pub virtual_b: U256,
    /// Base tokens sold so far.
    pub real_a: U256,
    /// Quote tokens raised so far.
    pub real_b: U256,
    /// Base tokens offered by the sale in total.
    pub total_sell_a: U256,
    /// Quote tokens the sale aims to raise.
    pub total_fund_raising_b: U256,
}

/// Everything the price function of a pool needs.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CurveParameters {
    pub kind: CurveKind,
    pub decimals_a: u8,
    pub decimals_b: u8,
    pub reserves: PoolReserves,
}

/// A single sample of the curve: `x` is supply sold, `y` the price at that supply.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CurvePoint {
    pub x: f64,
    pub y: f64,
    /// Set only on the point representing the live price.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current: Option<f64>,
}

impl CurvePoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y, current: None }
    }

    pub fn is_current(&self) -> bool {
        self.current.is_some()
    }

    /// Tokens still available for sale at this point of the curve.
    pub fn tokens_remaining(&self, total_supply: f64) -> f64 {
        total_supply - self.x
    }
}

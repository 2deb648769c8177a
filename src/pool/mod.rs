use crate::curve::types::{CurveKind, CurveParameters, PoolReserves};
use serde::{Deserialize, Serialize};

/// Unix timestamps (seconds) recorded when a sale crossed a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StageTimestamps {
    pub stage2: Option<u64>,
    #[serde(rename = "final")]
    pub final_time: Option<u64>,
}

impl StageTimestamps {
    /// Fills in any timestamp `self` is missing from `other`. Known timestamps are kept.
    pub fn merge(&mut self, other: &StageTimestamps) {
        self.stage2 = self.stage2.or(other.stage2);
        self.final_time = self.final_time.or(other.final_time);
    }
}

/// A point-in-time view of a pool's reserves, as delivered by the event bridge.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PoolSnapshot {
    pub pool_id: String,
    pub decimals_a: u8,
    pub decimals_b: u8,
    pub reserves: PoolReserves,
    #[serde(default)]
    pub stage_timestamps: StageTimestamps,
}

impl PoolSnapshot {
    /// Pairs the snapshot's reserves with the curve kind configured for its mint.
    pub fn curve_parameters(&self, kind: CurveKind) -> CurveParameters {
        CurveParameters {
            kind,
            decimals_a: self.decimals_a,
            decimals_b: self.decimals_b,
            reserves: self.reserves.clone(),
        }
    }
}

/// Mint-level information about a sale, refreshed out of band.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SaleMetadata {
    pub pool_id: String,
    pub curve_kind: CurveKind,
    /// Initial price recorded for the mint; overrides the curve's own when non-zero.
    #[serde(default)]
    pub init_price: Option<f64>,
    /// Server-side finish rate, shown until the first snapshot is processed.
    #[serde(default)]
    pub finishing_rate: Option<f64>,
    #[serde(default)]
    pub stage_timestamps: StageTimestamps,
}

impl SaleMetadata {
    pub fn new(pool_id: impl Into<String>, curve_kind: CurveKind) -> Self {
        Self {
            pool_id: pool_id.into(),
            curve_kind,
            ..Default::default()
        }
    }

    /// The explicit initial price, if one was recorded.
    pub fn recorded_init_price(&self) -> Option<f64> {
        self.init_price.filter(|p| *p > 0.0)
    }
}

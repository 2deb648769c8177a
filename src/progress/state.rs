use crate::config::EngineConfig;
use crate::curve::types::CurvePoint;
use crate::pool::StageTimestamps;
use crate::progress::calculator::SaleStage;
use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};

/// Derived progress of a sale. Replaced wholesale on every recomputation and
/// shared read-only with consumers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressState {
    finish_rate: f64,
    points: Vec<CurvePoint>,
    /// Unix time in milliseconds.
    last_computed_at: u64,
}

impl ProgressState {
    pub fn new(finish_rate: f64, points: Vec<CurvePoint>) -> Self {
        let last_computed_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_millis() as u64);
        Self {
            finish_rate,
            points,
            last_computed_at,
        }
    }

    pub fn finish_rate(&self) -> f64 {
        self.finish_rate
    }

    pub fn points(&self) -> &[CurvePoint] {
        &self.points
    }

    pub fn last_computed_at(&self) -> u64 {
        self.last_computed_at
    }

    pub fn stage(&self) -> SaleStage {
        SaleStage::from_finish_rate(self.finish_rate)
    }

    /// The point carrying the live price marker, if the price lies on the chart.
    pub fn current_point(&self) -> Option<&CurvePoint> {
        self.points.iter().find(|p| p.is_current())
    }

    /// Supply at the end of the sampled curve.
    pub fn total_supply(&self) -> f64 {
        self.points.last().map_or(0.0, |p| p.x)
    }
}

/// Why the known metadata looks stale for the computed progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaleReason {
    MissingStage2Timestamp,
    MissingFinalTimestamp,
}

impl StaleReason {
    pub fn evaluate(
        finish_rate: f64,
        timestamps: &StageTimestamps,
        config: &EngineConfig,
    ) -> Option<Self> {
        if finish_rate >= config.complete_threshold && timestamps.final_time.is_none() {
            Some(StaleReason::MissingFinalTimestamp)
        } else if finish_rate > config.hot_threshold && timestamps.stage2.is_none() {
            Some(StaleReason::MissingStage2Timestamp)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn staleness_requires_missing_timestamp() {
        let config = EngineConfig::default();
        let none = StageTimestamps::default();
        let stage2 = StageTimestamps { stage2: Some(1), final_time: None };
        let both = StageTimestamps { stage2: Some(1), final_time: Some(2) };

        assert_eq!(StaleReason::evaluate(66.6, &none, &config), None);
        assert_eq!(
            StaleReason::evaluate(66.61, &none, &config),
            Some(StaleReason::MissingStage2Timestamp)
        );
        assert_eq!(StaleReason::evaluate(80.0, &stage2, &config), None);
        assert_eq!(
            StaleReason::evaluate(100.0, &stage2, &config),
            Some(StaleReason::MissingFinalTimestamp)
        );
        assert_eq!(StaleReason::evaluate(100.0, &both, &config), None);
    }

    #[test]
    fn marker_lookup() {
        let mut marked = CurvePoint::new(5.0, 2.0);
        marked.current = Some(2.0);
        let state = ProgressState::new(
            40.0,
            vec![CurvePoint::new(0.0, 1.0), marked, CurvePoint::new(10.0, 3.0)],
        );
        assert_eq!(state.current_point(), Some(&marked));
        assert_eq!(state.total_supply(), 10.0);
        assert_eq!(state.points()[2].tokens_remaining(state.total_supply()), 0.0);
        assert_eq!(state.stage(), SaleStage::HeatingUp);
    }
}

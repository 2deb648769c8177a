pub mod oracle;
pub mod sampler;
pub mod types;

pub use oracle::{curve_for, PricingCurve};
pub use sampler::{build_curve_points, locate_or_insert_current, sample, DEFAULT_POINT_COUNT};
pub use types::{CurveKind, CurveParameters, CurvePoint, PoolReserves};

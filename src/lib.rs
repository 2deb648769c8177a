pub mod config;
pub mod core;
pub mod curve;
pub mod errors;
pub mod math;
pub mod pool;
pub mod progress;

pub use config::EngineConfig;
pub use errors::ProgressError;

pub use core::messaging::{PoolEventBridge, PoolEventHub, SnapshotSubscriber, Subscription};
pub use curve::{CurveKind, CurveParameters, CurvePoint, PoolReserves};
pub use pool::{PoolSnapshot, SaleMetadata, StageTimestamps};
pub use progress::{ProgressController, ProgressState, RefreshAction, SaleStage};

pub mod calculator;
pub mod controller;
pub mod refresh;
pub mod state;

pub use calculator::{compute_finish_rate, SaleStage};
pub use controller::{ControllerPhase, ProgressController};
pub use refresh::{DebouncedRefresh, RefreshAction};
pub use state::{ProgressState, StaleReason};

use alloy_primitives::U256;
use launchpad_progress::{
    CurveKind, EngineConfig, PoolEventHub, PoolReserves, PoolSnapshot, ProgressController,
    RefreshAction, SaleMetadata,
};
use std::sync::Arc;
use std::time::Duration;

const DEMO_POOL_ID: &str = "demo-launchpad-pool";
const DECIMALS_A: u8 = 6;
const DECIMALS_B: u8 = 9;
const VIRTUAL_A: u128 = 1_073_025_605_596_382;
const VIRTUAL_B: u128 = 30_000_852_951;
const TOTAL_SELL_A: u128 = 793_100_000_000_000;
const TOTAL_FUND_RAISING_B: u128 = 85_000_000_000;

/// Reserves of the demo pool once `percent_sold` of the sale target has been bought.
fn demo_snapshot(percent_sold: u128) -> PoolSnapshot {
    let real_a = TOTAL_SELL_A * percent_sold / 100;
    // Constant product: (A - a) * (B + b) = A * B  =>  b = B * a / (A - a)
    let real_b = VIRTUAL_B * real_a / (VIRTUAL_A - real_a);
    PoolSnapshot {
        pool_id: DEMO_POOL_ID.to_string(),
        decimals_a: DECIMALS_A,
        decimals_b: DECIMALS_B,
        reserves: PoolReserves {
            virtual_a: U256::from(VIRTUAL_A),
            virtual_b: U256::from(VIRTUAL_B),
            real_a: U256::from(real_a),
            real_b: U256::from(real_b),
            total_sell_a: U256::from(TOTAL_SELL_A),
            total_fund_raising_b: U256::from(TOTAL_FUND_RAISING_B),
        },
        stage_timestamps: Default::default(),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    tracing::info!("Starting launchpad progress demo...");
    let config = EngineConfig::from_env()?;

    let hub = Arc::new(PoolEventHub::new());
    let refresh: RefreshAction = Arc::new(|| {
        tracing::info!(pool_id = DEMO_POOL_ID, "Refresh requested, re-fetching mint metadata");
    });
    let controller = ProgressController::new(hub.clone(), config.clone(), refresh);

    controller
        .bind(SaleMetadata::new(DEMO_POOL_ID, CurveKind::ConstantProduct))
        .await?;
    println!("Bound to {} ({})", DEMO_POOL_ID, CurveKind::ConstantProduct);

    for percent_sold in [0, 25, 50, 70, 85, 100] {
        let delivered = hub.publish(demo_snapshot(percent_sold)).await;
        tracing::debug!(delivered, percent_sold, "Snapshot published");

        match controller.state() {
            Some(state) => {
                let marker = state
                    .current_point()
                    .map_or("off chart".to_string(), |p| format!("{:.12} SOL @ {:.0}", p.y, p.x));
                println!(
                    "sold {:>3}% -> progress {:>6.2}% [{:?}] {} points, current {}",
                    percent_sold,
                    state.finish_rate(),
                    state.stage(),
                    state.points().len(),
                    marker
                );
            }
            None => println!("sold {:>3}% -> no progress computed", percent_sold),
        }

        if controller.is_refresh_pending().await {
            println!("    metadata looks stale, refresh scheduled");
            tokio::time::sleep(config.refresh_delay() + Duration::from_millis(100)).await;
        }
    }

    controller.dispose().await;
    println!("Controller disposed; {} subscribers left.", hub.subscriber_count(DEMO_POOL_ID));
    Ok(())
}

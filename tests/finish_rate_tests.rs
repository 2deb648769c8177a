use launchpad_progress::progress::{compute_finish_rate, SaleStage};

#[test]
fn test_degenerate_curve_is_zero() {
    for current in [0.0, 0.5, 1.0, 2.0, 1e9] {
        assert_eq!(compute_finish_rate(current, 1.0, 1.0), 0.0);
    }
    assert_eq!(compute_finish_rate(0.0, 0.0, 0.0), 0.0);
}

#[test]
fn test_midpoint_and_rounding() {
    assert_eq!(compute_finish_rate(1.5, 1.0, 2.0), 50.0);
    assert_eq!(compute_finish_rate(1.0 + 2.0 / 3.0, 1.0, 2.0), 66.67);
    assert_eq!(compute_finish_rate(0.000_000_035, 0.000_000_028, 0.000_000_410), 1.83);
}

#[test]
fn test_clamped_to_bounds() {
    assert_eq!(compute_finish_rate(3.0, 1.0, 2.0), 100.0);
    assert_eq!(compute_finish_rate(2.0, 1.0, 2.0), 100.0);
    assert_eq!(compute_finish_rate(0.5, 1.0, 2.0), 0.0);
    assert_eq!(compute_finish_rate(1.0, 1.0, 2.0), 0.0);
}

#[test]
fn test_monotonic_between_init_and_end() {
    let (init, end) = (0.000_000_028, 0.000_000_410);
    let mut previous = f64::MIN;
    for step in 0..=500 {
        let current = init + (end - init) * step as f64 / 400.0;
        let rate = compute_finish_rate(current, init, end);
        assert!((0.0..=100.0).contains(&rate), "rate {} out of range", rate);
        assert!(rate >= previous, "rate decreased at step {}", step);
        previous = rate;
    }
    assert_eq!(previous, 100.0);
}

#[test]
fn test_stage_follows_rate() {
    assert_eq!(SaleStage::from_finish_rate(compute_finish_rate(1.2, 1.0, 2.0)), SaleStage::Launch);
    assert_eq!(SaleStage::from_finish_rate(compute_finish_rate(1.5, 1.0, 2.0)), SaleStage::HeatingUp);
    assert_eq!(SaleStage::from_finish_rate(compute_finish_rate(1.7, 1.0, 2.0)), SaleStage::Hot);
    assert_eq!(SaleStage::from_finish_rate(compute_finish_rate(2.5, 1.0, 2.0)), SaleStage::Graduated);
}

#[test]
fn test_inverted_span_is_not_special_cased() {
    assert_eq!(compute_finish_rate(1.5, 2.0, 1.0), 50.0);
    assert_eq!(compute_finish_rate(2.5, 2.0, 1.0), 0.0);
}

use super::*;

#[test]
fn sample_is_pure_in_time() {
    let fallback = TelemetryFallback::new();
    for now in [0.0, 1.5, 1_700_000_000.25, 1_700_000_123.75] {
        assert_eq!(fallback.sample(now), fallback.sample(now));
        assert_eq!(fallback.sample_action(now), fallback.sample_action(now));
    }
}

#[test]
fn index_stays_inside_palette() {
    for step in 0..2_000 {
        let now = step as f64 * 0.37;
        assert!(TelemetryFallback::index(now, 6) < 6);
    }
    assert_eq!(TelemetryFallback::index(f64::NAN, 6), 0);
    assert_eq!(TelemetryFallback::index(3.0, 0), 0);
}

#[test]
fn distinct_times_vary_the_sample() {
    let fallback = TelemetryFallback::new();
    let actions: std::collections::HashSet<String> = (0..200)
        .map(|step| fallback.sample(step as f64 * 0.5).action)
        .collect();
    assert!(actions.len() > 1);
}

#[test]
fn sample_carries_requested_timestamp() {
    let decision = TelemetryFallback::new().sample(42.0);
    assert_eq!(decision.timestamp, 42.0);
    assert!(decision.reason.is_some());
}

#[test]
fn zero_time_picks_first_entries() {
    let fallback = TelemetryFallback::new();
    assert_eq!(fallback.sample(0.0).action, "OPEN_PATIENT_FILE");
    let action = fallback.sample_action(0.0);
    assert_eq!(action.intent, Intent::ZoomIn);
    assert_eq!(action.parameters.get("region"), Some(&json!("LEFT_REGION")));
}

#[test]
fn simulated_actions_stay_in_vocabulary() {
    let fallback = TelemetryFallback::new();
    for step in 0..500 {
        assert!(fallback.sample_action(step as f64 * 0.11).intent.is_recognized());
    }
}

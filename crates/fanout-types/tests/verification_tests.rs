use fanout_types::*;

#[test]
fn tolerance_boundary() {
    let eps = DEFAULT_TOLERANCE;
    assert!(values_match(1.0, 1.0, eps));
    assert!(values_match(1.0, 1.00005, eps));
    assert!(values_match(1.0, 1.00009, eps));
    assert!(!values_match(1.0, 1.00011, eps));
    assert!(!values_match(-1.0, 1.0, eps));
}

#[test]
fn zeros_and_nan() {
    assert!(values_match(0.0, 0.0, DEFAULT_TOLERANCE));
    assert!(values_match(0.0, -0.0, DEFAULT_TOLERANCE));
    assert!(!values_match(0.0, 1e-30, DEFAULT_TOLERANCE));
    assert!(!values_match(f64::NAN, f64::NAN, DEFAULT_TOLERANCE));
    assert!(!values_match(f64::NAN, 1.0, DEFAULT_TOLERANCE));
}

#[test]
fn result_rate_and_summary() {
    let result = VerificationResult {
        policy: SamplingPolicy::Full,
        checked: 200,
        mismatch_count: 3,
        first_mismatches: vec![Mismatch {
            index: 7,
            expected: 14i32,
            actual: 0,
        }],
    };
    assert!(!result.passed());
    assert!((result.mismatch_rate() - 1.5).abs() < 1e-9);

    let summary = VerificationSummary::from(&result);
    assert!(!summary.passed);
    assert_eq!(summary.first_mismatches[0].expected, "14");
    assert_eq!(summary.first_mismatches[0].actual, "0");
}

#[test]
fn empty_result_passes() {
    let result: VerificationResult<f32> = VerificationResult {
        policy: SamplingPolicy::default(),
        checked: 0,
        mismatch_count: 0,
        first_mismatches: vec![],
    };
    assert!(result.passed());
    assert_eq!(result.mismatch_rate(), 0.0);
}

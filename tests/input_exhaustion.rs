use test_support::check_failing_run_with;

const SRC: &str = "ask a\nask b\n";

#[test]
fn run_reports_input_exhaustion() {
    let error = check_failing_run_with(SRC, vec!["1".to_owned()]);
    assert!(error.contains("No more inputs"), "unexpected error: {error}");
}

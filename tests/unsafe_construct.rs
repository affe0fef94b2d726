use test_support::check_failing_run;

const SRC: &str = "say __import__(\"os\").system(\"echo x\")\n";

#[test]
fn run_rejects_unsafe_construct() {
    let error = check_failing_run(SRC);
    assert!(error.contains("__import__"), "unexpected error: {error}");
}

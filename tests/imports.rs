use test_support::{check_failing_run, check_run};

const MATH_SRC: &str = "import math\nsay math.sqrt(16)\n";

#[test]
fn run_whitelisted_module_import() {
    let output = check_run(MATH_SRC);
    assert_eq!(output, "4.0\n");
}

const FORBIDDEN_SRC: &str = "import socket\nsay \"unreachable\"\n";

#[test]
fn run_rejects_non_whitelisted_import() {
    let error = check_failing_run(FORBIDDEN_SRC);
    assert!(error.contains("socket"), "unexpected error: {error}");
}

use test_support::check_run;

const SRC: &str = "x is 5\ny is 7\nsay x + y\n";

#[test]
fn run_arithmetic_and_assignment() {
    let output = check_run(SRC);
    assert_eq!(output, "12\n");
}

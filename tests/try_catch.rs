use test_support::check_run;

const SRC: &str = "try\nsay missing\ncatch err\nsay \"caught\"\nend\n";

#[test]
fn run_try_catch_recovers_from_unknown_variable() {
    let output = check_run(SRC);
    assert_eq!(output, "caught\n");
}

use test_support::check_run;

const SRC: &str = "function add a b\nreturn a + b\nend\nsay add 2 3\n";

#[test]
fn run_function_definition_and_call() {
    let output = check_run(SRC);
    assert_eq!(output, "5\n");
}

use test_support::check_run_with;

const SRC: &str = "ask n\nsay n + 1\n";

#[test]
fn run_input_echo_with_coercion() {
    let output = check_run_with(SRC, vec!["4".to_owned()]);
    assert_eq!(output, "5\n");
}

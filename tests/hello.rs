use test_support::check_run;

const SRC: &str = "say \"hello\"\n";

#[test]
fn run_hello() {
    let output = check_run(SRC);
    assert_eq!(output, "hello\n");
}

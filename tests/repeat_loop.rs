use test_support::check_run;

const SRC: &str = "repeat 3\nsay \"hi\"\nend\n";

#[test]
fn run_repeat_loop() {
    let output = check_run(SRC);
    assert_eq!(output, "hi\nhi\nhi\n");
}

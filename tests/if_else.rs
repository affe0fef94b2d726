use test_support::check_run;

const SRC: &str = "x is 10\nif x > 5\nsay \"big\"\nelse\nsay \"small\"\nend\n";

#[test]
fn run_if_else_branch() {
    let output = check_run(SRC);
    assert_eq!(output, "big\n");
}

use test_support::check_run;

const SRC: &str = "class Counter\nfunction init self\nself.count is 0\nend\nfunction bump self\nself.count is self.count + 1\nreturn self.count\nend\nend\nc is Counter()\nsay c.bump()\nsay c.bump()\n";

#[test]
fn run_class_definition_and_method_call() {
    let output = check_run(SRC);
    assert_eq!(output, "1\n2\n");
}

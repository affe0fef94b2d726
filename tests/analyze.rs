use test_support::{check_analyze, check_failing_analyze};

#[test]
fn analyze_accepts_well_formed_program() {
    check_analyze("x is 1\nsay x\n");
}

#[test]
fn analyze_reports_line_of_first_problem() {
    let result = check_failing_analyze("x is 1\nif x > 0\nbork bork\nend\n");
    assert_eq!(result.diagnostics[0].line, Some(3));
}

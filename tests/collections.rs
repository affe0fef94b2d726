use test_support::check_run;

const ADD_SRC: &str = "list nums\nadd 1 to nums\nadd 2 to nums\nsay nums\n";

#[test]
fn run_add_to_list() {
    let output = check_run(ADD_SRC);
    assert_eq!(output, "[1, 2]\n");
}

const DICT_SRC: &str = "dict scores\nset scores \"alice\" to 10\nsay get \"alice\" from scores\n";

#[test]
fn run_dict_set_and_get() {
    let output = check_run(DICT_SRC);
    assert_eq!(output, "10\n");
}

const SORT_SRC: &str = "list nums is [3, 1, 2]\nsort nums\nsay nums\n";

#[test]
fn run_sort_mutates_in_place() {
    let output = check_run(SORT_SRC);
    assert_eq!(output, "[1, 2, 3]\n");
}

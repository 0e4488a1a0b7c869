//! Tests for the standard library as seen from VeLa programs

use vela::{Error, Interpreter, Operand};

fn run(source: &str) -> Operand {
    Interpreter::new()
        .program(source)
        .unwrap()
        .expect("program produced no value")
}

fn run_err(source: &str) -> Error {
    Interpreter::new().program(source).unwrap_err()
}

fn ints(values: &[i64]) -> Operand {
    Operand::list(values.iter().map(|&n| Operand::Integer(n)).collect())
}

fn strings(values: &[&str]) -> Operand {
    Operand::list(values.iter().map(|s| Operand::string(*s)).collect())
}

// ====================
// Math
// ====================

#[test]
fn test_real_functions() {
    assert_eq!(run("sqrt(16)"), Operand::Real(4.0));
    assert_eq!(run("cos(0)"), Operand::Real(1.0));
    assert_eq!(run("floor(2.7)"), Operand::Real(2.0));
    assert_eq!(run("ceil(2.1)"), Operand::Real(3.0));
    match run("sin(PI/2)") {
        Operand::Real(x) => assert!((x - 1.0).abs() < 1e-12),
        other => panic!("expected a real but found {:?}", other),
    }
}

#[test]
fn test_domain_errors() {
    assert!(matches!(run_err("sqrt(-1)"), Error::RuntimeError(_)));
    assert!(matches!(run_err("log(-1)"), Error::RuntimeError(_)));
}

#[test]
fn test_integer_preserving_functions() {
    assert_eq!(run("abs(-3)"), Operand::Integer(3));
    assert_eq!(run("abs(-3.5)"), Operand::Real(3.5));
    assert_eq!(run("round(2.4)"), Operand::Integer(2));
    assert_eq!(run("round(2.6)"), Operand::Integer(3));
    assert_eq!(run("int(-2.9)"), Operand::Integer(-2));
    assert_eq!(run("real(3)"), Operand::Real(3.0));
    assert_eq!(run("min(3 7)"), Operand::Integer(3));
    assert_eq!(run("max(3 7.5)"), Operand::Real(7.5));
    assert_eq!(run("pow(2 10)"), Operand::Real(1024.0));
}

#[test]
fn test_math_rejects_strings() {
    assert!(matches!(run_err(r#"sqrt("x")"#), Error::TypeMismatch { .. }));
}

// ====================
// Strings
// ====================

#[test]
fn test_string_predicates() {
    assert_eq!(run(r#"contains("hello" "ell")"#), Operand::Boolean(true));
    assert_eq!(run(r#"startsWith("hello" "he")"#), Operand::Boolean(true));
    assert_eq!(run(r#"endsWith("hello" "lo")"#), Operand::Boolean(true));
    assert_eq!(run(r#"matches("2023-01-05" "\d{4}-\d{2}-\d{2}")"#), Operand::Boolean(true));
    assert_eq!(run(r#"matches("x2023" "\d+")"#), Operand::Boolean(false));
}

#[test]
fn test_string_searching() {
    assert_eq!(run(r#"indexOf("hello" "l")"#), Operand::Integer(2));
    assert_eq!(run(r#"lastIndexOf("hello" "l")"#), Operand::Integer(3));
    assert_eq!(run(r#"indexOf("hello" "z")"#), Operand::Integer(-1));
}

#[test]
fn test_substring() {
    assert_eq!(run(r#"substring("hello" 1 3)"#), Operand::string("el"));
    assert_eq!(run(r#"substring("hello" 2)"#), Operand::string("llo"));
    assert!(run_err(r#"substring("hello" 2 9)"#).to_string().contains("substring"));
}

#[test]
fn test_string_transformations() {
    assert_eq!(run(r#"toUpperCase("abc")"#), Operand::string("ABC"));
    assert_eq!(run(r#"toLowerCase("ABC")"#), Operand::string("abc"));
    assert_eq!(run(r#"trim("  x  ")"#), Operand::string("x"));
    assert_eq!(run(r#"replace("1.5" "." ",")"#), Operand::string("1,5"));
    assert_eq!(run(r#"replace("a.b.c" "." "")"#), Operand::string("abc"));
    assert_eq!(run(r#"replace("price" "price" "$1")"#), Operand::string("$1"));
    assert_eq!(run(r#"replaceAll("a1b22c" "\d+" "-")"#), Operand::string("a-b-c"));
    assert_eq!(run(r#"replaceAll("a.b" "\." "$$")"#), Operand::string("a$b"));
    assert_eq!(run(r#"split("a, b,c" ",\s*")"#), strings(&["a", "b", "c"]));
}

#[test]
fn test_characters() {
    assert_eq!(run(r#"ord("A")"#), Operand::Integer(65));
    assert_eq!(run("chr(66)"), Operand::string("B"));
    assert_eq!(run("str(42)"), Operand::string("42"));
    assert_eq!(run("str(1.5)"), Operand::string("1.5"));
    assert_eq!(run("str(true)"), Operand::string("True"));
}

// ====================
// Lists
// ====================

#[test]
fn test_head_tail_nth() {
    assert_eq!(run("head([1 2 3])"), Operand::Integer(1));
    assert_eq!(run("tail([1 2 3])"), ints(&[2, 3]));
    assert_eq!(run("nth([1 2 3] 2)"), Operand::Integer(3));
    assert_eq!(run("nth(seq(1 100 1) 41)"), Operand::Integer(42));
}

#[test]
fn test_empty_list_sentinel() {
    assert_eq!(run("head([])"), Operand::empty_list());
    assert_eq!(run("tail([])"), Operand::empty_list());
    assert_eq!(run("nth([] 3)"), Operand::empty_list());
    assert_eq!(run("nth([1] 5)"), Operand::empty_list());
}

#[test]
fn test_concat_and_append() {
    assert_eq!(run(r#"length(concat([1 "2" 3.0] [4 5]))"#), Operand::Integer(5));
    assert_eq!(run("length(append([1 2] [3 4]))"), Operand::Integer(3));
    assert_eq!(
        run("append([1 2] [3 4])"),
        Operand::list(vec![Operand::Integer(1), Operand::Integer(2), ints(&[3, 4])])
    );
    assert_eq!(run(r#"concat("ab" "cd")"#), Operand::string("abcd"));
    assert_eq!(run(r#"length("hello")"#), Operand::Integer(5));
}

#[test]
fn test_seq() {
    assert_eq!(run("seq(1 5 1)"), ints(&[1, 2, 3, 4, 5]));
    assert_eq!(run("seq(1 10 3)"), ints(&[1, 4, 7, 10]));
    assert_eq!(run("seq(5, 1, -2)"), ints(&[5, 3, 1]));
    assert_eq!(
        run("seq(1.0 3.0 1.0)"),
        Operand::list(vec![Operand::Real(1.0), Operand::Real(2.0), Operand::Real(3.0)])
    );
    assert!(run_err("seq(1 5 0)").to_string().contains("seq"));
    assert!(run_err("seq(1 5 0)").to_string().contains("never reach"));
    assert_eq!(run("seq(5 1 1)"), Operand::empty_list());
    assert_eq!(run("seq(1, 5, -1)"), Operand::empty_list());
    assert_eq!(run("seq(2.0 1.0 0.5)"), Operand::empty_list());
}

#[test]
fn test_map_filter_reduce_with_builtins() {
    assert_eq!(
        run("map(sqrt [4 9])"),
        Operand::list(vec![Operand::Real(2.0), Operand::Real(3.0)])
    );
    assert_eq!(
        run("even(n:integer) : boolean { n/2*2 = n } filter(even seq(1 10 1))"),
        ints(&[2, 4, 6, 8, 10])
    );
    assert_eq!(run("reduce(max [3 9 4] 0)"), Operand::Integer(9));
}

#[test]
fn test_filter_requires_boolean_predicate() {
    assert!(matches!(
        run_err("filter(abs [1 2])"),
        Error::TypeMismatch { .. }
    ));
}

#[test]
fn test_for_runs_for_effect() {
    let mut interpreter = Interpreter::new();
    let result = interpreter
        .program("cubeplus1(n:integer) { println(n^3+1) } for(cubeplus1 [2 4 6 8])")
        .unwrap();
    assert_eq!(result, None);
    assert_eq!(interpreter.take_output(), "9\n65\n217\n513\n");
}

#[test]
fn test_reverse_and_sort() {
    assert_eq!(run("reverse([1 2 3])"), ints(&[3, 2, 1]));
    assert_eq!(run("sort([3 1 2])"), ints(&[1, 2, 3]));
    assert_eq!(
        run("sort([2.5 1 3])"),
        Operand::list(vec![Operand::Integer(1), Operand::Real(2.5), Operand::Integer(3)])
    );
    assert_eq!(run(r#"sort(["b" "c" "a"])"#), strings(&["a", "b", "c"]));
    assert!(run_err(r#"sort([1 "a"])"#).to_string().contains("sort"));
}

// ====================
// Formatting and output
// ====================

#[test]
fn test_format() {
    assert_eq!(run(r#"format("%d" [42])"#), Operand::string("42"));
    assert_eq!(run(r#"format("%s=%5.2f" ["x" 3.14159])"#), Operand::string("x= 3.14"));
    assert_eq!(run(r#"format("%b %b" [5 true])"#), Operand::string("101 true"));
    assert_eq!(run(r#"format("%s" [[1 2]])"#), Operand::string("[1 2]"));
}

#[test]
fn test_format_errors() {
    assert!(run_err(r#"format("%d %d" [1])"#).to_string().contains("format"));
    assert!(run_err(r#"format("%d" ["x"])"#).to_string().contains("format"));
}

#[test]
fn test_print_and_println() {
    let mut interpreter = Interpreter::new();
    let result = interpreter
        .program(r#"print(format("%d%n" [42])) println("a" 1 2.5) println()"#)
        .unwrap();
    assert_eq!(result, None);
    assert_eq!(interpreter.take_output(), "42\na 1 2.5\n\n");
}

// ====================
// Meta
// ====================

#[test]
fn test_eval() {
    assert_eq!(run(r#"eval("1 + 2")"#), ints(&[3]));
    assert_eq!(run(r#"eval("x <- 1")"#), Operand::empty_list());
}

#[test]
fn test_eval_runs_in_caller_frame() {
    assert_eq!(run(r#"x <- 20 eval("x + 1")"#), ints(&[21]));
    assert_eq!(run(r#"eval("y <- 5") y"#), Operand::Integer(5));
}

#[test]
fn test_typeof() {
    assert_eq!(run("typeof(1)"), Operand::string("integer"));
    assert_eq!(run("typeof(1.0)"), Operand::string("real"));
    assert_eq!(run(r#"typeof("a")"#), Operand::string("string"));
    assert_eq!(run("typeof(false)"), Operand::string("boolean"));
    assert_eq!(run("typeof([])"), Operand::string("list"));
    assert_eq!(run("typeof(sqrt)"), Operand::string("function"));
}

#[test]
fn test_help() {
    match run(r#"help("sqrt")"#) {
        Operand::String(text) => assert!(text.starts_with("sqrt:"), "{}", text),
        other => panic!("expected a string but found {:?}", other),
    }
    match run("f(x:integer) : real { x } help(f)") {
        Operand::String(text) => assert_eq!(text, "F(X:integer) : real"),
        other => panic!("expected a string but found {:?}", other),
    }
}

#[test]
fn test_intrinsics_lists_builtins() {
    match run("intrinsics()") {
        Operand::List(names) => {
            assert!(names.contains(&Operand::string("SQRT")));
            assert!(names.contains(&Operand::string("FORMAT")));
            assert!(names.len() > 40);
        }
        other => panic!("expected a list but found {:?}", other),
    }
}

#[test]
fn test_today_is_a_recent_julian_date() {
    match run("today()") {
        Operand::Real(jd) => assert!(jd > 2_460_000.0 && jd < 2_500_000.0, "{}", jd),
        other => panic!("expected a real but found {:?}", other),
    }
}

#[test]
fn test_builtin_arity_is_checked() {
    assert!(matches!(run_err("sqrt(1 2)"), Error::ArityMismatch { got: 2, .. }));
    assert!(matches!(run_err("head()"), Error::ArityMismatch { got: 0, .. }));
}

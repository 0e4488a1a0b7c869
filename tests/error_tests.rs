//! Tests for error reporting: families, positions and messages

use vela::{Error, ErrorFamily, Interpreter, InterpreterConfig};

fn run_err(source: &str) -> Error {
    Interpreter::new().program(source).unwrap_err()
}

// ====================
// Parse errors
// ====================

#[test]
fn test_unrecognised_character_position() {
    let err = run_err("2457580.25&1004");
    assert!(matches!(err, Error::LexicalError { .. }));
    assert_eq!(err.family(), ErrorFamily::Parse);
    assert_eq!(err.position(), Some((1, 10)));
}

#[test]
fn test_lexical_error_on_later_line() {
    let err = run_err("x <- 1\n  y <- $");
    assert_eq!(err.position(), Some((2, 7)));
}

#[test]
fn test_syntax_error_position() {
    let err = run_err("2 +\n* 3");
    assert!(matches!(err, Error::SyntaxError { .. }));
    assert_eq!(err.position(), Some((2, 0)));
}

#[test]
fn test_unclosed_constructs() {
    for source in ["f(1 2", "[1 2", "{ 1 2", "\"abc", "<< never closed", "(1 + 2"] {
        let err = run_err(source);
        assert!(err.is_parse_error(), "{}: {:?}", source, err);
    }
}

#[test]
fn test_deep_nesting_is_a_syntax_error() {
    let depth = vela::MAX_NESTING_DEPTH + 500;
    let source = format!("{}1{}", "(".repeat(depth), ")".repeat(depth));
    let err = run_err(&source);
    assert!(matches!(err, Error::SyntaxError { .. }), "{:?}", err);

    let unary = format!("{}1", "- ".repeat(depth));
    assert!(run_err(&unary).is_parse_error());
}

#[test]
fn test_moderate_nesting_evaluates() {
    let mut interpreter = Interpreter::new();
    let parens = format!("{}1{}", "(".repeat(1_000), ")".repeat(1_000));
    assert_eq!(interpreter.real_expression(&parens).unwrap(), 1.0);

    let lists = format!("{}1{}", "[".repeat(300), "]".repeat(300));
    let nested = interpreter.program(&lists).unwrap().unwrap();
    assert_eq!(nested.to_string().len(), 601);
}

#[test]
fn test_malformed_function_definitions() {
    assert!(run_err("f(x:number) { x }").is_parse_error());
    assert!(run_err("f(x:integer) x").is_parse_error());
}

#[test]
fn test_parse_errors_evaluate_nothing() {
    let mut interpreter = Interpreter::new();
    assert!(interpreter.program("x <- 1 y <- &").is_err());
    assert!(interpreter.program("x").is_err());
}

// ====================
// Evaluation errors
// ====================

#[test]
fn test_division_by_zero() {
    let err = run_err("42/0");
    assert_eq!(err.to_string(), "42/0: division by zero error");
    assert_eq!(err.family(), ErrorFamily::Evaluation);
    assert_eq!(err.position(), None);

    let err = run_err("42.42/0.0");
    assert_eq!(err.to_string(), "42.42/0.0: division by zero error");
}

#[test]
fn test_division_by_zero_names_sub_expression() {
    let err = run_err("x <- 10 1 + x/(x-10)");
    assert_eq!(err.to_string(), "10/0: division by zero error");
}

#[test]
fn test_constant_cannot_be_rebound() {
    let err = run_err("x is 12 x <- x + 1");
    assert!(matches!(err, Error::BindingError { .. }));
    assert_eq!(err.to_string(), "'X' is a constant binding in this environment.");
}

#[test]
fn test_is_requires_unbound_name() {
    assert!(matches!(run_err("x is 1 x is 2"), Error::BindingError { .. }));
    assert!(matches!(run_err("x <- 1 x is 2"), Error::BindingError { .. }));
    assert!(matches!(run_err("pi is 3"), Error::BindingError { .. }));
}

#[test]
fn test_is_sees_enclosing_frames() {
    let err = run_err("x <- 1 f() { x is 2 } f()");
    assert!(matches!(err, Error::BindingError { .. }));
}

#[test]
fn test_rebinding_with_incompatible_type() {
    let err = run_err(r#"x <- 1 x <- "one""#);
    assert!(matches!(err, Error::BindingError { .. }));
    assert!(matches!(run_err("x <- 1.5 x <- [1]"), Error::BindingError { .. }));
}

#[test]
fn test_unbound_identifier() {
    let err = run_err("nope + 1");
    assert_eq!(err, Error::UndefinedVariable { name: "NOPE".to_string() });
}

#[test]
fn test_operator_type_errors() {
    for source in [
        r#"1 + "a""#,
        r#"1 = "1""#,
        "true < false",
        "true + 1",
        r#""abc" * 2"#,
        "1.5 and 2",
        "-\"a\"",
        r#"1 =~ "1""#,
        "2 in 3",
    ] {
        let err = run_err(source);
        assert!(
            matches!(err, Error::TypeMismatch { .. }),
            "{}: {:?}",
            source,
            err
        );
    }
}

#[test]
fn test_conditions_must_be_boolean() {
    assert!(matches!(run_err("if 1 then 2"), Error::TypeMismatch { .. }));
    assert!(matches!(run_err("while 1 { }"), Error::TypeMismatch { .. }));
    assert!(matches!(run_err("when \"x\" -> 1"), Error::TypeMismatch { .. }));
}

#[test]
fn test_missing_value() {
    assert!(matches!(run_err("1 + when false -> 1"), Error::NoValue { .. }));
    assert!(matches!(run_err("x <- if false then 1"), Error::NoValue { .. }));
    assert!(matches!(
        run_err("f() : integer { x <- 1 } f()"),
        Error::NoValue { .. }
    ));
}

#[test]
fn test_user_function_arity() {
    let err = run_err("f(x:integer) { x } f(1 2)");
    assert_eq!(
        err,
        Error::ArityMismatch {
            function: "F".to_string(),
            expected: "1".to_string(),
            got: 2
        }
    );
}

#[test]
fn test_argument_and_return_types() {
    assert!(matches!(
        run_err("f(x:integer) { x } f(1.5)"),
        Error::TypeMismatch { .. }
    ));
    assert!(matches!(
        run_err(r#"f(x:integer) : integer { "s" } f(1)"#),
        Error::TypeMismatch { .. }
    ));
    assert!(matches!(
        run_err("f(x:list) { x } f(1)"),
        Error::TypeMismatch { .. }
    ));
}

#[test]
fn test_not_callable() {
    let err = run_err("x <- 3 x(1)");
    assert_eq!(err, Error::NotCallable { type_name: "integer".to_string() });
}

#[test]
fn test_invalid_regex() {
    assert!(matches!(run_err(r#""a" =~ "(""#), Error::RegexError { .. }));
    assert!(matches!(run_err(r#"split("a" "[")"#), Error::RegexError { .. }));
}

// ====================
// Stack exhaustion
// ====================

#[test]
fn test_unbounded_recursion_overflows() {
    let mut interpreter =
        Interpreter::with_config(InterpreterConfig::default().with_max_call_depth(100));
    let err = interpreter
        .program("f(n:integer) : integer { f(n+1) } f(0)")
        .unwrap_err();
    assert_eq!(err, Error::StackOverflow { depth: 100 });
    assert_eq!(err.to_string(), "Stack overflow: call depth exceeded 100");
}

#[test]
fn test_default_depth_limit_is_reported_not_crashed() {
    let err = run_err("loop() { loop() } loop()");
    assert_eq!(err, Error::StackOverflow { depth: 10_000 });
}

#[test]
fn test_interpreter_usable_after_overflow() {
    let mut interpreter =
        Interpreter::with_config(InterpreterConfig::default().with_max_call_depth(50));
    assert!(interpreter.program("f() { f() } f()").is_err());
    assert_eq!(
        interpreter.program("g(n:integer) : integer { n * 2 } g(21)").unwrap(),
        Some(vela::Operand::Integer(42))
    );
}

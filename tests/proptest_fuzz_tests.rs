//! Property-based fuzzing tests for the VeLa scanner, parser and interpreter
//!
//! These tests use proptest to generate random inputs and verify that:
//! 1. The scanner and parser never panic on arbitrary input
//! 2. Evaluating token soup either succeeds or returns an error, never panics
//! 3. Arithmetic, comparison and printing agree with Rust's own semantics

use proptest::prelude::*;
use vela::runtime::format_real;
use vela::{Interpreter, InterpreterConfig, Operand, Parser, Scanner};

// =============================================================================
// STRATEGY GENERATORS
// =============================================================================

/// Generate random strings that might break the scanner
fn arbitrary_source_string() -> impl Strategy<Value = String> {
    prop::string::string_regex(r"[\x00-\x7F]{0,300}").unwrap()
}

/// Generate programs made of plausible VeLa tokens
fn token_soup() -> impl Strategy<Value = String> {
    prop::collection::vec(vela_token(), 0..40).prop_map(|tokens| tokens.join(" "))
}

/// Generate tokens that look like VeLa program elements
///
/// `while` is left out so that generated programs always terminate.
fn vela_token() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("(".to_string()),
        Just(")".to_string()),
        Just("[".to_string()),
        Just("]".to_string()),
        Just("{".to_string()),
        Just("}".to_string()),
        // Keywords
        Just("when".to_string()),
        Just("->".to_string()),
        Just("if".to_string()),
        Just("then".to_string()),
        Just("else".to_string()),
        Just("function".to_string()),
        Just("is".to_string()),
        Just("<-".to_string()),
        Just("true".to_string()),
        Just("false".to_string()),
        // Operators
        Just("+".to_string()),
        Just("-".to_string()),
        Just("*".to_string()),
        Just("/".to_string()),
        Just("^".to_string()),
        Just("=".to_string()),
        Just("<>".to_string()),
        Just("<".to_string()),
        Just(">=".to_string()),
        Just("<<".to_string()),
        Just(">>".to_string()),
        Just("=~".to_string()),
        Just("in".to_string()),
        Just("and".to_string()),
        Just("or".to_string()),
        Just("xor".to_string()),
        Just("not".to_string()),
        Just(":".to_string()),
        // Types and names
        Just("integer".to_string()),
        Just("real".to_string()),
        Just("x".to_string()),
        Just("f".to_string()),
        Just("head".to_string()),
        Just("length".to_string()),
        Just("str".to_string()),
        // Literals
        (-1000i64..1000i64).prop_map(|n| n.to_string()),
        (0.0f64..100.0f64).prop_map(|f| format!("{:.2}", f)),
        "[a-z]{0,5}".prop_map(|s| format!("\"{}\"", s)),
    ]
}

/// Identifiers that collide with no keyword, built-in or constant
fn identifier() -> impl Strategy<Value = String> {
    "v[a-z0-9_]{0,7}"
}

fn fuzz_interpreter() -> Interpreter {
    Interpreter::with_config(InterpreterConfig::default().with_max_call_depth(64))
}

// =============================================================================
// SCANNER AND PARSER ROBUSTNESS
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// The scanner never panics on arbitrary input
    #[test]
    fn scanner_never_panics(source in arbitrary_source_string()) {
        let _ = Scanner::new(&source).scan_tokens();
    }

    /// The parser never panics on scanned token soup
    #[test]
    fn parser_never_panics(source in token_soup()) {
        if let Ok(tokens) = Scanner::new(&source).scan_tokens() {
            let _ = Parser::new(tokens).parse();
        }
    }

    /// Parse errors always carry a position inside the source
    #[test]
    fn parse_error_positions_are_in_range(source in token_soup()) {
        let lines = source.lines().count().max(1);
        let result = Scanner::new(&source)
            .scan_tokens()
            .and_then(|tokens| Parser::new(tokens).parse());
        if let Err(err) = result {
            let (line, column) = err.position().expect("parse errors have a position");
            prop_assert!(line >= 1 && line <= lines);
            prop_assert!(column <= source.chars().count());
        }
    }
}

// =============================================================================
// EVALUATOR ROBUSTNESS
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    /// Evaluating token soup returns a result or an error, never panics
    #[test]
    fn evaluator_never_panics(source in token_soup()) {
        let mut interpreter = fuzz_interpreter();
        let _ = interpreter.program(&source);
    }

    /// A failed program leaves the interpreter usable
    #[test]
    fn interpreter_recovers_after_errors(source in token_soup()) {
        let mut interpreter = fuzz_interpreter();
        let _ = interpreter.program(&source);
        prop_assert_eq!(interpreter.program("1 + 1").unwrap(), Some(Operand::Integer(2)));
    }

    /// Evaluating the same program twice is deterministic
    #[test]
    fn evaluation_is_deterministic(source in token_soup()) {
        let first = fuzz_interpreter().program(&source);
        let second = fuzz_interpreter().program(&source);
        match (first, second) {
            (Ok(a), Ok(b)) => prop_assert_eq!(format!("{:?}", a), format!("{:?}", b)),
            (Err(a), Err(b)) => prop_assert_eq!(a, b),
            (a, b) => prop_assert!(false, "diverged: {:?} vs {:?}", a, b),
        }
    }
}

// =============================================================================
// SEMANTIC PROPERTIES
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn integer_arithmetic_matches_rust(a in -100_000i64..100_000, b in -100_000i64..100_000) {
        let mut interpreter = Interpreter::new();
        let source = format!("[{} + {}, {} - {}, {} * {}]", a, b, a, b, a, b);
        let expected = Operand::list(vec![
            Operand::Integer(a + b),
            Operand::Integer(a - b),
            Operand::Integer(a * b),
        ]);
        prop_assert_eq!(interpreter.program(&source).unwrap(), Some(expected));
    }

    #[test]
    fn integer_division_truncates(a in -100_000i64..100_000, b in 1i64..1000) {
        let mut interpreter = Interpreter::new();
        let result = interpreter.program(&format!("({}) / {}", a, b)).unwrap();
        prop_assert_eq!(result, Some(Operand::Integer(a / b)));
    }

    #[test]
    fn comparisons_match_rust(a in -1000i64..1000, b in -1000i64..1000) {
        let mut interpreter = Interpreter::new();
        let source = format!(
            "[{a} < {b}, {a} <= {b}, {a} > {b}, {a} >= {b}, {a} = {b}, {a} <> {b}]",
            a = a,
            b = b
        );
        let expected = Operand::list(
            [a < b, a <= b, a > b, a >= b, a == b, a != b]
                .into_iter()
                .map(Operand::Boolean)
                .collect(),
        );
        prop_assert_eq!(interpreter.program(&source).unwrap(), Some(expected));
    }

    #[test]
    fn mixed_arithmetic_widens(a in -1000i64..1000, x in -1000.0f64..1000.0) {
        let mut interpreter = Interpreter::new();
        let source = format!("({}) + ({})", a, format_real(x));
        prop_assert_eq!(
            interpreter.program(&source).unwrap(),
            Some(Operand::Real(a as f64 + x))
        );
    }

    /// Printed reals read back as the same value
    #[test]
    fn real_literals_round_trip(x in 0.0f64..1.0e6) {
        let text = format_real(x);
        prop_assert!(text.contains('.') || text.contains('e'));
        let mut interpreter = Interpreter::new();
        prop_assert_eq!(interpreter.program(&text).unwrap(), Some(Operand::Real(x)));
    }

    /// Identifiers are case-insensitive
    #[test]
    fn identifiers_ignore_case(name in identifier(), n in -1000i64..1000) {
        let mut interpreter = Interpreter::new();
        let source = format!("{} <- ({}) {}", name, n, name.to_uppercase());
        prop_assert_eq!(interpreter.program(&source).unwrap(), Some(Operand::Integer(n)));
    }

    /// String concatenation and length agree
    #[test]
    fn string_length_adds(a in "[a-z ]{0,20}", b in "[a-z ]{0,20}") {
        let mut interpreter = Interpreter::new();
        let source = format!("length(\"{}\" + \"{}\")", a, b);
        prop_assert_eq!(
            interpreter.program(&source).unwrap(),
            Some(Operand::Integer((a.len() + b.len()) as i64))
        );
    }

    /// `seq` produces the inclusive range Rust would
    #[test]
    fn seq_matches_range(start in -50i64..50, len in 0i64..50, step in 1i64..5) {
        let end = start + len;
        let mut interpreter = Interpreter::new();
        let result = interpreter.program(&format!("seq(({}), ({}), {})", start, end, step)).unwrap();
        let expected: Vec<Operand> = (start..=end)
            .step_by(step as usize)
            .map(Operand::Integer)
            .collect();
        prop_assert_eq!(result, Some(Operand::list(expected)));
    }
}

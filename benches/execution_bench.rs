use criterion::{black_box, criterion_group, criterion_main, Criterion};
use vela::{Interpreter, Parser, Scanner};

const FACTORIAL: &str = r#"
    fact(n:integer) : integer {
        when
            n < 2 -> 1
            true -> n * fact(n - 1)
    }
    fact(20)
"#;

const LIST_PIPELINE: &str = r#"
    square(n:integer) : integer { n * n }
    odd(n:integer) : boolean { n - n/2*2 = 1 }
    add(a:integer b:integer) : integer { a + b }
    reduce(add map(square filter(odd seq(1 500 1))) 0)
"#;

fn lexer_benchmark(c: &mut Criterion) {
    c.bench_function("tokenize factorial program", |b| {
        b.iter(|| {
            let mut scanner = Scanner::new(black_box(FACTORIAL));
            scanner.scan_tokens().unwrap()
        })
    });
}

fn parser_benchmark(c: &mut Criterion) {
    let tokens = Scanner::new(FACTORIAL).scan_tokens().unwrap();
    c.bench_function("parse factorial program", |b| {
        b.iter(|| Parser::new(black_box(tokens.clone())).parse().unwrap())
    });
}

fn execution_benchmark(c: &mut Criterion) {
    c.bench_function("execute factorial", |b| {
        b.iter(|| {
            let mut interpreter = Interpreter::new();
            interpreter.program(black_box(FACTORIAL)).unwrap()
        })
    });

    c.bench_function("execute list pipeline", |b| {
        b.iter(|| {
            let mut interpreter = Interpreter::new();
            interpreter.program(black_box(LIST_PIPELINE)).unwrap()
        })
    });
}

criterion_group!(benches, lexer_benchmark, parser_benchmark, execution_benchmark);
criterion_main!(benches);

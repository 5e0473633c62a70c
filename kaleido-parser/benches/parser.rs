use criterion::{black_box, criterion_group, criterion_main, Criterion};
use kaleido_parser::parser::Parser;
use kaleido_source::Source;

fn parse(code: &str) {
    let source: Source = code.into();
    let mut parser = Parser::new(&source).unwrap();
    black_box(parser.parse_program());
}

fn bench_long_expression(c: &mut Criterion) {
    let mut code = String::from("0");
    for i in 0..500 {
        code.push_str(&format!(" + {} * {}", i, i + 1));
    }
    code.push(';');

    c.bench_function("parse long expression", |b| b.iter(|| parse(&code)));
}

fn bench_many_functions(c: &mut Criterion) {
    let mut code = String::new();
    for i in 0..100 {
        code.push_str(&format!(
            "int func{0}(int n) {{ int acc = 0; for (int i = 0; i < n; i = i + 1) {{ acc = acc + i * {0}; }} return acc; }}\n",
            i
        ));
    }

    c.bench_function("parse many functions", |b| b.iter(|| parse(&code)));
}

criterion_group!(benches, bench_long_expression, bench_many_functions);
criterion_main!(benches);

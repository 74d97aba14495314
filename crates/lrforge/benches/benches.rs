use criterion::{criterion_group, criterion_main, Criterion};
use lrforge::{grammar::Grammar, parser::Config, state::GrammarClass, syntax};
use std::hint::black_box;

criterion_main!(benches);
criterion_group!(benches, bench_small, bench_statements);

fn bench_small(c: &mut Criterion) {
    bench_generate(c, "arithmetic", include_str!("../tests/arithmetic.lrg"));
    bench_generate(c, "expr", include_str!("../tests/expr.lrg"));
    bench_generate(c, "propagation", include_str!("../tests/propagation.lrg"));
}

fn bench_statements(c: &mut Criterion) {
    bench_generate(c, "statements", include_str!("../tests/statements.lrg"));
}

fn bench_generate(c: &mut Criterion, name: &str, source: &str) {
    let grammar: Grammar = match syntax::parse(source) {
        Ok(grammar) => grammar,
        Err(err) => panic!("invalid grammar {}: {}", name, err),
    };
    for class in [GrammarClass::LR0, GrammarClass::LR1, GrammarClass::LALR1] {
        let mut config = Config::new();
        config.use_class(class);
        c.bench_function(&format!("{}/{}", name, class), |b| {
            b.iter(|| {
                let _table = black_box(config.generate(&grammar));
            });
        });
    }
}

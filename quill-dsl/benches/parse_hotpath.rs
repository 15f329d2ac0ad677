use criterion::{black_box, criterion_group, criterion_main, Criterion};
use quill_core::Target;
use quill_dsl::lexer::tokenize;
use quill_dsl::Parser;
use quill_test_utils::fixtures;

const PLAIN: &str = r#"/**
 * Loads a user.
 *
 * @param int $id
 * @return User
 * @tags{users, read, cached}
 * @deprecated
 */"#;

const ANNOTATED: &str = r#"/**
 * @Foo('x', required: 'y', array: {'s', 3}, enum: 'foo')
 * @Array(simple: {'a', 'b'}, complex: {{'a', 1}, {'b', 2}})
 */"#;

fn bench_tokenize(c: &mut Criterion) {
    c.bench_function("lexer/tokenize_plain", |b| {
        b.iter(|| black_box(tokenize(black_box(PLAIN)).len()));
    });
}

fn bench_parse(c: &mut Criterion) {
    let registry = fixtures::registry();

    c.bench_function("parser/plain_tags", |b| {
        let parser = Parser::new(&registry);
        b.iter(|| {
            let comment = parser.parse(black_box(PLAIN), Target::CLASS).expect("parse plain");
            black_box(comment.tags().count());
        });
    });

    c.bench_function("parser/type_tags", |b| {
        let parser = Parser::new(&registry).with_scope(fixtures::scope());
        b.iter(|| {
            let comment = parser
                .parse(black_box(ANNOTATED), Target::CLASS)
                .expect("parse annotated");
            black_box(comment.annotations().count());
        });
    });
}

criterion_group!(benches, bench_tokenize, bench_parse);
criterion_main!(benches);

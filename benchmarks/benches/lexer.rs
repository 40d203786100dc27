//! Benchmarks du lexer lox (Criterion)
//!
//! Paramètres via variables d'environnement :
//!   - CRIT_SAMPLES (def=60) : taille d'échantillon
//!   - BENCH_LARGE  (def=1)  : 0 pour désactiver la suite « large »
//!
//! Suites :
//!   1) micro     : petits extraits embarqués (variété de jetons)
//!   2) synthetic : blocs générés de 16, 64 et 256 KiB
//!
//! Lancer :
//!   cargo bench -p lox-benches --bench lexer

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use lox_benches::synthetic_source;
use lox_lexer::{Scanner, TokenKind};

fn env_usize(key: &str, default: usize) -> usize {
    std::env::var(key).ok().and_then(|s| s.parse().ok()).unwrap_or(default)
}

fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key).ok().and_then(|s| s.parse::<u8>().ok()).map_or(default, |v| v != 0)
}

const MICROS: &[(&str, &str)] = &[
    ("decl", "var x = 12.5;\nvar y = x * 2 - 1;\n"),
    ("keywords", "class A < B { fun f() { if (this.x) return super.y; else return nil; } }\n"),
    ("operators", "a != b == c >= d <= e > f < g = !h;\n"),
    ("strings", "print \"hello\" ; print \"multi\nline\";\n"),
    ("comments", "// a comment line\n// another one\nprint 1; // trailing\n"),
];

/// Nombre de jetons jusqu'à `Eof` inclus.
fn lex_count(src: &str) -> usize {
    let mut sc = Scanner::new(src);
    let mut n = 0;
    loop {
        n += 1;
        if sc.scan_token().kind == TokenKind::Eof {
            return n;
        }
    }
}

fn bench_micro(c: &mut Criterion) {
    let mut group = c.benchmark_group("lexer/micro");
    group.sample_size(env_usize("CRIT_SAMPLES", 60));
    for (name, src) in MICROS {
        group.throughput(Throughput::Bytes(src.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(name), src, |b, src| {
            b.iter(|| lex_count(black_box(src)));
        });
    }
    group.finish();
}

fn bench_synthetic(c: &mut Criterion) {
    if !env_bool("BENCH_LARGE", true) {
        return;
    }
    let mut group = c.benchmark_group("lexer/synthetic");
    group.sample_size(env_usize("CRIT_SAMPLES", 60));
    for kib in [16, 64, 256] {
        let src = synthetic_source(kib);
        group.throughput(Throughput::Bytes(src.len() as u64));
        group.bench_with_input(BenchmarkId::new("kib", kib), &src, |b, src| {
            b.iter(|| lex_count(black_box(src)));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_micro, bench_synthetic);
criterion_main!(benches);

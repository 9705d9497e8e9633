//! Benchmarks for token hot paths

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use warden_auth_core::{constant_time_str_eq, hash_token, AuthConfig, TokenCodec, TokenKind};
use warden_types::{SessionId, UserId};

fn codec() -> TokenCodec {
    TokenCodec::new(&AuthConfig::new("a".repeat(32), "b".repeat(32))).unwrap()
}

fn bench_token_operations(c: &mut Criterion) {
    let codec = codec();
    let user = UserId::new();
    let session = SessionId::new();

    let mut group = c.benchmark_group("token");

    group.bench_function("issue_access", |b| {
        b.iter(|| codec.issue(TokenKind::Access, black_box(user), black_box(session)).unwrap());
    });

    let issued = codec.issue(TokenKind::Access, user, session).unwrap();

    group.bench_function("verify_access", |b| {
        b.iter(|| codec.verify(TokenKind::Access, black_box(&issued.token)).unwrap());
    });

    group.bench_function("verify_rejects_garbage", |b| {
        b.iter(|| codec.verify(TokenKind::Access, black_box("a.b.c")).unwrap_err());
    });

    group.bench_function("decode_unverified", |b| {
        b.iter(|| TokenCodec::decode_unverified(black_box(&issued.token)).unwrap());
    });

    group.finish();
}

fn bench_hash_operations(c: &mut Criterion) {
    let codec = codec();
    let issued = codec
        .issue(TokenKind::Refresh, UserId::new(), SessionId::new())
        .unwrap();
    let stored = hash_token(&issued.token);

    let mut group = c.benchmark_group("hash");

    group.bench_function("hash_token", |b| {
        b.iter(|| hash_token(black_box(&issued.token)));
    });

    // The comparison that runs on every rotation
    group.bench_function("compare_current", |b| {
        let presented = hash_token(&issued.token);
        b.iter(|| constant_time_str_eq(black_box(&presented), black_box(&stored)));
    });

    // Worst case: scan a full history without a match
    group.bench_function("scan_history_10", |b| {
        let history: Vec<String> = (0..10).map(|i| hash_token(&format!("t{i}"))).collect();
        let presented = hash_token("not-in-history");
        b.iter(|| {
            history
                .iter()
                .any(|used| constant_time_str_eq(black_box(used), black_box(&presented)))
        });
    });

    group.finish();
}

criterion_group!(benches, bench_token_operations, bench_hash_operations);
criterion_main!(benches);

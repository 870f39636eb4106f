//! Benchmarks for the chunked blob builder.

extern crate cilmeta;

use std::{hint::black_box, sync::Arc};

use cilmeta::blob::{BlobBuilder, BlobWrite, ChunkPool};
use criterion::{criterion_group, criterion_main, Criterion};

/// Append 4,096 compressed integers and user strings, then materialize.
fn bench_write(c: &mut Criterion) {
    c.bench_function("builder_write_mixed", |b| {
        b.iter(|| {
            let mut builder = BlobBuilder::new();
            for value in 0u32..4096 {
                builder.write_compressed_integer(black_box(value)).unwrap();
                builder.write_u32(value).unwrap();
            }
            for _ in 0..64 {
                builder.write_user_string(black_box("benchmark")).unwrap();
            }
            black_box(builder.to_vec())
        });
    });
}

/// Same workload drawing chunks from a shared pool.
fn bench_pooled(c: &mut Criterion) {
    let pool = Arc::new(ChunkPool::default());

    c.bench_function("builder_write_pooled", |b| {
        b.iter(|| {
            let mut builder = BlobBuilder::with_pool(pool.clone());
            for value in 0u32..4096 {
                builder.write_compressed_integer(black_box(value)).unwrap();
                builder.write_u32(value).unwrap();
            }
            let count = builder.count();
            builder.free().unwrap();
            black_box(count)
        });
    });
}

/// Link 256 small builders into one.
fn bench_link(c: &mut Criterion) {
    c.bench_function("builder_link_256", |b| {
        b.iter(|| {
            let mut root = BlobBuilder::with_capacity(64);
            for index in 0u32..256 {
                let mut part = BlobBuilder::with_capacity(64);
                part.write_u32(index).unwrap();
                root.link_suffix(part);
            }
            black_box(root.count())
        });
    });
}

criterion_group!(benches, bench_write, bench_pooled, bench_link);
criterion_main!(benches);

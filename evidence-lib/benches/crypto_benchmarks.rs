//! Cryptographic operation benchmarks
//!
//! Measures the operations on the evidence path: sealing, unsealing and
//! fingerprinting at representative artifact sizes.
//!
//! Run with: `cargo bench --bench crypto_benchmarks`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use evidence_lib::{fingerprint, seal, unseal, KeyPair};

const SIZES: &[(&str, usize)] = &[("1kb", 1024), ("64kb", 64 * 1024), ("1mb", 1024 * 1024)];

/// Benchmark RSA-2048 key generation
fn bench_key_generation(c: &mut Criterion) {
    let mut group = c.benchmark_group("rsa_keypair_generation");
    group.sample_size(10);
    group.bench_function("2048", |b| b.iter(|| black_box(KeyPair::generate().unwrap())));
    group.finish();
}

/// Benchmark sealing (AES-256-GCM + RSA-OAEP key wrap)
fn bench_seal(c: &mut Criterion) {
    let pair = KeyPair::generate().unwrap();
    let mut group = c.benchmark_group("seal");

    for (label, size) in SIZES {
        let payload = vec![0x5Au8; *size];
        group.throughput(Throughput::Bytes(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(label), &payload, |b, payload| {
            b.iter(|| black_box(seal(black_box(payload), pair.public_key()).unwrap()))
        });
    }
    group.finish();
}

/// Benchmark unsealing, dominated by the RSA private-key operation for small blobs
fn bench_unseal(c: &mut Criterion) {
    let pair = KeyPair::generate().unwrap();
    let mut group = c.benchmark_group("unseal");

    for (label, size) in SIZES {
        let blob = seal(&vec![0x5Au8; *size], pair.public_key()).unwrap();
        group.throughput(Throughput::Bytes(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(label), &blob, |b, blob| {
            b.iter(|| black_box(unseal(black_box(blob), pair.private_key()).unwrap()))
        });
    }
    group.finish();
}

/// Benchmark SHA-256 fingerprints
fn bench_fingerprint(c: &mut Criterion) {
    let mut group = c.benchmark_group("fingerprint");

    for (label, size) in SIZES {
        let blob = vec![0xA5u8; *size];
        group.throughput(Throughput::Bytes(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(label), &blob, |b, blob| {
            b.iter(|| black_box(fingerprint(black_box(blob))))
        });
    }
    group.finish();
}

criterion_group!(
    crypto_benches,
    bench_key_generation,
    bench_seal,
    bench_unseal,
    bench_fingerprint,
);

criterion_main!(crypto_benches);

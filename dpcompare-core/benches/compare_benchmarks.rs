use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use dpcompare_core::{AlignContext, CompareMode, CompareParams};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn generate_test_sequence(length: usize, seed: u64) -> Vec<u8> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..length).map(|_| b"ACGT"[rng.gen_range(0..4)]).collect()
}

/// A dovetail pair sharing `overlap` bases, with a substitution every 25.
fn dovetail_pair(length: usize, overlap: usize) -> (Vec<u8>, Vec<u8>) {
    let a = generate_test_sequence(length, 17);
    let tail = generate_test_sequence(length - overlap, 29);
    let mut b = a[length - overlap..].to_vec();
    for pos in (12..b.len()).step_by(25) {
        b[pos] = if b[pos] == b'A' { b'C' } else { b'A' };
    }
    b.extend_from_slice(&tail);
    (a, b)
}

fn bench_compare_modes(c: &mut Criterion) {
    let (a, b) = dovetail_pair(2000, 800);
    let mut ctx = AlignContext::new();

    let mut group = c.benchmark_group("compare_2kb");
    for mode in [CompareMode::Overlap, CompareMode::Align, CompareMode::AffineAlign] {
        let params = CompareParams {
            mode,
            ..CompareParams::full_range(a.len(), b.len())
        };
        group.bench_with_input(BenchmarkId::from_parameter(mode), &params, |bench, params| {
            bench.iter(|| black_box(ctx.compare(black_box(&a), black_box(&b), params)))
        });
    }
    group.finish();
}

fn bench_boundary_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("boundary");
    for length in [500usize, 2000, 8000] {
        let (a, b) = dovetail_pair(length, length / 2);
        let mut ctx = AlignContext::new();
        ctx.prepare(length, 0.06, 1e-6);
        let ld_ratio = 0.06 / 0.94;
        group.bench_with_input(BenchmarkId::from_parameter(length), &length, |bench, &length| {
            bench.iter(|| black_box(ctx.boundary(&a, &b, 0, length as i64, 40, ld_ratio)))
        });
    }
    group.finish();
}

fn bench_tail_score(c: &mut Criterion) {
    let (a, b) = dovetail_pair(1000, 1000);
    let mut ctx = AlignContext::new();
    c.bench_function("tail_score_1kb", |bench| {
        bench.iter(|| black_box(ctx.tail_score(black_box(&a), black_box(&b), 0, 0, 4.0)))
    });
}

criterion_group!(benches, bench_compare_modes, bench_boundary_scan, bench_tail_score);
criterion_main!(benches);

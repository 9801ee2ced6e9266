//! End-to-end brute-force scan benchmark over a synthetic multi-megabyte
//! image, to track the cost of the offset x cols enumeration as a whole
//! rather than just the correlation kernel it calls.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use mapscout::{BruteScanner, ByteImage, ScanConfig};

fn synthetic_image(size: usize) -> ByteImage {
    let mut bytes = vec![0u8; size];
    for (i, b) in bytes.iter_mut().enumerate() {
        *b = ((i * 2654435761usize) >> 16) as u8;
    }
    ByteImage::new(bytes)
}

fn bench_scan_one_megabyte(c: &mut Criterion) {
    let image = synthetic_image(1 << 20);
    let scanner = BruteScanner::new(ScanConfig {
        min_rows: 3,
        max_cols: 32,
        workers: Some(1),
    });
    c.bench_function("scan_1mb_single_worker", |bencher| {
        bencher.iter(|| black_box(scanner.scan(black_box(&image), None, None)))
    });
}

fn bench_scan_one_megabyte_parallel(c: &mut Criterion) {
    let image = synthetic_image(1 << 20);
    let scanner = BruteScanner::new(ScanConfig {
        min_rows: 3,
        max_cols: 32,
        workers: None,
    });
    c.bench_function("scan_1mb_all_cores", |bencher| {
        bencher.iter(|| black_box(scanner.scan(black_box(&image), None, None)))
    });
}

criterion_group!(benches, bench_scan_one_megabyte, bench_scan_one_megabyte_parallel);
criterion_main!(benches);

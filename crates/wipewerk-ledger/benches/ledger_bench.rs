// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for canonical hashing, appends, and chain
// verification in the wipewerk-ledger crate.

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use wipewerk_ledger::{ErasureRecord, LedgerStore, digest_canonical, hash_bytes};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn sample_record(i: usize) -> ErasureRecord {
    ErasureRecord {
        certificate_id: format!("{:016X}", i),
        certificate_hash: hash_bytes(format!("cert-{i}").as_bytes()),
        device_serial: format!("WD-WCC4N{i:06}"),
        device_model: "WDC WD10EZEX-08WN4A0".into(),
        device_type: "HDD".into(),
        wipe_method: "dodshort".into(),
        wipe_status: "completed".into(),
        wipe_start: "2026-10-16T09:00:00+00:00".into(),
        wipe_end: "2026-10-16T09:00:09+00:00".into(),
        simulated: true,
    }
}

fn ledger_with(blocks: usize) -> (tempfile::TempDir, LedgerStore) {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = LedgerStore::open(dir.path().join("ledger.json")).expect("open ledger");
    for i in 0..blocks {
        store.append_record(sample_record(i)).expect("append");
    }
    (dir, store)
}

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

/// Canonical digest of a single erasure record.
fn bench_canonical_digest(c: &mut Criterion) {
    let record = sample_record(7);
    c.bench_function("digest_canonical (erasure record)", |b| {
        b.iter(|| black_box(digest_canonical(black_box(&record)).expect("digest")));
    });
}

/// One append onto ledgers of increasing length.
///
/// Each append rewrites the whole file, so cost grows with ledger size.
fn bench_append(c: &mut Criterion) {
    let mut group = c.benchmark_group("ledger_append");
    group.sample_size(20);
    for &size in &[10usize, 100, 500] {
        let (_dir, store) = ledger_with(size);
        let mut n = size;
        group.bench_function(format!("{size} blocks"), |b| {
            b.iter(|| {
                n += 1;
                black_box(store.append_record(sample_record(n)).expect("append"));
            });
        });
    }
    group.finish();
}

/// Full-chain verification.
fn bench_verify_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("ledger_verify_chain");
    for &size in &[10usize, 100, 1000] {
        let (_dir, store) = ledger_with(size);
        let snapshot = store.snapshot().expect("snapshot");
        let tail = snapshot.len() as u64 - 1;
        group.bench_function(format!("{size} blocks"), |b| {
            b.iter(|| black_box(snapshot.verify_chain(black_box(tail))));
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_canonical_digest,
    bench_append,
    bench_verify_chain
);
criterion_main!(benches);

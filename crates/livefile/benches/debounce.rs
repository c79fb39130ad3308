//! Performance benchmarks for the debounce gate and trigger path.
//!
//! Run with: `cargo bench -p livefile`

use std::sync::Arc;
use std::time::{Duration, Instant};

use livefile::{DebounceGate, LiveFile};

fn main() {
    divan::main();
}

// ============================================================================
// Gate Evaluation
// ============================================================================

#[divan::bench(args = [10, 100, 1000])]
fn gate_burst(bencher: divan::Bencher, len: u64) {
    let base = Instant::now();
    let instants: Vec<Instant> = (1..=len).map(|i| base + Duration::from_millis(i)).collect();

    bencher.bench_local(|| {
        let mut gate = DebounceGate::new(Duration::from_millis(50), base);
        let mut accepted = 0usize;
        for &now in &instants {
            if gate.should_accept_at(divan::black_box(now), true) {
                accepted += 1;
            }
        }
        accepted
    });
}

#[divan::bench]
fn gate_probe(bencher: divan::Bencher) {
    let base = Instant::now();
    let mut gate = DebounceGate::new(Duration::from_millis(50), base);
    let now = base + Duration::from_millis(10);

    bencher.bench_local(|| gate.should_accept_at(divan::black_box(now), false));
}

// ============================================================================
// Content Access
// ============================================================================

fn live_with(content: &str) -> (tempfile::TempDir, Arc<LiveFile<(), usize>>) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bench.txt");
    std::fs::write(&path, content).unwrap();

    let live = LiveFile::builder(&path)
        .watcher_delay(Duration::from_secs(3600))
        .renderer(|text: &str, _: &()| Ok(text.len()))
        .start();
    live.set_content(content);
    (dir, Arc::new(live))
}

#[divan::bench]
fn content_clone(bencher: divan::Bencher) {
    let (_dir, live) = live_with(&"x".repeat(64 * 1024));
    bencher.bench_local(|| live.content());
}

#[divan::bench]
fn content_read_closure(bencher: divan::Bencher) {
    let (_dir, live) = live_with(&"x".repeat(64 * 1024));
    bencher.bench_local(|| live.read_content(str::len));
}

#[divan::bench]
fn render_call(bencher: divan::Bencher) {
    let (_dir, live) = live_with(&"x".repeat(64 * 1024));
    bencher.bench_local(|| live.render(&()).unwrap());
}

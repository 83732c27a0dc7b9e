use divan::{Bencher, black_box};
use harvest::{MetricDef, Registry};

fn main() {
    divan::main();
}

const THREADS: &[usize] = &[1, 2, 4, 8];
const ITEMS: &[usize] = &[100, 1000, 10000];
const TAGS: &[&str] = &["/foo/bar", "/foo/baz", "/health", "/users/:id"];

fn defs() -> [MetricDef; 3] {
    [
        MetricDef::sum("count"),
        MetricDef::average("proctime"),
        MetricDef::maximum("max_proctime"),
    ]
}

#[divan::bench(consts = THREADS, args = ITEMS)]
fn add<const T: usize>(bencher: Bencher, items: usize) {
    bencher
        .with_inputs(|| Registry::new().define(MetricDef::sum("count")))
        .bench_values(|metric| {
            std::thread::scope(|s| {
                for _ in 0..T {
                    let metric = metric.clone();
                    s.spawn(move || {
                        for i in 0..items {
                            metric.add(black_box(i as i64));
                        }
                    });
                }
            });
        });
}

#[divan::bench(consts = THREADS, args = ITEMS)]
fn add_for_tag<const T: usize>(bencher: Bencher, items: usize) {
    bencher
        .with_inputs(|| Registry::new().define(MetricDef::average("proctime")))
        .bench_values(|metric| {
            std::thread::scope(|s| {
                for _ in 0..T {
                    let metric = metric.clone();
                    s.spawn(move || {
                        for i in 0..items {
                            metric.add_for_tag(black_box(TAGS[i % TAGS.len()]), i as i64);
                        }
                    });
                }
            });
        });
}

#[divan::bench]
fn add_disabled(bencher: Bencher) {
    let metric = harvest::Metric::disabled();
    bencher.bench(|| metric.add(black_box(1)));
}

#[divan::bench(args = ITEMS)]
fn snapshot(bencher: Bencher, items: usize) {
    bencher
        .with_inputs(|| {
            let registry = Registry::new();
            for def in defs() {
                let metric = registry.define(def);
                for i in 0..items {
                    metric.add_for_tag(TAGS[i % TAGS.len()], i as i64);
                }
            }
            registry
        })
        .bench_refs(|registry| black_box(registry.snapshot_now()));
}

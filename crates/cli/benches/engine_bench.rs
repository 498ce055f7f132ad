use config::Config;
use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use engine::Engine;
use tempfile::tempdir;

const N_KEYS: usize = 2_000;
const VALUE_SIZE: usize = 100;

fn bench_config(dir: &std::path::Path) -> Config {
    Config::new(dir).with_flush_threshold_bytes(64 * 1024)
}

fn engine_put_benchmark(c: &mut Criterion) {
    c.bench_function("engine_put_2k", |b| {
        b.iter_batched(
            || {
                let dir = tempdir().unwrap();
                let engine = Engine::open(bench_config(dir.path())).unwrap();
                (dir, engine)
            },
            |(_dir, engine)| {
                let value = "x".repeat(VALUE_SIZE);
                for i in 0..N_KEYS {
                    engine.put(format!("key{:06}", i), value.as_str()).unwrap();
                }
                engine.wait_for_background().unwrap();
            },
            BatchSize::PerIteration,
        );
    });
}

fn engine_get_benchmark(c: &mut Criterion) {
    let dir = tempdir().unwrap();
    let engine = Engine::open(bench_config(dir.path())).unwrap();
    let value = "x".repeat(VALUE_SIZE);
    for i in 0..N_KEYS {
        engine.put(format!("key{:06}", i), value.as_str()).unwrap();
    }
    engine.force_flush().unwrap();
    engine.wait_for_background().unwrap();

    let mut i = 0usize;
    c.bench_function("engine_get_hit_flushed", |b| {
        b.iter(|| {
            let key = format!("key{:06}", i % N_KEYS);
            i += 1;
            engine.get(&key).unwrap()
        })
    });

    c.bench_function("engine_get_miss", |b| {
        b.iter(|| engine.get("zzz-missing").unwrap())
    });
}

criterion_group!(benches, engine_put_benchmark, engine_get_benchmark);
criterion_main!(benches);

//! Single-buffer against lane-parallel throughput.
//!
//! ```bash
//! RUSTFLAGS="-C target-cpu=native" cargo bench --bench multibuffer
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use mbcrypt::{
    eea3_1_buffer, eia3_1_buffer, Algorithm, CipherLane, Direction, Dispatch, EngineConfig, Job,
    JobManager, LaneWidth, MacLane,
};

const SIZES: [usize; 3] = [64, 1500, 8188];
const BUFFERS: usize = 16;

fn inputs(len: usize) -> Vec<Vec<u8>> {
    (0..BUFFERS)
        .map(|b| (0..len).map(|i| (i * 31 + b) as u8).collect())
        .collect()
}

fn bench_eea3(c: &mut Criterion) {
    let key = [0x17u8; 16];
    let iv = [0x42u8; 16];
    let mut g = c.benchmark_group("eea3");

    for len in SIZES {
        let srcs = inputs(len);
        let mut dsts = vec![vec![0u8; len]; BUFFERS];
        g.throughput(Throughput::Bytes((len * BUFFERS) as u64));

        g.bench_with_input(BenchmarkId::new("1_buffer", len), &len, |b, _| {
            b.iter(|| {
                for (src, dst) in srcs.iter().zip(dsts.iter_mut()) {
                    eea3_1_buffer(&key, &iv, black_box(src), dst).unwrap();
                }
            })
        });

        for width in LaneWidth::ALL {
            let dispatch = Dispatch::portable(width);
            g.bench_with_input(BenchmarkId::new(width.as_str(), len), &len, |b, _| {
                b.iter(|| {
                    let mut lanes: Vec<CipherLane<'_>> = srcs
                        .iter()
                        .zip(dsts.iter_mut())
                        .map(|(src, dst)| CipherLane::new(&key, &iv, black_box(src), dst).unwrap())
                        .collect();
                    dispatch.eea3_n_buffer(&mut lanes).unwrap();
                })
            });
        }
    }
    g.finish();
}

fn bench_eia3(c: &mut Criterion) {
    let key = [0x17u8; 16];
    let iv = [0x42u8; 16];
    let mut g = c.benchmark_group("eia3");

    for len in SIZES {
        let msgs = inputs(len);
        let bits = len * 8;
        g.throughput(Throughput::Bytes((len * BUFFERS) as u64));

        g.bench_with_input(BenchmarkId::new("1_buffer", len), &len, |b, _| {
            b.iter(|| {
                for msg in &msgs {
                    black_box(eia3_1_buffer(&key, &iv, black_box(msg), bits).unwrap());
                }
            })
        });

        for width in LaneWidth::ALL {
            let dispatch = Dispatch::portable(width);
            let mut tags = [[0u8; 4]; BUFFERS];
            g.bench_with_input(BenchmarkId::new(width.as_str(), len), &len, |b, _| {
                b.iter(|| {
                    let mut lanes: Vec<MacLane<'_>> = msgs
                        .iter()
                        .zip(tags.iter_mut())
                        .map(|(msg, tag)| MacLane::new(&key, &iv, black_box(msg), bits, tag).unwrap())
                        .collect();
                    dispatch.eia3_n_buffer(&mut lanes).unwrap();
                })
            });
        }
    }
    g.finish();
}

/// Whole manager path: job construction, submission and collection.
fn bench_manager(c: &mut Criterion) {
    let mut g = c.benchmark_group("manager");
    let len = 1500;
    g.throughput(Throughput::Bytes((len * BUFFERS) as u64));

    for width in LaneWidth::ALL {
        let config = EngineConfig {
            report_eagerly: false,
            ..EngineConfig::default()
        };
        let mut mgr = JobManager::with_dispatch(config, Dispatch::portable(width));
        g.bench_function(BenchmarkId::new("eea3_burst", width.as_str()), |b| {
            b.iter(|| {
                let jobs = (0..BUFFERS).map(|i| {
                    Job::eea3(Direction::Encrypt, [0x17; 16], [i as u8; 16], vec![0xA5; len])
                });
                let mut outcome = mgr.submit_burst(jobs);
                outcome.completed.extend(mgr.flush_burst(Algorithm::ZucEea3));
                black_box(outcome.completed.len())
            })
        });
    }
    g.finish();
}

criterion_group!(benches, bench_eea3, bench_eia3, bench_manager);
criterion_main!(benches);

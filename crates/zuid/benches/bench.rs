use core::hint::black_box;
use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use std::time::Instant;
use zuid::{
    BasicZuidGenerator, IdGenStatus, MachineId, StrictZuidGenerator, SystemClock, TimeSource,
    Timestamp, WorkerId, ZuidGenerator, ZuidId,
};

struct FixedMockTime {
    now: Timestamp,
}

impl TimeSource for FixedMockTime {
    fn now(&self) -> Timestamp {
        self.now
    }
}

// Number of IDs generated per benchmark iteration. One full sequence space.
const TOTAL_IDS: usize = 2048;

/// Benchmarks a hot-path generator where IDs are always `Ready`.
fn bench_generator<G>(c: &mut Criterion, group_name: &str, generator_factory: impl Fn() -> G)
where
    G: ZuidGenerator,
{
    let mut group = c.benchmark_group(group_name);
    group.throughput(Throughput::Elements(TOTAL_IDS as u64));

    group.bench_function(format!("elems/{TOTAL_IDS}"), |b| {
        b.iter_custom(|iters| {
            let start = Instant::now();

            for _ in 0..iters {
                let mut generator = generator_factory();
                for _ in 0..TOTAL_IDS {
                    match generator.poll_id() {
                        IdGenStatus::Ready { id } => {
                            black_box(id);
                        }
                        IdGenStatus::Pending { .. } => unreachable!(),
                    }
                }
            }

            start.elapsed()
        });
    });

    group.finish();
}

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode");
    group.throughput(Throughput::Elements(1));
    group.bench_function("from_components", |b| {
        b.iter(|| {
            ZuidId::from_components(
                black_box(3),
                black_box(2),
                black_box(1024),
                black_box(1_700_000_000),
                black_box(500),
            )
        });
    });
    group.bench_function("to_string", |b| {
        let id = ZuidId::from_components(3, 2, 1024, 1_700_000_000, 500);
        b.iter(|| black_box(id).to_string());
    });
    group.finish();
}

fn bench_generators(c: &mut Criterion) {
    let machine = MachineId::new(3).unwrap();
    let worker = WorkerId::new(2).unwrap();
    let fixed = || FixedMockTime {
        now: Timestamp::new(1_700_000_000, 500),
    };

    bench_generator(c, "basic/mock", || {
        BasicZuidGenerator::new(machine, worker, fixed())
    });
    bench_generator(c, "basic/system", || {
        BasicZuidGenerator::new(machine, worker, SystemClock)
    });
    bench_generator(c, "strict/mock", || {
        StrictZuidGenerator::new(machine, worker, fixed())
    });
}

criterion_group!(benches, bench_encode, bench_generators);
criterion_main!(benches);

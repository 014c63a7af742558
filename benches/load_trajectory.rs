use std::{fmt::Write as _, io::Cursor};

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use trajstore::{
    file_io::FileProcessor, ingest_trajectory, IngestParams, LammpsParams, LammpsTrajectoryFile,
    MemoryStore,
};

const N_PARTICLES: usize = 512;
const N_CONFIGURATIONS: usize = 64;

fn water_dump() -> Vec<u8> {
    let mut out = String::new();
    for c in 0..N_CONFIGURATIONS {
        let _ = write!(
            out,
            "ITEM: TIMESTEP\n{}\nITEM: NUMBER OF ATOMS\n{N_PARTICLES}\nITEM: BOX BOUNDS pp pp pp\n\
             0 25\n0 25\n0 25\nITEM: ATOMS id element x y z vx vy vz fx fy fz\n",
            c * 10
        );
        for id in (1..=N_PARTICLES).rev() {
            let element = if id % 3 == 0 { "O" } else { "H" };
            let v = id as f64 * 0.01 + c as f64;
            let _ = writeln!(
                out,
                "{id} {element} {v} {v} {v} -{v} -{v} -{v} {v} {v} {v}"
            );
        }
    }
    out.into_bytes()
}

fn bench_batch_sizes(c: &mut Criterion) {
    let bytes = water_dump();
    let mut group = c.benchmark_group("read_batches");
    group.throughput(Throughput::Elements(N_CONFIGURATIONS as u64));

    for batch_size in [1usize, 8, 32, 64] {
        group.bench_with_input(
            BenchmarkId::from_parameter(batch_size),
            &batch_size,
            |b, &batch_size| {
                b.iter(|| {
                    let params = LammpsParams::builder()
                        .trajectory_is_sorted_by_ids(false)
                        .build()
                        .unwrap();
                    let mut dump =
                        LammpsTrajectoryFile::from_reader(Cursor::new(bytes.as_slice()), params)
                            .unwrap();
                    while dump.remaining_configurations() > 0 {
                        let n = batch_size.min(dump.remaining_configurations());
                        let _ = dump.get_next_n_configurations(n).unwrap();
                    }
                })
            },
        );
    }
    group.finish();
}

fn bench_ingest_memory_store(c: &mut Criterion) {
    let bytes = water_dump();
    c.bench_function("ingest_memory_store", |b| {
        b.iter(|| {
            let params = LammpsParams::builder()
                .trajectory_is_sorted_by_ids(false)
                .build()
                .unwrap();
            let mut dump =
                LammpsTrajectoryFile::from_reader(Cursor::new(bytes.as_slice()), params).unwrap();
            let store = MemoryStore::new();
            ingest_trajectory(&mut dump, &store, &IngestParams::default()).unwrap()
        })
    });
}

criterion_group!(benches, bench_batch_sizes, bench_ingest_memory_store);
criterion_main!(benches);

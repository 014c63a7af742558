mod common;

use approx::assert_relative_eq;
use camino::Utf8PathBuf;
use trajstore::{
    ingest_trajectory, ArrayStore, ChunkedStore, IngestParams, LammpsParams,
    LammpsTrajectoryFile, MemoryStore, SliceSpec, StorePath,
};

use common::{fixture, synthetic_dump, synthetic_value, write_temp};

#[test]
fn nacl_into_chunked_store() {
    let dir = tempfile::tempdir().unwrap();
    let root = Utf8PathBuf::from_path_buf(dir.path().join("nacl")).unwrap();
    let store = ChunkedStore::create(&root, 2).unwrap();

    let mut dump = LammpsTrajectoryFile::open(&fixture("nacl.lammpstrj"), LammpsParams::default())
        .unwrap();
    let params = IngestParams::builder().batch_size(2).build().unwrap();
    let report = ingest_trajectory(&mut dump, &store, &params).unwrap();

    assert_eq!(report.configurations_written, 3);
    assert_eq!(report.n_batches, 2);
    assert_eq!(report.paths.len(), 4);
    // 4 particles * 6 values * 3 configurations * 8 bytes
    assert_eq!(report.stored_bytes, 576);

    let na = store
        .read(&StorePath::new("Na", "Positions").unwrap(), &SliceSpec::full())
        .unwrap();
    assert_eq!(na.dim(), (2, 3, 3));
    assert_relative_eq!(na[[1, 2, 0]], 3.2);

    let first = store
        .read(
            &StorePath::new("Na", "Positions").unwrap(),
            &SliceSpec::full().configurations(0..1),
        )
        .unwrap();
    assert_eq!(first.dim(), (2, 1, 3));
}

#[test]
fn two_runs_append_along_configurations() {
    let species = ["Ar", "Ne", "Ar"];
    let (_d1, run_1) = write_temp("run_1.lammpstrj", &synthetic_dump(&species, 4, false));
    let (_d2, run_2) = write_temp("run_2.lammpstrj", &synthetic_dump(&species, 3, true));
    let store = MemoryStore::new();
    let params = IngestParams::builder().memory_budget_bytes(150).build().unwrap();

    let mut first = LammpsTrajectoryFile::open(&run_1, LammpsParams::default()).unwrap();
    ingest_trajectory(&mut first, &store, &params).unwrap();

    let unsorted = LammpsParams::builder()
        .trajectory_is_sorted_by_ids(false)
        .build()
        .unwrap();
    let mut second = LammpsTrajectoryFile::open(&run_2, unsorted).unwrap();
    let report = ingest_trajectory(&mut second, &store, &params).unwrap();
    assert_eq!(report.configuration_offset, 4);

    let ar = store
        .read(&StorePath::new("Ar", "Velocities").unwrap(), &SliceSpec::full())
        .unwrap();
    assert_eq!(ar.dim(), (2, 7, 3));
    assert_relative_eq!(ar[[1, 3, 0]], synthetic_value(3, 3, 3));
    // configuration 0 of the second run
    assert_relative_eq!(ar[[1, 4, 0]], synthetic_value(3, 0, 3));
    assert_relative_eq!(ar[[0, 6, 2]], synthetic_value(1, 2, 5));
}

#[test]
fn failed_ingestion_keeps_written_length() {
    let good = synthetic_dump(&["A"], 5, false);
    let bad = good.replacen("1 A 1003 ", "1 A abc ", 1);
    let (_d1, bad_path) = write_temp("bad.lammpstrj", &bad);
    let (_d2, good_path) = write_temp("good.lammpstrj", &good);

    let dir = tempfile::tempdir().unwrap();
    let root = Utf8PathBuf::from_path_buf(dir.path().join("store")).unwrap();
    let store = ChunkedStore::create(&root, 4).unwrap();
    let params = IngestParams::builder().batch_size(2).build().unwrap();
    let path = StorePath::new("A", "Positions").unwrap();

    let mut dump = LammpsTrajectoryFile::open(&bad_path, LammpsParams::default()).unwrap();
    assert!(ingest_trajectory(&mut dump, &store, &params).is_err());
    assert_eq!(store.shape(&path), Some([1, 2, 3]));

    let mut dump = LammpsTrajectoryFile::open(&good_path, LammpsParams::default()).unwrap();
    let report = ingest_trajectory(&mut dump, &store, &params).unwrap();
    assert_eq!(report.configuration_offset, 2);
    assert_eq!(store.shape(&path), Some([1, 7, 3]));

    let a = store.read(&path, &SliceSpec::full()).unwrap();
    assert_relative_eq!(a[[0, 1, 0]], synthetic_value(1, 1, 0));
    assert_relative_eq!(a[[0, 2, 0]], synthetic_value(1, 0, 0));
}

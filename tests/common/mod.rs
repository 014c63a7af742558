#![allow(dead_code)]

use std::fmt::Write as _;

use camino::{Utf8Path, Utf8PathBuf};
use tempfile::TempDir;

pub fn fixture(name: &str) -> Utf8PathBuf {
    Utf8Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/data")
        .join(name)
}

/// Value written for `(particle id, configuration, column)` by [`synthetic_dump`].
pub fn synthetic_value(id: u64, configuration: usize, column: usize) -> f64 {
    id as f64 * 1000.0 + configuration as f64 + column as f64 / 10.0
}

/// LAMMPS dump with `species.len()` particles (ids `1..=n`, species `species[id - 1]`) and
/// columns `id element x y z vx vy vz`. Rows are written in reverse id order when
/// `shuffled` is set.
pub fn synthetic_dump(species: &[&str], n_configurations: usize, shuffled: bool) -> String {
    let mut out = String::new();
    for c in 0..n_configurations {
        let _ = write!(
            out,
            "ITEM: TIMESTEP\n{}\nITEM: NUMBER OF ATOMS\n{}\nITEM: BOX BOUNDS pp pp pp\n\
             0 8\n0 8\n0 8\nITEM: ATOMS id element x y z vx vy vz\n",
            c * 50,
            species.len()
        );
        let mut ids: Vec<u64> = (1..=species.len() as u64).collect();
        if shuffled {
            ids.reverse();
        }
        for id in ids {
            let _ = write!(out, "{id} {}", species[id as usize - 1]);
            for column in 0..6 {
                let _ = write!(out, " {}", synthetic_value(id, c, column));
            }
            out.push('\n');
        }
    }
    out
}

/// Write `content` to `<tmp>/<name>` and return both the guard and the path.
pub fn write_temp(name: &str, content: &str) -> (TempDir, Utf8PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = Utf8PathBuf::from_path_buf(dir.path().join(name)).unwrap();
    std::fs::write(&path, content).unwrap();
    (dir, path)
}

//! # Chunked filesystem store
//!
//! Every array lives in its own directory `<root>/<species>/<property>/`:
//!
//! ```text
//! <root>/Na/Positions/manifest.json   {"shape":[2,130,3],"chunk_configurations":64}
//! <root>/Na/Positions/chunk_0.bin     configurations   0..64
//! <root>/Na/Positions/chunk_1.bin     configurations  64..128
//! <root>/Na/Positions/chunk_2.bin     configurations 128..192 (130.. are zeros)
//! ```
//!
//! A chunk file always holds `n_particles * chunk_configurations * n_dims` little-endian `f64`,
//! row-major over `(particle, configuration, dim)`. A chunk that was never written does not
//! exist on disk and reads as zeros, so extending an array only rewrites its manifest.
//!
//! Manifests and chunks are written to a temporary sibling and renamed into place.
//!
//! ## Concurrency
//! -----------------
//! Each array has its own `RwLock` guarding its manifest and chunk files. The path map is
//! locked only while an entry is looked up or inserted.
use std::{
    fs,
    sync::{Arc, RwLock},
};

use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexMap;
use itertools::Itertools;
use log::{debug, info, warn};
use ndarray::{s, Array3, ArrayView3};
use nom::{multi::count, number::complete::le_f64, IResult, Parser};
use serde::{Deserialize, Serialize};

use crate::{
    constants::{ArrayShape, DEFAULT_CHUNK_CONFIGURATIONS},
    database::{check_write, plan_allocation, Allocation, ArrayStore, SliceSpec, StorePath},
    trajstore_errors::TrajStoreError,
};

const MANIFEST_FILE: &str = "manifest.json";

/// On-disk description of one stored array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub shape: ArrayShape,
    pub chunk_configurations: usize,
}

impl Manifest {
    /// Number of chunks needed to cover the allocated configurations.
    pub fn n_chunks(&self) -> usize {
        self.shape[1].div_ceil(self.chunk_configurations)
    }

    fn chunk_dim(&self) -> (usize, usize, usize) {
        (self.shape[0], self.chunk_configurations, self.shape[2])
    }

    fn chunk_len(&self) -> usize {
        self.shape[0] * self.chunk_configurations * self.shape[2]
    }
}

type SharedManifest = Arc<RwLock<Manifest>>;

/// Chunks overlapped by `range`, with the part of `range` each one covers.
fn chunk_spans(
    range: std::ops::Range<usize>,
    chunk_configurations: usize,
) -> impl Iterator<Item = (usize, std::ops::Range<usize>)> {
    let first = range.start / chunk_configurations;
    let last = if range.is_empty() {
        first
    } else {
        range.end.div_ceil(chunk_configurations)
    };
    (first..last).map(move |k| {
        let chunk_start = k * chunk_configurations;
        let lo = range.start.max(chunk_start);
        let hi = range.end.min(chunk_start + chunk_configurations);
        (k, lo..hi)
    })
}

/// [`ArrayStore`] persisting arrays as fixed-size chunk files under a root directory.
#[derive(Debug)]
pub struct ChunkedStore {
    root: Utf8PathBuf,
    chunk_configurations: usize,
    arrays: RwLock<IndexMap<StorePath, SharedManifest, ahash::RandomState>>,
}

impl ChunkedStore {
    /// Open or create a store rooted at `root`.
    ///
    /// Arrays already present under `root` are rediscovered from their manifests and keep
    /// their own chunk length; `chunk_configurations` applies to arrays created from now on.
    ///
    /// Arguments
    /// -----------------
    /// * `root` – Store directory, created if missing.
    /// * `chunk_configurations` – Configurations per chunk file for new arrays (> 0).
    ///
    /// Return
    /// ----------
    /// * The store, or [`TrajStoreError::InvalidParameter`] for a zero chunk length,
    ///   [`TrajStoreError::SerdeError`] for an unreadable manifest.
    pub fn create(root: &Utf8Path, chunk_configurations: usize) -> Result<Self, TrajStoreError> {
        if chunk_configurations == 0 {
            return Err(TrajStoreError::InvalidParameter(
                "chunk_configurations must be > 0".into(),
            ));
        }
        fs::create_dir_all(root)?;

        let arrays = discover_arrays(root)?;
        if !arrays.is_empty() {
            info!(
                "Opened store {} with {} arrays: {}",
                root,
                arrays.len(),
                arrays.keys().join(", ")
            );
        }

        Ok(Self {
            root: root.to_path_buf(),
            chunk_configurations,
            arrays: RwLock::new(arrays),
        })
    }

    /// Open or create a store with the default chunk length.
    pub fn open(root: &Utf8Path) -> Result<Self, TrajStoreError> {
        Self::create(root, DEFAULT_CHUNK_CONFIGURATIONS)
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    pub fn chunk_configurations(&self) -> usize {
        self.chunk_configurations
    }

    /// Manifest of the array at `path`.
    pub fn manifest(&self, path: &StorePath) -> Option<Manifest> {
        let entry = self.entry(path).ok()??;
        let manifest = entry.read().ok()?;
        Some(*manifest)
    }

    fn array_dir(&self, path: &StorePath) -> Utf8PathBuf {
        self.root.join(&path.species).join(&path.property)
    }

    fn chunk_file(&self, path: &StorePath, k: usize) -> Utf8PathBuf {
        self.array_dir(path).join(format!("chunk_{k}.bin"))
    }

    fn entry(&self, path: &StorePath) -> Result<Option<SharedManifest>, TrajStoreError> {
        let arrays = self
            .arrays
            .read()
            .map_err(|_| TrajStoreError::PoisonedLock(path.to_string()))?;
        Ok(arrays.get(path).cloned())
    }

    /// Entry at `path`, created with `shape` if missing, and whether it was created.
    ///
    /// The new entry is inserted and locked under the map lock; its directory and manifest are
    /// then written under the entry lock alone, so other paths stay available meanwhile.
    fn entry_or_create(
        &self,
        path: &StorePath,
        shape: ArrayShape,
    ) -> Result<(SharedManifest, bool), TrajStoreError> {
        path.validate()?;
        let mut arrays = self
            .arrays
            .write()
            .map_err(|_| TrajStoreError::PoisonedLock(path.to_string()))?;
        if let Some(entry) = arrays.get(path) {
            return Ok((Arc::clone(entry), false));
        }
        plan_allocation(path, None, shape)?;

        let entry = Arc::new(RwLock::new(Manifest {
            shape,
            chunk_configurations: self.chunk_configurations,
        }));
        let manifest = entry
            .write()
            .map_err(|_| TrajStoreError::PoisonedLock(path.to_string()))?;
        arrays.insert(path.clone(), Arc::clone(&entry));
        drop(arrays);

        let persisted = fs::create_dir_all(self.array_dir(path))
            .map_err(TrajStoreError::from)
            .and_then(|()| self.save_manifest(path, &manifest));
        if let Err(e) = persisted {
            if let Ok(mut arrays) = self.arrays.write() {
                arrays.shift_remove(path);
            }
            return Err(e);
        }
        debug!("Allocated {path} with shape {shape:?}");
        drop(manifest);
        Ok((entry, true))
    }

    fn save_manifest(&self, path: &StorePath, manifest: &Manifest) -> Result<(), TrajStoreError> {
        let payload = serde_json::to_vec_pretty(manifest)?;
        write_atomic(&self.array_dir(path).join(MANIFEST_FILE), &payload)
    }

    /// Load chunk `k`, or `None` if it was never written.
    fn load_chunk(
        &self,
        path: &StorePath,
        manifest: &Manifest,
        k: usize,
    ) -> Result<Option<Array3<f64>>, TrajStoreError> {
        let file = self.chunk_file(path, k);
        let bytes = match fs::read(&file) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        decode_chunk(&bytes, manifest)
            .map(Some)
            .map_err(|reason| TrajStoreError::CorruptChunk {
                path: file.to_string(),
                reason,
            })
    }

    fn save_chunk(
        &self,
        path: &StorePath,
        k: usize,
        chunk: &Array3<f64>,
    ) -> Result<(), TrajStoreError> {
        write_atomic(&self.chunk_file(path, k), &encode_chunk(chunk))
    }
}

/// Little-endian bytes of `chunk` in logical (row-major) order.
fn encode_chunk(chunk: &Array3<f64>) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(chunk.len() * 8);
    for v in chunk.iter() {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    bytes
}

fn decode_chunk(bytes: &[u8], manifest: &Manifest) -> Result<Array3<f64>, String> {
    let n = manifest.chunk_len();
    if bytes.len() != n * 8 {
        return Err(format!("expected {} bytes, found {}", n * 8, bytes.len()));
    }
    let parsed: IResult<&[u8], Vec<f64>> = count(le_f64, n).parse(bytes);
    let (_, values) = parsed.map_err(|e| e.to_string())?;
    Array3::from_shape_vec(manifest.chunk_dim(), values).map_err(|e| e.to_string())
}

/// Write `bytes` to a temporary sibling of `target`, then rename it over `target`.
fn write_atomic(target: &Utf8Path, bytes: &[u8]) -> Result<(), TrajStoreError> {
    let tmp = target.with_extension(match target.extension() {
        Some(ext) => format!("{ext}.tmp"),
        None => "tmp".into(),
    });
    fs::write(&tmp, bytes)?;
    if let Err(e) = fs::rename(&tmp, target) {
        let _ = fs::remove_file(&tmp);
        return Err(e.into());
    }
    Ok(())
}

/// Find every `<root>/<species>/<property>/manifest.json`.
fn discover_arrays(
    root: &Utf8Path,
) -> Result<IndexMap<StorePath, SharedManifest, ahash::RandomState>, TrajStoreError> {
    let mut found = Vec::new();
    for species in root.read_dir_utf8()? {
        let species = species?;
        if !species.file_type()?.is_dir() {
            continue;
        }
        for property in species.path().read_dir_utf8()? {
            let property = property?;
            let manifest_file = property.path().join(MANIFEST_FILE);
            if !manifest_file.is_file() {
                continue;
            }
            let path = match StorePath::new(species.file_name(), property.file_name()) {
                Ok(path) => path,
                Err(_) => {
                    warn!("Ignoring array directory {}", property.path());
                    continue;
                }
            };
            let manifest: Manifest = serde_json::from_slice(&fs::read(&manifest_file)?)?;
            if manifest.chunk_configurations == 0 {
                return Err(TrajStoreError::CorruptChunk {
                    path: manifest_file.to_string(),
                    reason: "chunk_configurations is 0".into(),
                });
            }
            found.push((path, manifest));
        }
    }

    Ok(found
        .into_iter()
        .sorted_by(|a, b| a.0.cmp(&b.0))
        .map(|(path, manifest)| (path, Arc::new(RwLock::new(manifest))))
        .collect())
}

impl ArrayStore for ChunkedStore {
    fn exists(&self, path: &StorePath) -> bool {
        matches!(self.entry(path), Ok(Some(_)))
    }

    fn allocate(&self, path: &StorePath, shape: ArrayShape) -> Result<(), TrajStoreError> {
        let (entry, created) = self.entry_or_create(path, shape)?;
        if created {
            return Ok(());
        }

        let mut manifest = entry
            .write()
            .map_err(|_| TrajStoreError::PoisonedLock(path.to_string()))?;
        if plan_allocation(path, Some(manifest.shape), shape)? == Allocation::Extend {
            let grown = Manifest {
                shape,
                ..*manifest
            };
            self.save_manifest(path, &grown)?;
            debug!(
                "Extended {path} from {} to {} configurations ({} chunks)",
                manifest.shape[1],
                shape[1],
                grown.n_chunks()
            );
            *manifest = grown;
        }
        Ok(())
    }

    fn write(
        &self,
        path: &StorePath,
        data: ArrayView3<'_, f64>,
        configuration_offset: usize,
    ) -> Result<(), TrajStoreError> {
        let (p, n, d) = data.dim();
        if n == 0 {
            if !self.exists(path) {
                warn!("Skipping empty write to unallocated {path}");
            }
            return Ok(());
        }

        let entry = match self.entry(path)? {
            Some(entry) => entry,
            None => self.entry_or_create(path, [p, configuration_offset + n, d])?.0,
        };
        let manifest = entry
            .write()
            .map_err(|_| TrajStoreError::PoisonedLock(path.to_string()))?;
        check_write(path, manifest.shape, (p, n, d), configuration_offset)?;

        let end = configuration_offset + n;
        for (k, span) in chunk_spans(configuration_offset..end, manifest.chunk_configurations) {
            let chunk_start = k * manifest.chunk_configurations;
            let mut chunk = self
                .load_chunk(path, &manifest, k)?
                .unwrap_or_else(|| Array3::zeros(manifest.chunk_dim()));
            chunk
                .slice_mut(s![.., span.start - chunk_start..span.end - chunk_start, ..])
                .assign(&data.slice(s![
                    ..,
                    span.start - configuration_offset..span.end - configuration_offset,
                    ..
                ]));
            self.save_chunk(path, k, &chunk)?;
        }
        Ok(())
    }

    fn read(&self, path: &StorePath, slice: &SliceSpec) -> Result<Array3<f64>, TrajStoreError> {
        let entry = self
            .entry(path)?
            .ok_or_else(|| TrajStoreError::ArrayNotFound(path.to_string()))?;
        let manifest = entry
            .read()
            .map_err(|_| TrajStoreError::PoisonedLock(path.to_string()))?;
        let [rp, rc, rd] = slice.resolve(path, manifest.shape)?;

        let mut out = Array3::zeros((rp.len(), rc.len(), rd.len()));
        if out.is_empty() {
            return Ok(out);
        }
        for (k, span) in chunk_spans(rc.clone(), manifest.chunk_configurations) {
            let Some(chunk) = self.load_chunk(path, &manifest, k)? else {
                continue;
            };
            let chunk_start = k * manifest.chunk_configurations;
            out.slice_mut(s![.., span.start - rc.start..span.end - rc.start, ..])
                .assign(&chunk.slice(s![
                    rp.clone(),
                    span.start - chunk_start..span.end - chunk_start,
                    rd.clone()
                ]));
        }
        Ok(out)
    }

    fn shape(&self, path: &StorePath) -> Option<ArrayShape> {
        self.manifest(path).map(|m| m.shape)
    }

    fn paths(&self) -> Vec<StorePath> {
        self.arrays
            .read()
            .map(|arrays| arrays.keys().cloned().collect())
            .unwrap_or_default()
    }
}

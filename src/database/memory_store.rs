//! In-memory [`ArrayStore`].
use std::sync::{Arc, RwLock};

use indexmap::IndexMap;
use log::{debug, warn};
use ndarray::{s, Array3, ArrayView3};

use crate::{
    constants::ArrayShape,
    database::{check_write, plan_allocation, Allocation, ArrayStore, SliceSpec, StorePath},
    trajstore_errors::TrajStoreError,
};

type SharedArray = Arc<RwLock<Array3<f64>>>;

/// Arrays held in process memory.
///
/// The path map is locked only to look up or insert an entry; array content sits behind its
/// own lock, so work on one path never blocks another.
#[derive(Debug, Default)]
pub struct MemoryStore {
    arrays: RwLock<IndexMap<StorePath, SharedArray, ahash::RandomState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&self, path: &StorePath) -> Result<Option<SharedArray>, TrajStoreError> {
        let arrays = self
            .arrays
            .read()
            .map_err(|_| TrajStoreError::PoisonedLock(path.to_string()))?;
        Ok(arrays.get(path).cloned())
    }

    /// Entry at `path`, created zeroed with `shape` if missing, and whether it was created.
    ///
    /// Lookup and insert happen under one map lock, so concurrent creators agree on a single
    /// array.
    fn entry_or_create(
        &self,
        path: &StorePath,
        shape: ArrayShape,
    ) -> Result<(SharedArray, bool), TrajStoreError> {
        path.validate()?;
        let mut arrays = self
            .arrays
            .write()
            .map_err(|_| TrajStoreError::PoisonedLock(path.to_string()))?;
        if let Some(entry) = arrays.get(path) {
            return Ok((Arc::clone(entry), false));
        }
        plan_allocation(path, None, shape)?;
        debug!("Allocating {path} with shape {shape:?}");
        let entry = Arc::new(RwLock::new(Array3::zeros(shape)));
        arrays.insert(path.clone(), Arc::clone(&entry));
        Ok((entry, true))
    }
}

impl ArrayStore for MemoryStore {
    fn exists(&self, path: &StorePath) -> bool {
        matches!(self.entry(path), Ok(Some(_)))
    }

    fn allocate(&self, path: &StorePath, shape: ArrayShape) -> Result<(), TrajStoreError> {
        let (entry, created) = self.entry_or_create(path, shape)?;
        if created {
            return Ok(());
        }

        let mut arr = entry
            .write()
            .map_err(|_| TrajStoreError::PoisonedLock(path.to_string()))?;
        let (p, n, d) = arr.dim();
        if plan_allocation(path, Some([p, n, d]), shape)? == Allocation::Extend {
            debug!("Extending {path} from {n} to {} configurations", shape[1]);
            let mut grown = Array3::zeros(shape);
            grown.slice_mut(s![.., ..n, ..]).assign(&*arr);
            *arr = grown;
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
        let mut arr = entry
            .write()
            .map_err(|_| TrajStoreError::PoisonedLock(path.to_string()))?;
        let (sp, sn, sd) = arr.dim();
        check_write(path, [sp, sn, sd], (p, n, d), configuration_offset)?;

        arr.slice_mut(s![.., configuration_offset..configuration_offset + n, ..])
            .assign(&data);
        Ok(())
    }

    fn read(&self, path: &StorePath, slice: &SliceSpec) -> Result<Array3<f64>, TrajStoreError> {
        let entry = self
            .entry(path)?
            .ok_or_else(|| TrajStoreError::ArrayNotFound(path.to_string()))?;
        let arr = entry
            .read()
            .map_err(|_| TrajStoreError::PoisonedLock(path.to_string()))?;
        let (p, n, d) = arr.dim();
        let [rp, rc, rd] = slice.resolve(path, [p, n, d])?;
        Ok(arr.slice(s![rp, rc, rd]).to_owned())
    }

    fn shape(&self, path: &StorePath) -> Option<ArrayShape> {
        let entry = self.entry(path).ok()??;
        let arr = entry.read().ok()?;
        let (p, n, d) = arr.dim();
        Some([p, n, d])
    }

    fn paths(&self) -> Vec<StorePath> {
        self.arrays
            .read()
            .map(|arrays| arrays.keys().cloned().collect())
            .unwrap_or_default()
    }
}

//! Capability registry
//!
//! Maps model ids to immutable [`RotCaps`] descriptors. Backend families
//! can be registered lazily: a loader attached to a family (model id / 100)
//! runs on the first lookup of a model from that family and is expected to
//! register the family's descriptors.

use std::collections::{HashMap, HashSet};
use std::ops::ControlFlow;
use std::sync::Arc;

use parking_lot::{ReentrantMutex, RwLock};
use rot_core::{RotCaps, RotError, RotModel, RotResult};
use tracing::{debug, info, warn};

/// Registers every descriptor of one backend family
pub type BackendLoader = fn(&CapsRegistry) -> RotResult<()>;

/// Thread-safe store of capability descriptors
#[derive(Default)]
pub struct CapsRegistry {
    caps: RwLock<HashMap<RotModel, Arc<RotCaps>>>,
    loaders: RwLock<HashMap<u32, BackendLoader>>,
    /// Families whose loader already ran (successfully or not)
    loaded: RwLock<HashSet<u32>>,
    /// Held while a loader runs; reentrant so loaders may look up models
    load_lock: ReentrantMutex<()>,
}

impl CapsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a descriptor. Fails if the model id is already taken.
    pub fn register(&self, caps: RotCaps) -> RotResult<()> {
        let model = caps.model;
        let mut map = self.caps.write();
        if map.contains_key(&model) {
            return Err(RotError::InvalidArgument(format!(
                "rotator model {} already registered",
                model
            )));
        }
        debug!(%model, name = %caps.model_name, "Registering rotator caps");
        map.insert(model, Arc::new(caps));
        Ok(())
    }

    /// Remove a descriptor. Handles already created keep their reference.
    pub fn unregister(&self, model: RotModel) -> RotResult<Arc<RotCaps>> {
        self.caps
            .write()
            .remove(&model)
            .ok_or_else(|| RotError::NotFound(format!("rotator model {}", model)))
    }

    /// Attach a loader to a backend family
    pub fn register_loader(&self, backend_num: u32, loader: BackendLoader) {
        self.loaders.write().insert(backend_num, loader);
    }

    /// Make sure the backend family of `model` is loaded.
    ///
    /// Runs the family loader at most once; concurrent callers wait for it
    /// to finish. Returns `NotFound` whenever the model is still unknown
    /// afterwards, and the loader's error on the call that ran a failing
    /// loader.
    pub fn check_backend(&self, model: RotModel) -> RotResult<()> {
        if self.caps.read().contains_key(&model) {
            return Ok(());
        }

        let family = model.backend_num();
        {
            let _guard = self.load_lock.lock();
            if self.loaded.write().insert(family) {
                let loader = self.loaders.read().get(&family).copied();
                if let Some(load) = loader {
                    info!(family, "Loading rotator backend family");
                    load(self).inspect_err(|e| {
                        warn!(family, error = %e, "Rotator backend loader failed");
                    })?;
                }
            }
        }

        if self.caps.read().contains_key(&model) {
            Ok(())
        } else {
            Err(RotError::NotFound(format!(
                "no backend for rotator model {} (family {})",
                model, family
            )))
        }
    }

    /// Look up a descriptor, loading its backend family if needed
    pub fn get(&self, model: RotModel) -> Option<Arc<RotCaps>> {
        if let Err(e) = self.check_backend(model) {
            debug!(%model, error = %e, "Backend check failed");
        }
        self.caps.read().get(&model).cloned()
    }

    pub fn len(&self) -> usize {
        self.caps.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.caps.read().is_empty()
    }

    /// Visit registered descriptors in model order.
    ///
    /// Stops at the first visitor returning `Break`. Returns the number of
    /// descriptors visited.
    pub fn list_foreach<F>(&self, mut visitor: F) -> usize
    where
        F: FnMut(&RotCaps) -> ControlFlow<()>,
    {
        let mut all: Vec<Arc<RotCaps>> = self.caps.read().values().cloned().collect();
        all.sort_by_key(|caps| caps.model);

        let mut visited = 0;
        for caps in &all {
            visited += 1;
            if visitor(caps).is_break() {
                break;
            }
        }
        visited
    }
}

impl std::fmt::Debug for CapsRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapsRegistry")
            .field("models", &self.caps.read().len())
            .field("loaders", &self.loaders.read().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static LOADS: AtomicUsize = AtomicUsize::new(0);

    fn load_family_7(registry: &CapsRegistry) -> RotResult<()> {
        LOADS.fetch_add(1, Ordering::SeqCst);
        registry.register(RotCaps::new(RotModel::make(7, 1), "Lazy One"))?;
        registry.register(RotCaps::new(RotModel::make(7, 2), "Lazy Two"))
    }

    fn load_family_8(registry: &CapsRegistry) -> RotResult<()> {
        registry.register(RotCaps::new(RotModel::make(8, 1), "Only One"))
    }

    fn load_family_9_slowly(registry: &CapsRegistry) -> RotResult<()> {
        std::thread::sleep(std::time::Duration::from_millis(100));
        registry.register(RotCaps::new(RotModel::make(9, 1), "Slow"))
    }

    #[test]
    fn test_register_and_get() {
        let registry = CapsRegistry::new();
        registry
            .register(RotCaps::new(RotModel(1), "Dummy"))
            .unwrap();

        assert_eq!(registry.get(RotModel(1)).unwrap().model_name, "Dummy");
        assert!(registry.get(RotModel(2)).is_none());
        assert!(registry.register(RotCaps::new(RotModel(1), "Again")).is_err());
    }

    #[test]
    fn test_unregister() {
        let registry = CapsRegistry::new();
        registry.register(RotCaps::new(RotModel(5), "Five")).unwrap();

        let caps = registry.unregister(RotModel(5)).unwrap();
        assert_eq!(caps.model, RotModel(5));
        assert!(registry.is_empty());
        assert!(registry.unregister(RotModel(5)).is_err());
    }

    #[test]
    fn test_loader_runs_once() {
        let registry = CapsRegistry::new();
        registry.register_loader(7, load_family_7);

        assert_eq!(registry.get(RotModel(702)).unwrap().model_name, "Lazy Two");
        assert_eq!(registry.get(RotModel(701)).unwrap().model_name, "Lazy One");
        assert!(registry.get(RotModel(799)).is_none());
        assert_eq!(LOADS.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_check_backend_unknown_family() {
        let registry = CapsRegistry::new();
        for _ in 0..2 {
            let err = registry.check_backend(RotModel(4242)).unwrap_err();
            assert_eq!(err.kind(), rot_core::ErrorKind::NotFound);
        }
    }

    #[test]
    fn test_check_backend_model_missing_from_loaded_family() {
        let registry = CapsRegistry::new();
        registry.register_loader(8, load_family_8);

        registry.check_backend(RotModel(801)).unwrap();
        for _ in 0..2 {
            let err = registry.check_backend(RotModel(899)).unwrap_err();
            assert_eq!(err.kind(), rot_core::ErrorKind::NotFound);
        }
    }

    #[test]
    fn test_concurrent_lookup_waits_for_loader() {
        let registry = CapsRegistry::new();
        registry.register_loader(9, load_family_9_slowly);

        let registry = &registry;
        let found: Vec<bool> = std::thread::scope(|s| {
            let workers: Vec<_> = (0..2)
                .map(|_| s.spawn(move || registry.get(RotModel(901)).is_some()))
                .collect();
            workers.into_iter().map(|w| w.join().unwrap()).collect()
        });

        assert_eq!(found, vec![true, true]);
    }

    #[test]
    fn test_list_foreach_stops_early() {
        let registry = CapsRegistry::new();
        for n in 1..=3 {
            registry
                .register(RotCaps::new(RotModel(n), format!("Model {}", n)))
                .unwrap();
        }

        let mut seen = Vec::new();
        let visited = registry.list_foreach(|caps| {
            seen.push(caps.model.0);
            if caps.model.0 == 2 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        });

        assert_eq!(seen, vec![1, 2]);
        assert_eq!(visited, 2);
    }
}

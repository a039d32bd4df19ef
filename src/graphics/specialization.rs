//! Specialization cache: one compiled material per fractal kind.
//!
//! Pipelines are created on demand and reused across frames; the cache is
//! keyed by [`FractalKind`] and tied to the base-source generation so a DEC
//! rebuild invalidates every variant at once. The cache is generic over the
//! material type, which keeps the state machine testable without a GPU
//! device — the renderer instantiates it with `SpecializedMaterial`.
//!
//! Disposal relies on Drop: clearing an entry drops its `Arc`, and wgpu
//! resources release when the last reference goes away.

use std::sync::Arc;

use hashbrown::HashMap;

use crate::shader_gen::FractalKind;

struct Entry<M> {
    material: Arc<M>,
}

pub struct SpecializationCache<M> {
    entries: HashMap<FractalKind, Entry<M>>,
    /// Base-source generation the current entries were compiled against.
    generation: u64,
}

impl<M> SpecializationCache<M> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            generation: 0,
        }
    }

    /// Get the material for `kind`, compiling it if missing.
    ///
    /// Idempotent for an unchanged base source: two consecutive calls with
    /// the same kind and generation return the same instance. A generation
    /// change empties the cache first, so stale variants can never be
    /// served.
    pub fn get_or_compile(
        &mut self,
        kind: FractalKind,
        generation: u64,
        compile: impl FnOnce() -> M,
    ) -> Arc<M> {
        self.sync_generation(generation);
        if let Some(entry) = self.entries.get(&kind) {
            return Arc::clone(&entry.material);
        }
        tracing::debug!(
            "compiling specialization for {} (generation {})",
            kind.name(),
            generation
        );
        let material = Arc::new(compile());
        self.entries.insert(
            kind,
            Entry {
                material: Arc::clone(&material),
            },
        );
        material
    }

    /// Dispose every cached material and empty the cache. Subsequent gets
    /// recompile against the current base source.
    pub fn invalidate_all(&mut self) {
        let count = self.entries.len();
        self.entries.clear();
        if count > 0 {
            tracing::debug!("invalidated {} cached specializations", count);
        }
    }

    /// Proactively compile entries for `kinds` so the first switch to a
    /// rarely used variant does not stutter. Existing entries are kept;
    /// whatever material the caller currently has bound is untouched.
    pub fn prewarm(
        &mut self,
        kinds: &[FractalKind],
        generation: u64,
        mut compile: impl FnMut(FractalKind) -> M,
    ) {
        for &kind in kinds {
            self.get_or_compile(kind, generation, || compile(kind));
        }
        tracing::info!("prewarmed {} specializations", kinds.len());
    }

    pub fn contains(&self, kind: FractalKind) -> bool {
        self.entries.contains_key(&kind)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn sync_generation(&mut self, generation: u64) {
        if generation != self.generation {
            self.invalidate_all();
            self.generation = generation;
        }
    }
}

impl<M> Default for SpecializationCache<M> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct MockMaterial {
        kind: FractalKind,
    }

    #[test]
    fn test_get_is_idempotent() {
        let mut cache = SpecializationCache::new();
        let a = cache.get_or_compile(FractalKind::Menger, 0, || MockMaterial {
            kind: FractalKind::Menger,
        });
        let b = cache.get_or_compile(FractalKind::Menger, 0, || MockMaterial {
            kind: FractalKind::Menger,
        });
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.kind, FractalKind::Menger);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_one_entry_per_kind() {
        let mut cache = SpecializationCache::new();
        for kind in FractalKind::ALL {
            cache.get_or_compile(kind, 0, || MockMaterial { kind });
            cache.get_or_compile(kind, 0, || MockMaterial { kind });
        }
        assert_eq!(cache.len(), FractalKind::ALL.len());
    }

    #[test]
    fn test_invalidate_all_disposes_everything() {
        let mut cache = SpecializationCache::new();
        let old = cache.get_or_compile(FractalKind::Truchet, 0, || MockMaterial {
            kind: FractalKind::Truchet,
        });
        cache.invalidate_all();
        assert!(cache.is_empty());
        let fresh = cache.get_or_compile(FractalKind::Truchet, 0, || MockMaterial {
            kind: FractalKind::Truchet,
        });
        assert!(!Arc::ptr_eq(&old, &fresh));
    }

    #[test]
    fn test_generation_change_invalidates() {
        let mut cache = SpecializationCache::new();
        let old = cache.get_or_compile(FractalKind::World, 0, || MockMaterial {
            kind: FractalKind::World,
        });
        let fresh = cache.get_or_compile(FractalKind::World, 1, || MockMaterial {
            kind: FractalKind::World,
        });
        assert!(!Arc::ptr_eq(&old, &fresh));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_prewarm_populates_all_kinds() {
        let mut cache = SpecializationCache::new();
        cache.prewarm(&FractalKind::ALL, 0, |kind| MockMaterial { kind });
        for kind in FractalKind::ALL {
            assert!(cache.contains(kind));
        }
    }

    #[test]
    fn test_prewarm_keeps_existing_instances() {
        let mut cache = SpecializationCache::new();
        let before = cache.get_or_compile(FractalKind::Menger, 0, || MockMaterial {
            kind: FractalKind::Menger,
        });
        cache.prewarm(&FractalKind::ALL, 0, |kind| MockMaterial { kind });
        let after = cache.get_or_compile(FractalKind::Menger, 0, || MockMaterial {
            kind: FractalKind::Menger,
        });
        assert!(Arc::ptr_eq(&before, &after));
    }
}

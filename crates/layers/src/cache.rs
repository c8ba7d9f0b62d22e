use std::collections::BTreeSet;
use std::sync::Arc;

use formats::geometry::{FeatureCollection, Geometry};
use formats::topology::Topology;
use foundation::bounds::Aabb2;
use tracing::debug;

use crate::extract::{ExtractedLayers, combined_bounds, extract};
use crate::layer::{LayerKey, LayerKind, LayerSpec};
use crate::predicates::PredicateEngine;

/// What an update did to the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheUpdate {
    /// Every requested layer was already cached (or known to be missing).
    Unchanged,
    /// The topology changed: the cache was cleared and rebuilt.
    Rebuilt { bounds_changed: bool },
    /// Only the listed layers were extracted and merged in.
    Extended {
        extracted: Vec<LayerKey>,
        bounds_changed: bool,
    },
}

impl CacheUpdate {
    pub fn bounds_changed(&self) -> bool {
        match self {
            CacheUpdate::Unchanged => false,
            CacheUpdate::Rebuilt { bounds_changed }
            | CacheUpdate::Extended { bounds_changed, .. } => *bounds_changed,
        }
    }
}

/// Incremental per-layer geometry cache bound to one topology.
///
/// Invalidation rule: the cache is valid for exactly one topology *instance*. A new
/// `Arc<Topology>` (even a structurally equal one) clears everything. Within a
/// topology's lifetime entries are not evicted, only layers not yet cached are
/// extracted, and `bounds` is recomputed over the whole merged set.
///
/// Entries are keyed by `(kind, name)` alone. A layer that keeps its name but points
/// at another object or mesh filter keeps its cached geometry until the topology
/// changes; give it a new name to force extraction.
///
/// Selection-dependent meshes are the one exception: a selection
/// change re-extracts the listed ones and drops the unlisted ones, so a layer
/// re-added later is extracted against the selection current at that time.
///
/// `bounds_revision` only advances when the bounds value changes, so callers can
/// memoize anything derived from it.
#[derive(Debug, Default)]
pub struct LayerCache {
    topology: Option<Arc<Topology>>,
    layers: ExtractedLayers,
    /// Layers whose object the current topology lacks; not retried until it changes.
    missing: BTreeSet<LayerKey>,
    /// Cached meshes that were extracted against a selection.
    selection_meshes: BTreeSet<String>,
    bounds: Option<Aabb2>,
    bounds_revision: u64,
}

impl LayerCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn topology(&self) -> Option<&Arc<Topology>> {
        self.topology.as_ref()
    }

    pub fn layers(&self) -> &ExtractedLayers {
        &self.layers
    }

    pub fn feature(&self, name: &str) -> Option<&Arc<FeatureCollection>> {
        self.layers.feature.get(name)
    }

    pub fn mesh(&self, name: &str) -> Option<&Arc<Geometry>> {
        self.layers.mesh.get(name)
    }

    pub fn bounds(&self) -> Option<&Aabb2> {
        self.bounds.as_ref()
    }

    pub fn bounds_revision(&self) -> u64 {
        self.bounds_revision
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    fn is_cached(&self, key: &LayerKey) -> bool {
        self.layers.contains(key.kind, &key.name) || self.missing.contains(key)
    }

    /// Brings the cache in line with `topology` and `layers`.
    pub fn update(
        &mut self,
        topology: &Arc<Topology>,
        layers: &[LayerSpec],
        predicates: &PredicateEngine,
    ) -> CacheUpdate {
        let same_topology = self
            .topology
            .as_ref()
            .is_some_and(|t| Arc::ptr_eq(t, topology));

        if !same_topology {
            debug!(layers = layers.len(), "topology changed; rebuilding layer cache");
            self.topology = Some(topology.clone());
            self.layers = ExtractedLayers::default();
            self.missing.clear();
            self.selection_meshes.clear();
            self.absorb(topology, layers, predicates);
            let bounds_changed = self.recompute_bounds();
            return CacheUpdate::Rebuilt { bounds_changed };
        }

        let uncached: Vec<LayerSpec> = layers
            .iter()
            .filter(|l| !self.is_cached(&l.key()))
            .cloned()
            .collect();
        if uncached.is_empty() {
            return CacheUpdate::Unchanged;
        }

        let extracted = self.absorb(topology, &uncached, predicates);
        let bounds_changed = self.recompute_bounds();
        debug!(
            extracted = extracted.len(),
            bounds_changed, "extended layer cache"
        );
        CacheUpdate::Extended {
            extracted,
            bounds_changed,
        }
    }

    /// Re-extracts the selection-dependent meshes among `layers` against the engine's
    /// current selection and drops selection meshes `layers` no longer lists. Bounds
    /// are recomputed over the result.
    pub fn refresh_selection_layers(
        &mut self,
        layers: &[LayerSpec],
        predicates: &PredicateEngine,
    ) -> CacheUpdate {
        let Some(topology) = self.topology.clone() else {
            return CacheUpdate::Unchanged;
        };
        let listed: BTreeSet<&str> = layers
            .iter()
            .filter(|l| l.kind == LayerKind::Mesh && l.mesh_filter().depends_on_selection())
            .map(|l| l.name.as_str())
            .collect();
        let evicted: Vec<String> = self
            .selection_meshes
            .iter()
            .filter(|name| !listed.contains(name.as_str()))
            .cloned()
            .collect();
        for name in &evicted {
            self.layers.mesh.remove(name);
            self.selection_meshes.remove(name);
        }

        // A mesh evicted above may still be listed under the same name with a
        // selection-free filter; extract it again so it stays cached.
        let stale: Vec<LayerSpec> = layers
            .iter()
            .filter(|l| l.kind == LayerKind::Mesh)
            .filter(|l| l.mesh_filter().depends_on_selection() || evicted.contains(&l.name))
            .filter(|l| !self.missing.contains(&l.key()))
            .cloned()
            .collect();
        if stale.is_empty() && evicted.is_empty() {
            return CacheUpdate::Unchanged;
        }
        let extracted = self.absorb(&topology, &stale, predicates);
        let bounds_changed = self.recompute_bounds();
        debug!(
            extracted = extracted.len(),
            evicted = evicted.len(),
            bounds_changed,
            "refreshed selection meshes"
        );
        CacheUpdate::Extended {
            extracted,
            bounds_changed,
        }
    }

    fn absorb(
        &mut self,
        topology: &Topology,
        layers: &[LayerSpec],
        predicates: &PredicateEngine,
    ) -> Vec<LayerKey> {
        let fresh = extract(topology, layers, predicates);
        let mut extracted = Vec::new();
        for l in layers {
            let key = l.key();
            if fresh.contains(key.kind, &key.name) {
                if key.kind == LayerKind::Mesh {
                    if l.mesh_filter().depends_on_selection() {
                        self.selection_meshes.insert(key.name.clone());
                    } else {
                        self.selection_meshes.remove(&key.name);
                    }
                }
                extracted.push(key);
            } else {
                self.missing.insert(key);
            }
        }
        self.layers.merge(fresh);
        extracted
    }

    fn recompute_bounds(&mut self) -> bool {
        let next = combined_bounds(&self.layers);
        if next == self.bounds {
            return false;
        }
        self.bounds = next;
        self.bounds_revision += 1;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::{CacheUpdate, LayerCache};
    use crate::layer::{LayerKey, LayerKind, LayerSpec, MeshFilter};
    use crate::predicates::PredicateEngine;
    use crate::test_support::three_squares;
    use foundation::bounds::Aabb2;
    use pretty_assertions::assert_eq;
    use scene::selection::SelectionSet;
    use std::sync::Arc;

    #[test]
    fn unchanged_inputs_keep_bounds_identity() {
        let topo = Arc::new(three_squares(&[]));
        let layers = vec![LayerSpec::feature("land", "regions")];
        let predicates = PredicateEngine::default();
        let mut cache = LayerCache::new();

        assert_eq!(
            cache.update(&topo, &layers, &predicates),
            CacheUpdate::Rebuilt {
                bounds_changed: true
            }
        );
        let revision = cache.bounds_revision();
        assert_eq!(cache.bounds(), Some(&Aabb2::new([0.0, 0.0], [3.0, 1.0])));

        assert_eq!(
            cache.update(&topo, &layers, &predicates),
            CacheUpdate::Unchanged
        );
        assert_eq!(cache.bounds_revision(), revision);
    }

    #[test]
    fn adding_layers_extracts_only_the_new_ones() {
        let topo = Arc::new(three_squares(&[]));
        let predicates = PredicateEngine::default();
        let mut cache = LayerCache::new();
        let l1 = vec![LayerSpec::feature("land", "regions")];
        cache.update(&topo, &l1, &predicates);
        let land = cache.feature("land").unwrap().clone();

        let mut l2 = l1.clone();
        l2.push(LayerSpec::mesh("borders", "regions"));
        let update = cache.update(&topo, &l2, &predicates);
        assert_eq!(
            update,
            CacheUpdate::Extended {
                extracted: vec![LayerKey::new(LayerKind::Mesh, "borders")],
                bounds_changed: false,
            }
        );
        assert_eq!(cache.len(), 2);
        assert!(Arc::ptr_eq(&land, cache.feature("land").unwrap()));
    }

    #[test]
    fn equal_but_distinct_topology_invalidates() {
        let predicates = PredicateEngine::default();
        let layers = vec![LayerSpec::feature("land", "regions")];
        let mut cache = LayerCache::new();

        let first = Arc::new(three_squares(&[]));
        cache.update(&first, &layers, &predicates);
        let land = cache.feature("land").unwrap().clone();

        let second = Arc::new(three_squares(&[]));
        assert_eq!(
            cache.update(&second, &layers, &predicates),
            CacheUpdate::Rebuilt {
                bounds_changed: false
            }
        );
        assert!(!Arc::ptr_eq(&land, cache.feature("land").unwrap()));
        assert_eq!(land.as_ref(), cache.feature("land").unwrap().as_ref());
    }

    #[test]
    fn missing_layers_do_not_churn() {
        let topo = Arc::new(three_squares(&[]));
        let predicates = PredicateEngine::default();
        let layers = vec![
            LayerSpec::feature("land", "regions"),
            LayerSpec::feature("lakes", "water"),
        ];
        let mut cache = LayerCache::new();
        cache.update(&topo, &layers, &predicates);
        assert_eq!(cache.len(), 1);
        assert_eq!(
            cache.update(&topo, &layers, &predicates),
            CacheUpdate::Unchanged
        );
    }

    #[test]
    fn selection_refresh_rebuilds_only_selection_meshes() {
        let topo = Arc::new(three_squares(&[]));
        let mut predicates = PredicateEngine::default();
        let layers = vec![
            LayerSpec::feature("land", "regions"),
            LayerSpec::mesh("borders", "regions"),
            LayerSpec::mesh("outline", "regions").with_filter(MeshFilter::SelectedBorders),
        ];
        let mut cache = LayerCache::new();
        cache.update(&topo, &layers, &predicates);
        let borders = cache.mesh("borders").unwrap().clone();
        let revision = cache.bounds_revision();
        assert_eq!(line_count(&cache, "outline"), 0);

        predicates.set_selection(["1"].into_iter().collect::<SelectionSet>());
        let refreshed = cache.refresh_selection_layers(&layers, &predicates);
        assert_eq!(
            refreshed,
            CacheUpdate::Extended {
                extracted: vec![LayerKey::new(LayerKind::Mesh, "outline")],
                bounds_changed: false,
            }
        );
        // Region 1 owns its outer arc and the arc shared with region 2.
        assert_eq!(line_count(&cache, "outline"), 2);
        assert!(Arc::ptr_eq(&borders, cache.mesh("borders").unwrap()));
        assert_eq!(cache.bounds_revision(), revision);
    }

    #[test]
    fn unlisted_selection_meshes_are_dropped_on_selection_change() {
        let topo = Arc::new(three_squares(&[]));
        let mut predicates = PredicateEngine::default();
        let land = LayerSpec::feature("land", "regions");
        let outline =
            LayerSpec::mesh("outline", "regions").with_filter(MeshFilter::SelectedBorders);
        let with_outline = vec![land.clone(), outline];
        let mut cache = LayerCache::new();
        cache.update(&topo, &with_outline, &predicates);

        let without_outline = vec![land];
        cache.update(&topo, &without_outline, &predicates);
        predicates.set_selection(["1"].into_iter().collect::<SelectionSet>());
        assert_eq!(
            cache.refresh_selection_layers(&without_outline, &predicates),
            CacheUpdate::Extended {
                extracted: vec![],
                bounds_changed: false,
            }
        );
        assert!(cache.mesh("outline").is_none());

        assert_eq!(
            cache.update(&topo, &with_outline, &predicates),
            CacheUpdate::Extended {
                extracted: vec![LayerKey::new(LayerKind::Mesh, "outline")],
                bounds_changed: false,
            }
        );
        assert_eq!(line_count(&cache, "outline"), 2);
    }

    #[test]
    fn selection_refresh_recomputes_bounds() {
        let topo = Arc::new(three_squares(&[]));
        let mut predicates = PredicateEngine::default();
        let layers =
            vec![LayerSpec::mesh("outline", "regions").with_filter(MeshFilter::SelectedBorders)];
        let mut cache = LayerCache::new();
        cache.update(&topo, &layers, &predicates);
        assert_eq!(cache.bounds(), None);
        let revision = cache.bounds_revision();

        predicates.set_selection(["1"].into_iter().collect::<SelectionSet>());
        let update = cache.refresh_selection_layers(&layers, &predicates);
        assert!(update.bounds_changed());
        assert_eq!(cache.bounds(), Some(&Aabb2::new([0.0, 0.0], [1.0, 1.0])));
        assert_eq!(cache.bounds_revision(), revision + 1);
    }

    fn line_count(cache: &LayerCache, name: &str) -> usize {
        match cache.mesh(name).map(|m| m.as_ref()) {
            Some(formats::geometry::Geometry::MultiLineString(lines)) => lines.len(),
            _ => 0,
        }
    }
}

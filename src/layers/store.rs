//! Resolution of data groups into layer descriptors.
//!
//! The store sits between the maps and the [`DataLoader`]. Resolved groups are
//! kept in an LRU cache shared by every map on the page, so a full-screen
//! child or a second map showing the same group never refetches it.

use crate::core::map::MapInstance;
use crate::data::geojson::GeoJson;
use crate::layers::descriptor::{LayerDescriptor, LayerOptions};
use crate::layers::loader::{DataLoader, GroupData};
use crate::prelude::HashSet;
use futures::future::join_all;
use lru::LruCache;
use std::cell::{Cell, RefCell};
use std::num::NonZeroUsize;
use std::rc::Rc;
use std::sync::Arc;

pub struct DataLayerStore {
    loader: Rc<dyn DataLoader>,
    cache: RefCell<LruCache<String, Arc<LayerDescriptor>>>,
    inline_counter: Cell<u64>,
}

impl DataLayerStore {
    pub fn new(loader: Rc<dyn DataLoader>, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            loader,
            cache: RefCell::new(LruCache::new(capacity)),
            inline_counter: Cell::new(0),
        }
    }

    /// Cached descriptor for a group, without touching recency
    pub fn cached(&self, group_id: &str) -> Option<Arc<LayerDescriptor>> {
        self.cache.borrow().peek(group_id).cloned()
    }

    pub fn cache_len(&self) -> usize {
        self.cache.borrow().len()
    }

    pub fn clear_cache(&self) {
        self.cache.borrow_mut().clear();
    }

    /// Resolves the named groups, in request order.
    ///
    /// Duplicate ids are resolved once. Each uncached id is requested on its
    /// own and all requests are awaited together, so one failing group never
    /// takes the others down. Failed, missing and empty groups are logged and
    /// left out.
    pub async fn load_groups(&self, group_ids: &[String]) -> Vec<Arc<LayerDescriptor>> {
        let mut seen: HashSet<String> = HashSet::default();
        let unique: Vec<&String> = group_ids
            .iter()
            .filter(|id| seen.insert(id.to_string()))
            .collect();

        let mut slots: Vec<Option<Arc<LayerDescriptor>>> = {
            let mut cache = self.cache.borrow_mut();
            unique.iter().map(|id| cache.get(id.as_str()).cloned()).collect()
        };

        let pending: Vec<(usize, &String)> = unique
            .iter()
            .enumerate()
            .filter(|(index, _)| slots[*index].is_none())
            .map(|(index, id)| (index, *id))
            .collect();

        if !pending.is_empty() {
            log::debug!("fetching {} data group(s)", pending.len());
        }

        let fetched = join_all(pending.iter().map(|(_, id)| self.fetch_group(id))).await;

        for ((index, _), descriptor) in pending.into_iter().zip(fetched) {
            slots[index] = descriptor;
        }

        slots.into_iter().flatten().collect()
    }

    /// Resolves caller-supplied data. Every resolved entry gets a fresh
    /// `_inline-N` id so repeated inline loads never collide.
    pub async fn load_inline(&self, data: &GeoJson) -> Vec<Arc<LayerDescriptor>> {
        let groups = match self.loader.load_inline(data).await {
            Ok(groups) => groups,
            Err(err) => {
                log::warn!("inline data failed to load: {:#}", err);
                return Vec::new();
            }
        };

        groups
            .into_iter()
            .filter_map(|group| {
                let group_id = self.next_inline_id();
                self.resolve(&group_id, group)
            })
            .collect()
    }

    /// Converts GeoJSON and registers the result with `instance`.
    ///
    /// Returns `None`, after logging, when the geometry cannot be rendered.
    pub fn add_layer(
        &self,
        instance: &mut MapInstance,
        group_id: &str,
        geometry: &GeoJson,
        options: LayerOptions,
    ) -> Option<Arc<LayerDescriptor>> {
        let descriptor = Arc::new(build_descriptor(group_id, geometry, options)?);
        if instance.insert_layer(descriptor.clone()) {
            Some(descriptor)
        } else {
            None
        }
    }

    async fn fetch_group(&self, group_id: &str) -> Option<Arc<LayerDescriptor>> {
        let request = [group_id.to_string()];
        let groups = match self.loader.load_groups(&request).await {
            Ok(groups) => groups,
            Err(err) => {
                log::warn!("data group '{}' failed to load: {:#}", group_id, err);
                return None;
            }
        };

        let Some(group) = groups.into_iter().find(|group| group.id == group_id) else {
            log::debug!("data group '{}' not found", group_id);
            return None;
        };

        let descriptor = self.resolve(group_id, group)?;
        self.cache
            .borrow_mut()
            .put(group_id.to_string(), descriptor.clone());
        Some(descriptor)
    }

    fn resolve(&self, group_id: &str, group: GroupData) -> Option<Arc<LayerDescriptor>> {
        if group.geometry.is_empty() {
            log::warn!("data group '{}' has no geometry, skipping", group_id);
            return None;
        }

        let options = LayerOptions {
            attribution: group.attribution,
            is_external: group.is_external,
        };
        build_descriptor(group_id, &group.geometry, options).map(Arc::new)
    }

    fn next_inline_id(&self) -> String {
        let next = self.inline_counter.get();
        self.inline_counter.set(next + 1);
        format!("_inline-{}", next)
    }
}

fn build_descriptor(
    group_id: &str,
    geometry: &GeoJson,
    options: LayerOptions,
) -> Option<LayerDescriptor> {
    match geometry.to_renderable() {
        Ok(layer) => Some(LayerDescriptor::new(group_id, layer, options)),
        Err(err) => {
            log::warn!("failed to render data group '{}': {}", group_id, err);
            None
        }
    }
}

impl std::fmt::Debug for DataLayerStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataLayerStore")
            .field("cached", &self.cache_len())
            .field("inline_counter", &self.inline_counter.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::geojson::GeoJsonGeometry;
    use async_trait::async_trait;

    struct CountingLoader {
        calls: Cell<usize>,
    }

    fn point(lng: f64, lat: f64) -> GeoJson {
        GeoJson::Geometry(GeoJsonGeometry::Point {
            coordinates: vec![lng, lat],
        })
    }

    #[async_trait(?Send)]
    impl DataLoader for CountingLoader {
        async fn load_groups(&self, ids: &[String]) -> anyhow::Result<Vec<GroupData>> {
            self.calls.set(self.calls.get() + 1);
            let mut groups = Vec::new();
            for id in ids {
                match id.as_str() {
                    "failing" => anyhow::bail!("service unavailable"),
                    "empty" => groups.push(GroupData::new(id.as_str(), GeoJson::empty())),
                    "missing" => {}
                    _ => groups.push(
                        GroupData::new(id.as_str(), point(2.0, 48.0)).with_attribution("OSM"),
                    ),
                }
            }
            Ok(groups)
        }

        async fn load_inline(&self, data: &GeoJson) -> anyhow::Result<Vec<GroupData>> {
            Ok(vec![GroupData::new("ignored", data.clone())])
        }
    }

    fn store() -> (DataLayerStore, Rc<CountingLoader>) {
        let loader = Rc::new(CountingLoader {
            calls: Cell::new(0),
        });
        (DataLayerStore::new(loader.clone(), 8), loader)
    }

    fn ids(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    #[tokio::test]
    async fn test_failures_are_isolated() {
        let (store, _) = store();
        let layers = store
            .load_groups(&ids(&["parks", "failing", "rivers"]))
            .await;

        let names: Vec<_> = layers.iter().map(|l| l.group_id.as_str()).collect();
        assert_eq!(names, vec!["parks", "rivers"]);
        assert_eq!(layers[0].attribution, "OSM");
    }

    #[tokio::test]
    async fn test_duplicates_and_cache_hits_skip_the_loader() {
        let (store, loader) = store();
        store.load_groups(&ids(&["parks", "parks"])).await;
        assert_eq!(loader.calls.get(), 1);

        let again = store.load_groups(&ids(&["parks"])).await;
        assert_eq!(again.len(), 1);
        assert_eq!(loader.calls.get(), 1);
        assert!(store.cached("parks").is_some());
    }

    #[tokio::test]
    async fn test_empty_and_missing_groups_are_skipped() {
        let (store, _) = store();
        let layers = store.load_groups(&ids(&["empty", "missing"])).await;
        assert!(layers.is_empty());
        assert_eq!(store.cache_len(), 0);
    }

    #[tokio::test]
    async fn test_inline_ids_never_collide() {
        let (store, _) = store();
        let first = store.load_inline(&point(1.0, 1.0)).await;
        let second = store.load_inline(&point(1.0, 1.0)).await;

        assert_eq!(first[0].group_id, "_inline-0");
        assert_eq!(second[0].group_id, "_inline-1");
    }
}

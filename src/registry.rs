//! Ownership of every live map instance on the page.
//!
//! Parent/child links are ids into the registry; all link bookkeeping goes
//! through here so destroying one side always clears the other.

use crate::core::map::{FeatureType, MapId, MapInstance};
use crate::prelude::HashMap;
use crate::routing::binding::RouteBinding;
use crate::{MapError, Result};

#[derive(Debug, Default)]
pub struct MapRegistry {
    instances: HashMap<MapId, MapInstance>,
    next_id: u64,
    routes: RouteBinding,
    maps_hook_fired: bool,
}

impl MapRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate_id(&mut self) -> MapId {
        self.next_id += 1;
        MapId::new(self.next_id)
    }

    pub fn insert(&mut self, instance: MapInstance) {
        self.instances.insert(instance.id(), instance);
    }

    pub fn get(&self, id: MapId) -> Option<&MapInstance> {
        self.instances.get(&id)
    }

    pub fn get_mut(&mut self, id: MapId) -> Option<&mut MapInstance> {
        self.instances.get_mut(&id)
    }

    /// Like [`MapRegistry::get_mut`], failing with [`MapError::UnknownMap`]
    pub fn require_mut(&mut self, id: MapId) -> Result<&mut MapInstance> {
        self.instances.get_mut(&id).ok_or(MapError::UnknownMap(id))
    }

    pub fn contains(&self, id: MapId) -> bool {
        self.instances.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Ids of all live instances in creation order
    pub fn ids(&self) -> Vec<MapId> {
        let mut ids: Vec<MapId> = self.instances.keys().copied().collect();
        ids.sort();
        ids
    }

    /// Inline interactive maps, i.e. mapframes that are not full-screen children
    pub fn interactive_maps(&self) -> Vec<MapId> {
        self.ids()
            .into_iter()
            .filter(|id| {
                self.instances.get(id).map_or(false, |instance| {
                    instance.feature_type() == FeatureType::MapFrame
                        && !instance.options().is_full_screen
                })
            })
            .collect()
    }

    pub fn routes(&self) -> &RouteBinding {
        &self.routes
    }

    pub fn register_route(&mut self, id: MapId) -> usize {
        self.routes.register(id)
    }

    /// Live map behind a route index
    pub fn resolve_route(&self, index: usize) -> Option<MapId> {
        self.routes.resolve(index).filter(|id| self.contains(*id))
    }

    /// Links a full-screen child to its parent, both sides at once
    pub fn link_child(&mut self, parent: MapId, child: MapId) -> Result<()> {
        if !self.contains(child) {
            return Err(MapError::UnknownMap(child));
        }
        self.require_mut(parent)?.set_child(Some(child));
        self.require_mut(child)?.set_parent(Some(parent));
        Ok(())
    }

    /// The instance that is shown full screen on behalf of `id`: the map
    /// itself for links and full-screen children, otherwise its child
    pub fn full_screen_target(&self, id: MapId) -> Option<MapId> {
        let instance = self.get(id)?;
        if instance.options().is_link_variant || instance.options().is_full_screen {
            Some(id)
        } else {
            instance.child()
        }
    }

    /// Destroys an instance, its child first. Returns the removed ids.
    pub fn destroy(&mut self, id: MapId) -> Vec<MapId> {
        let mut removed = Vec::new();
        let child = match self.instances.get(&id) {
            Some(instance) => instance.child(),
            None => return removed,
        };

        if let Some(child) = child {
            removed.extend(self.destroy(child));
        }

        if let Some(mut instance) = self.instances.remove(&id) {
            if let Some(parent) = instance.parent().and_then(|p| self.instances.get_mut(&p)) {
                if parent.child() == Some(id) {
                    parent.set_child(None);
                }
            }
            instance.set_parent(None);
            instance.set_child(None);
            instance.teardown();
            log::debug!("destroyed {}", id);
            removed.push(id);
        }

        removed
    }

    /// Drops everything for a content replacement
    pub fn clear(&mut self) -> Vec<MapId> {
        let mut removed = Vec::new();
        for id in self.ids() {
            removed.extend(self.destroy(id));
        }
        self.routes.clear();
        self.maps_hook_fired = false;
        removed
    }

    /// True the first time it is called in a content cycle
    pub fn take_maps_hook(&mut self) -> bool {
        !std::mem::replace(&mut self.maps_hook_fired, true)
    }
}

//! Map initialization as explicit stages: `load_layers` → `resolve_view` →
//! `fire_ready`.
//!
//! Each stage looks its map up again and reports `false` when the map has
//! been destroyed in the meantime, which stops the remaining stages.

use crate::core::map::MapId;
use crate::host::MapHost;
use crate::input::events::MapEvent;

impl MapHost {
    /// Runs all stages. Returns false when the map went away before it was ready.
    ///
    /// Data failures never stop the pipeline: a map whose groups all failed
    /// still becomes ready, showing whatever resolved.
    pub async fn initialize(&self, id: MapId) -> bool {
        self.load_layers(id).await && self.resolve_view(id) && self.fire_ready(id)
    }

    /// Resolves the map's data groups and inline data and draws them
    pub(crate) async fn load_layers(&self, id: MapId) -> bool {
        let Some((group_ids, inline_data)) = self.with_map(id, |map| {
            (
                map.options().data_group_ids.clone(),
                map.options().inline_data.clone(),
            )
        }) else {
            return false;
        };

        let store = self.store();
        let inline = async {
            match &inline_data {
                Some(data) => store.load_inline(data).await,
                None => Vec::new(),
            }
        };
        let (mut descriptors, inline_descriptors) =
            futures::join!(store.load_groups(&group_ids), inline);
        descriptors.extend(inline_descriptors);

        let added = self.with_map_mut(id, |map| {
            descriptors
                .into_iter()
                .filter(|descriptor| map.insert_layer(descriptor.clone()))
                .map(|descriptor| descriptor.group_id.clone())
                .collect::<Vec<_>>()
        });

        let Some(added) = added else {
            log::debug!("{} destroyed while loading, dropping its layers", id);
            return false;
        };

        log::debug!("{}: {} layer(s) added", id, added.len());
        for group_id in added {
            self.emit(MapEvent::LayerAdded { map: id, group_id });
        }
        true
    }

    /// Places the first view from the options, fitting to layers when no
    /// center was given
    pub(crate) fn resolve_view(&self, id: MapId) -> bool {
        let position = self.with_map_mut(id, |map| {
            let request = map.options().view_request();
            map.init_view(request, true)
        });

        match position {
            Some(position) => {
                self.emit(MapEvent::ViewChanged { map: id, position });
                true
            }
            None => false,
        }
    }

    /// Flips readiness and runs pending ready callbacks
    pub(crate) fn fire_ready(&self, id: MapId) -> bool {
        match self.with_map_mut(id, |map| map.mark_ready()) {
            Some(true) => {
                log::debug!("{} is ready", id);
                self.emit(MapEvent::Ready { map: id });
                true
            }
            Some(false) => true,
            None => false,
        }
    }
}

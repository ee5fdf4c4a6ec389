//! The page-level owner of all maps.
//!
//! [`MapHost`] lives on the page's single execution queue. It owns the
//! registry, the shared data store and the collaborators, and drives maps
//! from document signals: construction, resizes, user actions and router
//! dispatches. Registry borrows are never held across an `.await`; anything
//! that resumes after a suspension looks its map up again and becomes a
//! no-op if the map is gone.

use crate::{
    core::{
        builder::MapHostBuilder,
        config::MapConfig,
        constants::ROUTE_PREFIX,
        map::{Container, MapId, MapInstance, MapOptions},
        view_state::{ViewPosition, ViewRequest},
    },
    data::geojson::GeoJson,
    input::events::{EventManager, MapEvent},
    layers::{
        descriptor::{LayerDescriptor, LayerOptions},
        store::DataLayerStore,
    },
    registry::MapRegistry,
    routing::{route::MapRoute, Router},
    ui::fullscreen::{OpenDecision, Presentation, PresentationLoader},
    MapError, Result,
};
use futures::channel::oneshot;
use instant::Instant;
use std::cell::{Cell, Ref, RefCell};
use std::rc::Rc;
use std::sync::Arc;

/// Creates surfaces for full-screen dialog maps
pub trait ContainerFactory {
    fn create_full_screen_container(&self) -> Box<dyn Container>;
}

pub struct MapHost {
    config: MapConfig,
    registry: RefCell<MapRegistry>,
    store: DataLayerStore,
    events: RefCell<EventManager>,
    router: RefCell<Box<dyn Router>>,
    presentation_loader: Rc<dyn PresentationLoader>,
    presentation: RefCell<Option<Box<dyn Presentation>>>,
    containers: Box<dyn ContainerFactory>,
    viewport_width: Cell<f64>,
    last_written_route: RefCell<Option<String>>,
}

impl MapHost {
    pub fn builder(config: MapConfig) -> MapHostBuilder {
        MapHostBuilder::new(config)
    }

    pub(crate) fn from_parts(
        config: MapConfig,
        store: DataLayerStore,
        router: Box<dyn Router>,
        presentation_loader: Rc<dyn PresentationLoader>,
        containers: Box<dyn ContainerFactory>,
        viewport_width: f64,
    ) -> Self {
        Self {
            config,
            registry: RefCell::new(MapRegistry::new()),
            store,
            events: RefCell::new(EventManager::new()),
            router: RefCell::new(router),
            presentation_loader,
            presentation: RefCell::new(None),
            containers,
            viewport_width: Cell::new(viewport_width),
            last_written_route: RefCell::new(None),
        }
    }

    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    pub fn store(&self) -> &DataLayerStore {
        &self.store
    }

    pub fn registry(&self) -> Ref<'_, MapRegistry> {
        self.registry.borrow()
    }

    pub fn viewport_width(&self) -> f64 {
        self.viewport_width.get()
    }

    pub fn with_map<R>(&self, id: MapId, f: impl FnOnce(&MapInstance) -> R) -> Option<R> {
        self.registry.borrow().get(id).map(f)
    }

    pub fn with_map_mut<R>(&self, id: MapId, f: impl FnOnce(&mut MapInstance) -> R) -> Option<R> {
        self.registry.borrow_mut().get_mut(id).map(f)
    }

    /// Register an event listener
    pub fn on<F>(&self, event_type: &str, callback: F)
    where
        F: Fn(&MapEvent) + 'static,
    {
        self.events.borrow_mut().on(event_type, callback);
    }

    /// Dispatches queued events. Listeners must not call back into the host.
    pub fn process_events(&self) -> Vec<MapEvent> {
        self.events.borrow_mut().process_events()
    }

    pub(crate) fn emit(&self, event: MapEvent) {
        self.events.borrow_mut().emit(event);
    }

    /// Builds and registers a map without loading anything yet.
    ///
    /// Fails with [`MapError::Config`] when the tile server is not configured.
    /// Maps that can go full screen get a route index.
    pub fn create_map(&self, options: MapOptions, container: Box<dyn Container>) -> Result<MapId> {
        let mut registry = self.registry.borrow_mut();
        let id = registry.allocate_id();
        let mut instance = MapInstance::new(id, options, container, &self.config)?;

        let routable = instance.options().allow_full_screen || instance.options().is_link_variant;
        if routable && !instance.options().is_full_screen {
            let index = registry.register_route(id);
            if instance.options().full_screen_route.is_none() {
                instance.options_mut().full_screen_route =
                    Some(format!("/{}/{}", ROUTE_PREFIX, index));
            }
        }

        let container_width = instance.container().size().x;
        let evaluated = instance
            .interaction_mut()
            .evaluate(self.viewport_width.get(), container_width);
        let mode = evaluated.unwrap_or(instance.mode());
        instance.apply_mode(mode);

        log::debug!("created {} ({:?})", id, instance.feature_type());
        registry.insert(instance);
        Ok(id)
    }

    /// Creates a map and runs its initialization pipeline
    pub async fn build_map(&self, options: MapOptions, container: Box<dyn Container>) -> Result<MapId> {
        let id = self.create_map(options, container)?;
        self.initialize(id).await;
        Ok(id)
    }

    /// Destroys a map and its full-screen child. An open dialog showing one
    /// of them is closed and the route cleared.
    pub fn destroy(&self, id: MapId) -> Vec<MapId> {
        let target = self.registry.borrow().full_screen_target(id);
        let shown = target.filter(|target| {
            self.with_map(*target, |map| map.full_screen().is_open())
                .unwrap_or(false)
        });

        if let Some(target) = shown {
            self.close_presentation();
            self.emit(MapEvent::FullScreenClosed { map: target });
            self.write_route("", false);
        }
        self.registry.borrow_mut().destroy(id)
    }

    /// Tears down every map when the document's main content is replaced
    pub fn replace_content(&self) -> Vec<MapId> {
        let shown = {
            let registry = self.registry.borrow();
            registry
                .ids()
                .into_iter()
                .any(|id| registry.get(id).map_or(false, |map| map.full_screen().is_open()))
        };
        if shown {
            self.close_presentation();
        }
        self.last_written_route.borrow_mut().take();
        self.store.clear_cache();
        let removed = self.registry.borrow_mut().clear();
        log::debug!("content replaced, {} map(s) destroyed", removed.len());
        removed
    }

    /// Runs `callback` once the map is ready, right away if it already is
    pub fn do_when_ready<F>(&self, id: MapId, callback: F) -> Result<()>
    where
        F: FnOnce(&MapInstance) + 'static,
    {
        self.registry
            .borrow_mut()
            .require_mut(id)?
            .do_when_ready(callback);
        Ok(())
    }

    /// Resolves once the map is ready. Returns false if the map is or goes away.
    pub async fn when_ready(&self, id: MapId) -> bool {
        let receiver = {
            let mut registry = self.registry.borrow_mut();
            let Some(map) = registry.get_mut(id) else {
                return false;
            };
            if map.is_ready() {
                return true;
            }
            let (sender, receiver) = oneshot::channel();
            map.do_when_ready(move |_| {
                let _ = sender.send(());
            });
            receiver
        };
        receiver.await.is_ok()
    }

    /// Publishes the interactive maps of the current content, once per cycle
    pub fn publish_maps(&self) -> bool {
        let maps = {
            let mut registry = self.registry.borrow_mut();
            if !registry.take_maps_hook() {
                return false;
            }
            registry.interactive_maps()
        };
        self.emit(MapEvent::MapsHook { maps });
        true
    }

    /// Converts GeoJSON and adds it to a map
    pub fn add_layer(
        &self,
        id: MapId,
        group_id: &str,
        geometry: &GeoJson,
        options: LayerOptions,
    ) -> Option<Arc<LayerDescriptor>> {
        let added = self.with_map_mut(id, |map| {
            self.store.add_layer(map, group_id, geometry, options)
        })??;
        self.emit(MapEvent::LayerAdded {
            map: id,
            group_id: added.group_id.clone(),
        });
        Some(added)
    }

    /// Records a viewport resize; evaluation waits for the quiet period
    pub fn on_viewport_resize(&self, width: f64, now: Instant) {
        self.viewport_width.set(width);
        let mut registry = self.registry.borrow_mut();
        for id in registry.ids() {
            if let Some(map) = registry.get_mut(id) {
                map.interaction_mut().on_resize(width, now);
            }
        }
    }

    /// Applies debounced mode changes that are due. Returns how many maps switched.
    pub fn tick(&self, now: Instant) -> usize {
        let mut changed = Vec::new();
        {
            let mut registry = self.registry.borrow_mut();
            for id in registry.ids() {
                let Some(map) = registry.get_mut(id) else {
                    continue;
                };
                let container_width = map.container().size().x;
                if let Some(mode) = map.interaction_mut().poll(now, container_width) {
                    map.apply_mode(mode);
                    changed.push(MapEvent::ModeChanged { map: id, mode });
                }
            }
        }

        let count = changed.len();
        for event in changed {
            self.emit(event);
        }
        count
    }

    /// Earliest pending resize evaluation across all maps
    pub fn next_resize_deadline(&self) -> Option<Instant> {
        let registry = self.registry.borrow();
        registry
            .ids()
            .into_iter()
            .filter_map(|id| registry.get(id).and_then(|map| map.interaction().deadline()))
            .min()
    }

    /// Sleeps through pending quiet periods and applies the resulting mode changes
    #[cfg(feature = "tokio-runtime")]
    pub async fn settle_resize(&self) -> usize {
        let mut changed = 0;
        while let Some(deadline) = self.next_resize_deadline() {
            let now = Instant::now();
            if deadline > now {
                tokio::time::sleep(deadline - now).await;
            }
            changed += self.tick(Instant::now());
        }
        changed
    }

    /// Re-places the view of a map whose container got laid out after its
    /// first placement, so the position can be persisted.
    pub fn on_container_laid_out(&self, id: MapId) {
        let position = self.with_map_mut(id, |map| {
            if !map.is_ready() || map.observed_position().is_some() {
                return None;
            }
            let request = map.options().view_request();
            Some(map.set_view(request, true))
        });

        if let Some(Some(position)) = position {
            self.emit(MapEvent::ViewChanged { map: id, position });
        }
    }

    /// The user panned or zoomed a map. Open full-screen maps rewrite the route.
    pub fn on_view_moved(&self, id: MapId, position: ViewPosition) {
        let route = {
            let mut registry = self.registry.borrow_mut();
            let Some(map) = registry.get_mut(id) else {
                return;
            };
            let position = map.set_view(ViewRequest::at(position), false);
            self.emit(MapEvent::ViewChanged { map: id, position });
            if !map.full_screen().is_open() {
                return;
            }
            map.get_hash()
        };
        self.write_route(&route, true);
    }

    /// Opens the full-screen dialog on behalf of `id`.
    ///
    /// Returns the map shown in the dialog, or `None` when the open was
    /// dropped because a router-driven close got in first or a map went away.
    pub async fn open_full_screen(
        &self,
        id: MapId,
        position: Option<ViewPosition>,
    ) -> Result<Option<MapId>> {
        if !self.when_ready(id).await {
            log::debug!("{} is gone, full screen not opened", id);
            return Ok(None);
        }

        let (target, spawned) = {
            let mut registry = self.registry.borrow_mut();
            let position = match position {
                Some(position) => position,
                None => registry
                    .get(id)
                    .ok_or(MapError::UnknownMap(id))?
                    .position(),
            };

            match registry.full_screen_target(id) {
                Some(target) => {
                    let map = registry.require_mut(target)?;
                    if map.full_screen_mut().begin_open() == OpenDecision::Abort {
                        return Ok(None);
                    }
                    let position = map.set_view(ViewRequest::at(position), false);
                    self.emit(MapEvent::ViewChanged {
                        map: target,
                        position,
                    });
                    (target, false)
                }
                None => (self.spawn_child(&mut registry, id, position)?, true),
            }
        };

        if spawned {
            self.resolve_view(target);
            let initial = self.with_map(id, |parent| parent.initial_position()).flatten();
            if let Some(initial) = initial {
                self.with_map_mut(target, |child| {
                    child.init_view(ViewRequest::at(initial), false);
                });
            }
            self.fire_ready(target);
        }

        if let Err(err) = self.ensure_presentation().await {
            log::error!("full screen dialog failed to load: {}", err);
            self.with_map_mut(target, |map| map.full_screen_mut().finish_close());
            return Err(err);
        }

        if !self.when_ready(target).await {
            return Ok(None);
        }

        let route = {
            let mut registry = self.registry.borrow_mut();
            let Some(map) = registry.get_mut(target) else {
                return Ok(None);
            };
            if !map.full_screen_mut().finish_open() {
                log::debug!("{}: full screen open aborted by router", target);
                return Ok(None);
            }
            if let Some(presentation) = self.presentation.borrow_mut().as_mut() {
                presentation.show(map);
            }
            map.get_hash()
        };

        self.emit(MapEvent::FullScreenOpened { map: target });
        self.write_route(&route, false);
        Ok(Some(target))
    }

    /// User-driven close. Keeps the child cached and clears the route.
    pub fn close_full_screen(&self, id: MapId) -> bool {
        let target = self.registry.borrow().full_screen_target(id);
        let Some(target) = target else {
            return false;
        };
        if !self.close_target(target, false) {
            return false;
        }
        self.write_route("", false);
        true
    }

    /// Dispatch from the document's router.
    ///
    /// The empty route closes any full-screen map. A map route opens its map,
    /// at the route's position or the map's remembered initial position. An
    /// index with no live map resets the route. Other routes are ignored, as
    /// are echoes of routes the host navigated to itself.
    pub async fn handle_route(&self, route: &str) -> Result<()> {
        // Only the next dispatch can be the echo of a navigation
        let echoed = self.last_written_route.borrow_mut().take();
        if echoed.as_deref() == Some(route) {
            log::trace!("ignoring echo of route '{}'", route);
            return Ok(());
        }

        if route.trim_start_matches('#').trim_start_matches('/').is_empty() {
            self.close_all_from_router();
            return Ok(());
        }

        let Some(parsed) = MapRoute::parse(route) else {
            return Ok(());
        };

        let resolved = self.registry.borrow().resolve_route(parsed.index);
        let Some(id) = resolved else {
            log::warn!("no map registered for route '{}', resetting", route);
            self.write_route("", false);
            return Ok(());
        };

        let position = match parsed.position {
            Some(position) => Some(position),
            None => self.with_map(id, |map| map.initial_position()).flatten(),
        };
        self.open_full_screen(id, position).await.map(|_| ())
    }

    fn spawn_child(
        &self,
        registry: &mut MapRegistry,
        parent: MapId,
        position: ViewPosition,
    ) -> Result<MapId> {
        let (options, layers) = {
            let parent = registry.get(parent).ok_or(MapError::UnknownMap(parent))?;
            (
                parent.options().for_full_screen_child(position),
                parent.shared_layers(),
            )
        };

        let id = registry.allocate_id();
        let container = self.containers.create_full_screen_container();
        let mut child = MapInstance::new(id, options, container, &self.config)?;
        let shared = child.share_layers(layers);
        child.apply_mode(child.mode());
        child.full_screen_mut().begin_open();

        registry.insert(child);
        registry.link_child(parent, id)?;
        log::debug!("spawned full screen {} for {} with {} layer(s)", id, parent, shared);
        Ok(id)
    }

    fn close_target(&self, target: MapId, from_router: bool) -> bool {
        let shown = self
            .with_map_mut(target, |map| map.full_screen_mut().begin_close(from_router))
            .unwrap_or(false);
        if !shown {
            return false;
        }

        self.close_presentation();
        self.with_map_mut(target, |map| map.full_screen_mut().finish_close());
        self.emit(MapEvent::FullScreenClosed { map: target });
        true
    }

    fn close_all_from_router(&self) {
        let active: Vec<MapId> = {
            let registry = self.registry.borrow();
            registry
                .ids()
                .into_iter()
                .filter(|id| {
                    registry
                        .get(*id)
                        .map_or(false, |map| map.full_screen().is_active())
                })
                .collect()
        };

        for id in active {
            self.close_target(id, true);
        }
    }

    fn close_presentation(&self) {
        if let Some(presentation) = self.presentation.borrow_mut().as_mut() {
            presentation.close();
        }
    }

    async fn ensure_presentation(&self) -> Result<()> {
        if self.presentation.borrow().is_some() {
            return Ok(());
        }

        let loaded = self
            .presentation_loader
            .load()
            .await
            .map_err(|err| MapError::Presentation(format!("{:#}", err)))?;

        let mut slot = self.presentation.borrow_mut();
        if slot.is_none() {
            *slot = Some(loaded);
        }
        Ok(())
    }

    fn write_route(&self, route: &str, replace: bool) {
        let mut router = self.router.borrow_mut();
        if router.current() == route {
            return;
        }
        if replace {
            // Replacing the current entry is not dispatched back
            router.replace(route);
        } else {
            *self.last_written_route.borrow_mut() = Some(route.to_string());
            router.navigate(route);
        }
    }
}

impl std::fmt::Debug for MapHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapHost")
            .field("maps", &self.registry.borrow().len())
            .field("store", &self.store)
            .field("viewport_width", &self.viewport_width.get())
            .finish()
    }
}

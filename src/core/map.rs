use crate::{
    core::{
        config::MapConfig,
        geo::Point,
        view_state::{SurfaceMetrics, ViewPosition, ViewRequest, ViewStateController},
    },
    data::geojson::GeoJson,
    layers::descriptor::{LayerDescriptor, RenderableLayer},
    prelude::HashMap,
    tiles::source::{StyledTileSource, TileSource},
    ui::{fullscreen::FullScreenController, responsive::InteractionStrategy},
    Result,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Registry key of a map instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MapId(u64);

impl MapId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for MapId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "map#{}", self.0)
    }
}

/// Which document element a map belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureType {
    /// A link that opens a full-screen map
    MapLink,
    /// A map embedded inline
    #[default]
    MapFrame,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Rendered but not pannable until activated
    Static,
    Interactive,
}

/// Interaction handlers the container should enable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InteractionFlags {
    pub dragging: bool,
    pub scroll_wheel_zoom: bool,
    /// Click-to-activate overlay
    pub sleep: bool,
}

/// The surface a map is drawn into, together with its renderer
pub trait Container {
    /// Current laid-out size in pixels
    fn size(&self) -> Point;

    fn is_visible(&self) -> bool;

    fn set_interaction(&mut self, flags: InteractionFlags);

    /// Draws a layer, replacing any layer already drawn under the same group id
    fn draw_layer(&mut self, layer: &LayerDescriptor) -> anyhow::Result<()>;

    fn remove_layer(&mut self, group_id: &str);

    fn add_attribution(&mut self, attribution: &str);

    fn remove_attribution(&mut self, attribution: &str);

    /// Informs the renderer that the view moved
    fn set_view(&mut self, _position: ViewPosition) {}
}

/// Construction input supplied by the document
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MapOptions {
    /// `[lat, lng]`
    pub center: Option<[f64; 2]>,
    pub zoom: Option<f64>,
    pub lang: Option<String>,
    pub style: Option<String>,
    pub data_group_ids: Vec<String>,
    pub inline_data: Option<GeoJson>,
    pub allow_full_screen: bool,
    pub always_interactive: bool,
    pub feature_type: FeatureType,
    pub full_screen_route: Option<String>,
    pub caption: Option<String>,
    /// The map is its own full-screen target
    pub is_link_variant: bool,
    /// Set on the child spawned for a full-screen dialog
    #[serde(skip)]
    pub is_full_screen: bool,
}

impl MapOptions {
    pub fn view_request(&self) -> ViewRequest {
        ViewRequest::new(self.center, self.zoom)
    }

    /// Options for the full-screen child of a map with these options
    pub fn for_full_screen_child(&self, position: ViewPosition) -> Self {
        Self {
            center: Some([position.center.lat, position.center.lng]),
            zoom: Some(position.zoom as f64),
            lang: self.lang.clone(),
            style: self.style.clone(),
            feature_type: self.feature_type,
            full_screen_route: self.full_screen_route.clone(),
            caption: self.caption.clone(),
            allow_full_screen: false,
            is_full_screen: true,
            ..Default::default()
        }
    }
}

type ReadyCallback = Box<dyn FnOnce(&MapInstance)>;

/// One map on the page
pub struct MapInstance {
    id: MapId,
    options: MapOptions,
    container: Box<dyn Container>,
    view: ViewStateController,
    data_layers: HashMap<String, Arc<LayerDescriptor>>,
    parent: Option<MapId>,
    child: Option<MapId>,
    interaction: InteractionStrategy,
    full_screen: FullScreenController,
    tiles: StyledTileSource,
    ready: bool,
    ready_callbacks: Vec<ReadyCallback>,
}

impl MapInstance {
    /// Builds an instance. Fails when the config has no tile server.
    pub fn new(
        id: MapId,
        options: MapOptions,
        container: Box<dyn Container>,
        config: &MapConfig,
    ) -> Result<Self> {
        config.validate()?;
        let tiles =
            StyledTileSource::from_config(config, options.style.as_deref(), options.lang.as_deref())?;
        let interaction = InteractionStrategy::select(
            options.is_full_screen || options.is_link_variant,
            options.always_interactive,
            &config.responsive,
        );

        Ok(Self {
            id,
            options,
            container,
            view: ViewStateController::new(config),
            data_layers: HashMap::default(),
            parent: None,
            child: None,
            interaction,
            full_screen: FullScreenController::new(),
            tiles,
            ready: false,
            ready_callbacks: Vec::new(),
        })
    }

    pub fn id(&self) -> MapId {
        self.id
    }

    pub fn options(&self) -> &MapOptions {
        &self.options
    }

    pub(crate) fn options_mut(&mut self) -> &mut MapOptions {
        &mut self.options
    }

    pub fn feature_type(&self) -> FeatureType {
        self.options.feature_type
    }

    pub fn mode(&self) -> Mode {
        self.interaction.mode()
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn parent(&self) -> Option<MapId> {
        self.parent
    }

    pub fn child(&self) -> Option<MapId> {
        self.child
    }

    pub(crate) fn set_parent(&mut self, parent: Option<MapId>) {
        self.parent = parent;
    }

    pub(crate) fn set_child(&mut self, child: Option<MapId>) {
        self.child = child;
    }

    pub fn container(&self) -> &dyn Container {
        self.container.as_ref()
    }

    pub fn container_mut(&mut self) -> &mut dyn Container {
        self.container.as_mut()
    }

    pub fn view(&self) -> &ViewStateController {
        &self.view
    }

    pub fn full_screen(&self) -> &FullScreenController {
        &self.full_screen
    }

    pub fn full_screen_mut(&mut self) -> &mut FullScreenController {
        &mut self.full_screen
    }

    pub fn interaction(&self) -> &InteractionStrategy {
        &self.interaction
    }

    pub(crate) fn interaction_mut(&mut self) -> &mut InteractionStrategy {
        &mut self.interaction
    }

    pub fn data_layers(&self) -> &HashMap<String, Arc<LayerDescriptor>> {
        &self.data_layers
    }

    pub fn layer(&self, group_id: &str) -> Option<&Arc<LayerDescriptor>> {
        self.data_layers.get(group_id)
    }

    pub fn layer_count(&self) -> usize {
        self.data_layers.len()
    }

    /// Descriptors to hand to a full-screen child
    pub fn shared_layers(&self) -> Vec<Arc<LayerDescriptor>> {
        self.data_layers.values().cloned().collect()
    }

    /// The current center/zoom
    pub fn position(&self) -> ViewPosition {
        self.view.position()
    }

    pub fn initial_position(&self) -> Option<ViewPosition> {
        self.view.initial_position()
    }

    /// Position last published through a persisting view placement
    pub fn observed_position(&self) -> Option<ViewPosition> {
        self.view.observed_position()
    }

    pub fn surface(&self) -> SurfaceMetrics {
        SurfaceMetrics::new(self.container.size(), self.container.is_visible())
    }

    /// Route this map opens under, without the position suffix
    pub fn route_prefix(&self) -> String {
        self.options
            .full_screen_route
            .clone()
            .unwrap_or_else(|| format!("/{}", crate::constants::ROUTE_PREFIX))
    }

    pub fn get_hash(&self) -> String {
        self.view.get_hash(&self.route_prefix())
    }

    pub fn init_view(&mut self, request: ViewRequest, apply: bool) -> ViewPosition {
        let surface = self.surface();
        let layers = self.data_layers.values().map(|layer| &layer.geometry);
        let position = self.view.init_view(request, apply, layers, surface);
        if apply {
            self.container.set_view(position);
        }
        position
    }

    pub fn set_view(&mut self, request: ViewRequest, persist: bool) -> ViewPosition {
        let surface = self.surface();
        let layers = self.data_layers.values().map(|layer| &layer.geometry);
        let position = self.view.set_view(request, layers, surface, persist);
        self.container.set_view(position);
        position
    }

    /// Draws a descriptor and registers it, replacing an earlier one with the
    /// same group id. Returns false when the container refuses it.
    pub fn insert_layer(&mut self, descriptor: Arc<LayerDescriptor>) -> bool {
        if let Err(err) = self.container.draw_layer(&descriptor) {
            log::warn!(
                "{}: failed to draw layer '{}': {:#}",
                self.id,
                descriptor.group_id,
                err
            );
            return false;
        }

        let previous = self
            .data_layers
            .insert(descriptor.group_id.clone(), descriptor.clone());
        if let Some(previous) = previous.filter(|previous| !previous.attribution.is_empty()) {
            self.container.remove_attribution(&previous.attribution);
        }
        if !descriptor.attribution.is_empty() {
            self.container.add_attribution(&descriptor.attribution);
        }
        true
    }

    /// Registers descriptors resolved for another instance, returns how many were drawn
    pub fn share_layers<I>(&mut self, descriptors: I) -> usize
    where
        I: IntoIterator<Item = Arc<LayerDescriptor>>,
    {
        descriptors
            .into_iter()
            .filter(|descriptor| self.insert_layer(descriptor.clone()))
            .count()
    }

    pub fn renderables(&self) -> impl Iterator<Item = &RenderableLayer> {
        self.data_layers.values().map(|layer| &layer.geometry)
    }

    pub(crate) fn apply_mode(&mut self, mode: Mode) {
        log::debug!("{}: switching to {:?} mode", self.id, mode);
        self.container.set_interaction(mode.flags());
    }

    /// Runs `callback` now if the map is ready, otherwise once it becomes ready
    pub fn do_when_ready<F>(&mut self, callback: F)
    where
        F: FnOnce(&MapInstance) + 'static,
    {
        if self.ready {
            callback(self);
        } else {
            self.ready_callbacks.push(Box::new(callback));
        }
    }

    /// Flips readiness. Returns false if the map was already ready.
    pub(crate) fn mark_ready(&mut self) -> bool {
        if self.ready {
            return false;
        }
        self.ready = true;
        for callback in std::mem::take(&mut self.ready_callbacks) {
            callback(self);
        }
        true
    }

    /// URLs of the tiles covering the current view
    pub fn tile_urls(&self) -> Vec<String> {
        self.view
            .viewport()
            .visible_tiles()
            .into_iter()
            .map(|coord| self.tiles.url(coord))
            .collect()
    }

    /// Removes everything this map put into its container
    pub(crate) fn teardown(&mut self) {
        for (group_id, descriptor) in self.data_layers.drain() {
            self.container.remove_layer(&group_id);
            if !descriptor.attribution.is_empty() {
                self.container.remove_attribution(&descriptor.attribution);
            }
        }
        self.ready_callbacks.clear();
    }
}

impl fmt::Debug for MapInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapInstance")
            .field("id", &self.id)
            .field("feature_type", &self.options.feature_type)
            .field("mode", &self.mode())
            .field("ready", &self.ready)
            .field("layers", &self.data_layers.len())
            .field("parent", &self.parent)
            .field("child", &self.child)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::descriptor::LayerOptions;
    use geo_types::point;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default)]
    struct Recorded {
        attributions: Vec<String>,
        drawn: Vec<String>,
    }

    struct TestContainer {
        size: Point,
        recorded: Rc<RefCell<Recorded>>,
    }

    impl Container for TestContainer {
        fn size(&self) -> Point {
            self.size
        }

        fn is_visible(&self) -> bool {
            true
        }

        fn set_interaction(&mut self, _flags: InteractionFlags) {}

        fn draw_layer(&mut self, layer: &LayerDescriptor) -> anyhow::Result<()> {
            if layer.group_id == "broken" {
                anyhow::bail!("renderer rejected layer");
            }
            self.recorded.borrow_mut().drawn.push(layer.group_id.clone());
            Ok(())
        }

        fn remove_layer(&mut self, group_id: &str) {
            self.recorded.borrow_mut().drawn.retain(|id| id != group_id);
        }

        fn add_attribution(&mut self, attribution: &str) {
            self.recorded
                .borrow_mut()
                .attributions
                .push(attribution.to_string());
        }

        fn remove_attribution(&mut self, attribution: &str) {
            self.recorded
                .borrow_mut()
                .attributions
                .retain(|a| a != attribution);
        }
    }

    fn instance(options: MapOptions) -> (MapInstance, Rc<RefCell<Recorded>>) {
        let recorded = Rc::new(RefCell::new(Recorded::default()));
        let container = TestContainer {
            size: Point::new(800.0, 600.0),
            recorded: recorded.clone(),
        };
        let map = MapInstance::new(
            MapId::new(1),
            options,
            Box::new(container),
            &MapConfig::for_testing(),
        )
        .unwrap();
        (map, recorded)
    }

    fn descriptor(group_id: &str, attribution: &str) -> Arc<LayerDescriptor> {
        Arc::new(LayerDescriptor::new(
            group_id,
            RenderableLayer::Shape(point!(x: 2.0, y: 48.0).into()),
            LayerOptions {
                attribution: attribution.to_string(),
                is_external: false,
            },
        ))
    }

    #[test]
    fn test_missing_tile_server_fails_construction() {
        let result = MapInstance::new(
            MapId::new(1),
            MapOptions::default(),
            Box::new(TestContainer {
                size: Point::default(),
                recorded: Rc::default(),
            }),
            &MapConfig::default(),
        );
        assert!(matches!(result, Err(crate::MapError::Config(_))));
    }

    #[test]
    fn test_replacing_layer_swaps_attribution() {
        let (mut map, recorded) = instance(MapOptions::default());

        assert!(map.insert_layer(descriptor("parks", "City")));
        assert!(map.insert_layer(descriptor("parks", "County")));

        assert_eq!(map.layer_count(), 1);
        assert_eq!(recorded.borrow().attributions, vec!["County".to_string()]);
    }

    #[test]
    fn test_rejected_layer_is_not_registered() {
        let (mut map, _) = instance(MapOptions::default());
        assert!(!map.insert_layer(descriptor("broken", "")));
        assert_eq!(map.layer_count(), 0);
    }

    #[test]
    fn test_ready_callbacks_fire_once() {
        let (mut map, _) = instance(MapOptions::default());
        let fired = Rc::new(RefCell::new(0));

        let counter = fired.clone();
        map.do_when_ready(move |_| *counter.borrow_mut() += 1);
        assert_eq!(*fired.borrow(), 0);

        assert!(map.mark_ready());
        assert!(!map.mark_ready());
        assert_eq!(*fired.borrow(), 1);

        let counter = fired.clone();
        map.do_when_ready(move |_| *counter.borrow_mut() += 1);
        assert_eq!(*fired.borrow(), 2);
    }

    #[test]
    fn test_set_view_fits_layers() {
        let (mut map, _) = instance(MapOptions::default());
        map.insert_layer(descriptor("marker", ""));

        let position = map.set_view(ViewRequest::fit(), true);
        assert_eq!(position.zoom, MapConfig::for_testing().fallback_zoom);
        assert_eq!(map.observed_position(), Some(position));
    }

    #[test]
    fn test_route_prefix_and_tiles() {
        let (mut map, _) = instance(MapOptions {
            full_screen_route: Some("/map/4".to_string()),
            lang: Some("fr".to_string()),
            ..Default::default()
        });
        assert_eq!(map.get_hash(), "/map/4");

        map.set_view(ViewRequest::new(Some([0.0, 0.0]), Some(1.0)), true);
        let urls = map.tile_urls();
        assert!(!urls.is_empty());
        assert!(urls.iter().all(|url| url.ends_with("?lang=fr")));
    }

    #[test]
    fn test_link_variant_is_always_interactive() {
        let (map, _) = instance(MapOptions {
            is_link_variant: true,
            feature_type: FeatureType::MapLink,
            ..Default::default()
        });
        assert!(!map.interaction().is_responsive());
        assert_eq!(map.mode(), Mode::Interactive);
    }

    #[test]
    fn test_options_deserialize() {
        let options: MapOptions = serde_json::from_str(
            r#"{"center": [51.5, -0.1], "zoom": 12, "dataGroupIds": ["a", "b"],
                "featureType": "maplink", "isLinkVariant": true}"#,
        )
        .unwrap();
        assert_eq!(options.data_group_ids.len(), 2);
        assert_eq!(options.feature_type, FeatureType::MapLink);
        assert!(options.is_link_variant);
        assert!(!options.is_full_screen);
    }
}

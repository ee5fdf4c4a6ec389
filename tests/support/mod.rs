//! Recording test doubles for the host's collaborators
#![allow(dead_code)]

use async_trait::async_trait;
use futures::channel::oneshot;
use mapframe::{
    Container, ContainerFactory, DataLoader, GeoJson, GeoJsonGeometry, GroupData,
    InteractionFlags, LayerDescriptor, MapConfig, MapHost, Point, Presentation,
    PresentationLoader, Router, ViewPosition,
};
use mapframe::MapInstance;
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn point(lng: f64, lat: f64) -> GeoJson {
    GeoJson::Geometry(GeoJsonGeometry::Point {
        coordinates: vec![lng, lat],
    })
}

pub fn line(from: (f64, f64), to: (f64, f64)) -> GeoJson {
    GeoJson::Geometry(GeoJsonGeometry::LineString {
        coordinates: vec![vec![from.0, from.1], vec![to.0, to.1]],
    })
}

// ---------------------------------------------------------------- container

#[derive(Debug, Default)]
pub struct ContainerLog {
    pub size: Point,
    pub visible: bool,
    pub interaction: Vec<InteractionFlags>,
    pub layers: Vec<String>,
    pub attributions: Vec<String>,
    pub views: Vec<ViewPosition>,
    pub rejected: HashSet<String>,
}

impl ContainerLog {
    pub fn last_interaction(&self) -> Option<InteractionFlags> {
        self.interaction.last().copied()
    }
}

pub struct RecordingContainer {
    log: Rc<RefCell<ContainerLog>>,
}

impl RecordingContainer {
    pub fn new(width: f64, height: f64) -> (Box<dyn Container>, Rc<RefCell<ContainerLog>>) {
        let log = Rc::new(RefCell::new(ContainerLog {
            size: Point::new(width, height),
            visible: width > 0.0 && height > 0.0,
            ..Default::default()
        }));
        (Box::new(Self { log: log.clone() }), log)
    }
}

impl Container for RecordingContainer {
    fn size(&self) -> Point {
        self.log.borrow().size
    }

    fn is_visible(&self) -> bool {
        self.log.borrow().visible
    }

    fn set_interaction(&mut self, flags: InteractionFlags) {
        self.log.borrow_mut().interaction.push(flags);
    }

    fn draw_layer(&mut self, layer: &LayerDescriptor) -> anyhow::Result<()> {
        let mut log = self.log.borrow_mut();
        if log.rejected.contains(&layer.group_id) {
            anyhow::bail!("renderer rejected '{}'", layer.group_id);
        }
        if !log.layers.contains(&layer.group_id) {
            log.layers.push(layer.group_id.clone());
        }
        Ok(())
    }

    fn remove_layer(&mut self, group_id: &str) {
        self.log.borrow_mut().layers.retain(|id| id != group_id);
    }

    fn add_attribution(&mut self, attribution: &str) {
        self.log
            .borrow_mut()
            .attributions
            .push(attribution.to_string());
    }

    fn remove_attribution(&mut self, attribution: &str) {
        self.log
            .borrow_mut()
            .attributions
            .retain(|existing| existing != attribution);
    }

    fn set_view(&mut self, position: ViewPosition) {
        self.log.borrow_mut().views.push(position);
    }
}

/// Hands out full-screen containers and keeps their logs
#[derive(Clone, Default)]
pub struct RecordingContainers {
    pub created: Rc<RefCell<Vec<Rc<RefCell<ContainerLog>>>>>,
}

impl ContainerFactory for RecordingContainers {
    fn create_full_screen_container(&self) -> Box<dyn Container> {
        let (container, log) = RecordingContainer::new(1024.0, 768.0);
        self.created.borrow_mut().push(log);
        container
    }
}

// ------------------------------------------------------------------- loader

#[derive(Clone)]
pub enum GroupScript {
    Resolve { geometry: GeoJson, attribution: String },
    Fail,
}

/// Loader answering from a fixed script, recording every request
#[derive(Default)]
pub struct ScriptedLoader {
    pub groups: RefCell<HashMap<String, GroupScript>>,
    pub requests: RefCell<Vec<Vec<String>>>,
    pub inline_calls: Cell<usize>,
    gate: RefCell<Option<oneshot::Receiver<()>>>,
}

impl ScriptedLoader {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn resolve(&self, id: &str, geometry: GeoJson, attribution: &str) {
        self.groups.borrow_mut().insert(
            id.to_string(),
            GroupScript::Resolve {
                geometry,
                attribution: attribution.to_string(),
            },
        );
    }

    pub fn fail(&self, id: &str) {
        self.groups
            .borrow_mut()
            .insert(id.to_string(), GroupScript::Fail);
    }

    /// The next request waits until the returned sender fires
    pub fn gate(&self) -> oneshot::Sender<()> {
        let (sender, receiver) = oneshot::channel();
        *self.gate.borrow_mut() = Some(receiver);
        sender
    }

    pub fn request_count(&self) -> usize {
        self.requests.borrow().len()
    }
}

#[async_trait(?Send)]
impl DataLoader for ScriptedLoader {
    async fn load_groups(&self, ids: &[String]) -> anyhow::Result<Vec<GroupData>> {
        self.requests.borrow_mut().push(ids.to_vec());

        let gate = self.gate.borrow_mut().take();
        if let Some(gate) = gate {
            let _ = gate.await;
        }

        let mut groups = Vec::new();
        for id in ids {
            let script = self.groups.borrow().get(id).cloned();
            match script {
                Some(GroupScript::Resolve {
                    geometry,
                    attribution,
                }) => groups.push(GroupData::new(id.as_str(), geometry).with_attribution(attribution)),
                Some(GroupScript::Fail) => anyhow::bail!("group '{}' unavailable", id),
                None => {}
            }
        }
        Ok(groups)
    }

    async fn load_inline(&self, data: &GeoJson) -> anyhow::Result<Vec<GroupData>> {
        self.inline_calls.set(self.inline_calls.get() + 1);
        Ok(vec![GroupData::new("inline", data.clone())])
    }
}

// ------------------------------------------------------------------- router

#[derive(Debug, Default)]
pub struct RouterLog {
    pub current: String,
    pub navigations: Vec<String>,
    pub replacements: Vec<String>,
}

pub struct MemoryRouter {
    log: Rc<RefCell<RouterLog>>,
}

impl MemoryRouter {
    pub fn new() -> (Box<dyn Router>, Rc<RefCell<RouterLog>>) {
        let log = Rc::new(RefCell::new(RouterLog::default()));
        (Box::new(Self { log: log.clone() }), log)
    }
}

impl Router for MemoryRouter {
    fn current(&self) -> String {
        self.log.borrow().current.clone()
    }

    fn navigate(&mut self, route: &str) {
        let mut log = self.log.borrow_mut();
        log.current = route.to_string();
        log.navigations.push(route.to_string());
    }

    fn replace(&mut self, route: &str) {
        let mut log = self.log.borrow_mut();
        log.current = route.to_string();
        log.replacements.push(route.to_string());
    }
}

// ------------------------------------------------------------- presentation

#[derive(Debug, Default)]
pub struct PresentationLog {
    pub loads: usize,
    pub shown: Vec<mapframe::MapId>,
    pub closes: usize,
}

struct RecordingPresentation {
    log: Rc<RefCell<PresentationLog>>,
}

impl Presentation for RecordingPresentation {
    fn show(&mut self, map: &MapInstance) {
        self.log.borrow_mut().shown.push(map.id());
    }

    fn close(&mut self) {
        self.log.borrow_mut().closes += 1;
    }
}

#[derive(Default)]
pub struct RecordingPresentationLoader {
    pub log: Rc<RefCell<PresentationLog>>,
    pub fail: Cell<bool>,
    gate: RefCell<Option<oneshot::Receiver<()>>>,
}

impl RecordingPresentationLoader {
    /// The next load waits until the returned sender fires
    pub fn gate(&self) -> oneshot::Sender<()> {
        let (sender, receiver) = oneshot::channel();
        *self.gate.borrow_mut() = Some(receiver);
        sender
    }
}

#[async_trait(?Send)]
impl PresentationLoader for RecordingPresentationLoader {
    async fn load(&self) -> anyhow::Result<Box<dyn Presentation>> {
        let gate = self.gate.borrow_mut().take();
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        if self.fail.get() {
            anyhow::bail!("dialog module failed to load");
        }
        self.log.borrow_mut().loads += 1;
        Ok(Box::new(RecordingPresentation {
            log: self.log.clone(),
        }))
    }
}

// ------------------------------------------------------------------ harness

pub struct Harness {
    pub host: MapHost,
    pub loader: Rc<ScriptedLoader>,
    pub router: Rc<RefCell<RouterLog>>,
    pub presentation: Rc<RecordingPresentationLoader>,
    pub containers: RecordingContainers,
}

impl Harness {
    pub fn new(viewport_width: f64) -> Self {
        Self::with_config(MapConfig::for_testing(), viewport_width)
    }

    pub fn with_config(config: MapConfig, viewport_width: f64) -> Self {
        init_logging();
        let loader = ScriptedLoader::new();
        let (router, router_log) = MemoryRouter::new();
        let presentation = Rc::new(RecordingPresentationLoader::default());
        let containers = RecordingContainers::default();

        let host = MapHost::builder(config)
            .with_loader(loader.clone())
            .with_router(router)
            .with_presentation_loader(presentation.clone())
            .with_container_factory(Box::new(containers.clone()))
            .with_viewport_width(viewport_width)
            .build()
            .expect("host builds");

        Self {
            host,
            loader,
            router: router_log,
            presentation,
            containers,
        }
    }

    pub fn current_route(&self) -> String {
        self.router.borrow().current.clone()
    }
}

//! Host builder for fluent configuration
//!
//! The host needs a handful of collaborators from the embedding document.
//! [`MapHostBuilder`] collects them and validates the configuration before
//! anything is constructed.

use crate::{
    core::config::MapConfig,
    host::{ContainerFactory, MapHost},
    layers::{loader::DataLoader, store::DataLayerStore},
    routing::Router,
    ui::fullscreen::PresentationLoader,
    MapError, Result,
};
use std::rc::Rc;

/// Builder for creating a configured [`MapHost`]
pub struct MapHostBuilder {
    config: MapConfig,
    loader: Option<Rc<dyn DataLoader>>,
    router: Option<Box<dyn Router>>,
    presentation_loader: Option<Rc<dyn PresentationLoader>>,
    containers: Option<Box<dyn ContainerFactory>>,
    viewport_width: f64,
}

impl MapHostBuilder {
    /// Create a new builder around `config`
    pub fn new(config: MapConfig) -> Self {
        Self {
            config,
            loader: None,
            router: None,
            presentation_loader: None,
            containers: None,
            viewport_width: 0.0,
        }
    }

    /// Set the service resolving data groups
    pub fn with_loader(mut self, loader: Rc<dyn DataLoader>) -> Self {
        self.loader = Some(loader);
        self
    }

    /// Set the document's hash router
    pub fn with_router(mut self, router: Box<dyn Router>) -> Self {
        self.router = Some(router);
        self
    }

    /// Set the loader of the full-screen dialog module
    pub fn with_presentation_loader(mut self, loader: Rc<dyn PresentationLoader>) -> Self {
        self.presentation_loader = Some(loader);
        self
    }

    /// Set the factory for full-screen map surfaces
    pub fn with_container_factory(mut self, containers: Box<dyn ContainerFactory>) -> Self {
        self.containers = Some(containers);
        self
    }

    /// Set the viewport width known at startup
    pub fn with_viewport_width(mut self, width: f64) -> Self {
        self.viewport_width = width;
        self
    }

    /// Validate the configuration and build the host
    pub fn build(self) -> Result<MapHost> {
        self.config.validate()?;

        let loader = self.loader.ok_or_else(|| missing("data loader"))?;
        let router = self.router.ok_or_else(|| missing("router"))?;
        let presentation_loader = self
            .presentation_loader
            .ok_or_else(|| missing("presentation loader"))?;
        let containers = self.containers.ok_or_else(|| missing("container factory"))?;

        let store = DataLayerStore::new(loader, self.config.cache_capacity);
        Ok(MapHost::from_parts(
            self.config,
            store,
            router,
            presentation_loader,
            containers,
            self.viewport_width,
        ))
    }
}

fn missing(what: &str) -> MapError {
    MapError::Config(format!("{} is not set", what))
}

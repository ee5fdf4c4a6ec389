//! # mapframe
//!
//! Interactive map view controller for maps embedded in documents.
//!
//! A document hosts two kinds of maps: `maplink`s, which open a full-screen
//! map when activated, and `mapframe`s, which show a live map with data
//! overlays inline. This crate owns everything between the document and the
//! renderer: resolving data groups into layers, fitting the view to content,
//! switching between static and interactive rendering, and running the
//! full-screen dialog in step with the document's hash router.
//!
//! Rendering, data fetching and routing are collaborators reached through
//! traits ([`Container`], [`DataLoader`], [`Router`], [`PresentationLoader`]).

pub mod core;
pub mod data;
pub mod host;
pub mod input;
pub mod layers;
pub mod pipeline;
pub mod prelude;
pub mod registry;
pub mod routing;
pub mod spatial;
pub mod tiles;
pub mod ui;
pub use crate::core::constants;

// Re-export public API
pub use core::{
    builder::MapHostBuilder,
    config::{MapConfig, ResponsiveConfig},
    geo::{LatLng, LatLngBounds, Point, TileCoord},
    map::{Container, FeatureType, InteractionFlags, MapId, MapInstance, MapOptions, Mode},
    view_state::{ViewPosition, ViewRequest, ViewStateController},
    viewport::Viewport,
};

pub use data::geojson::{GeoJson, GeoJsonFeature, GeoJsonGeometry};

pub use host::{ContainerFactory, MapHost};

pub use input::events::{EventManager, MapEvent};

pub use layers::{
    descriptor::{LayerDescriptor, LayerOptions, RenderableLayer},
    loader::{DataLoader, GroupData},
    store::DataLayerStore,
};

pub use registry::MapRegistry;

pub use routing::{binding::RouteBinding, route::MapRoute, Router};

pub use spatial::fitting::BoundsFitter;

pub use tiles::source::{StyledTileSource, TileSource};

pub use ui::{
    fullscreen::{
        FullScreenController, FullScreenState, OpenDecision, Presentation, PresentationLoader,
    },
    responsive::{Debouncer, InteractionStrategy, ResponsiveModeController},
};

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, MapError>;

/// Common error types
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Render error: {0}")]
    Render(String),

    #[error("Invalid coordinates: {0}")]
    InvalidCoordinates(String),

    #[error("Layer error: {0}")]
    Layer(String),

    #[error("Unknown map: {0}")]
    UnknownMap(MapId),

    #[error("Presentation error: {0}")]
    Presentation(String),

    #[error("Parse error: {0}")]
    ParseError(String),
}

/// Error type alias for convenience
pub type Error = MapError;

//! Prelude module for common mapframe types and traits
//!
//! This module re-exports the most commonly used types, traits, and functions
//! for easy importing with `use mapframe::prelude::*;`

pub use crate::core::{
    config::{MapConfig, ResponsiveConfig},
    geo::{LatLng, LatLngBounds, Point, TileCoord},
    map::{Container, FeatureType, InteractionFlags, MapId, MapInstance, MapOptions, Mode},
    view_state::{ViewPosition, ViewRequest},
    viewport::Viewport,
};

pub use crate::data::geojson::{GeoJson, GeoJsonFeature, GeoJsonGeometry};

pub use crate::host::{ContainerFactory, MapHost};

pub use crate::input::events::{EventManager, MapEvent};

pub use crate::layers::{
    descriptor::{LayerDescriptor, LayerOptions, RenderableLayer},
    loader::{DataLoader, GroupData},
    store::DataLayerStore,
};

pub use crate::routing::{route::MapRoute, Router};

pub use crate::spatial::fitting::BoundsFitter;

pub use crate::tiles::source::{StyledTileSource, TileSource};

pub use crate::ui::fullscreen::{FullScreenState, Presentation, PresentationLoader};

pub use crate::{MapError, Result};

// Fast hash map aliases used across the crate
pub use fxhash::{FxHashMap as HashMap, FxHashSet as HashSet};

pub mod builder;
pub mod config;
pub mod constants;
pub mod geo;
pub mod map;
pub mod view_state;
pub mod viewport;

pub use config::{MapConfig, ResponsiveConfig};
pub use geo::{LatLng, LatLngBounds, Point, TileCoord};
pub use map::{MapId, MapInstance, MapOptions};

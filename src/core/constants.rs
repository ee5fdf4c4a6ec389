//! Core constants shared by the view controller, fitter and responsive logic.
//! Keeping them in a single place makes it easier to tweak engine-wide magic numbers.

/// Default square tile size in pixels.
pub const TILE_SIZE: u32 = 256;

/// Latitude limit of the world envelope used for geometry validation.
pub const WORLD_MAX_LAT: f64 = 90.0;

/// Longitude limit of the world envelope used for geometry validation.
pub const WORLD_MAX_LNG: f64 = 180.0;

/// Web Mercator cut-off latitude.
pub const MAX_LATITUDE: f64 = 85.0511287798;

/// Zoom used when a center is known but no zoom was requested.
pub const DEFAULT_FALLBACK_ZOOM: u8 = 13;

/// Highest zoom level the tile provider serves.
pub const DEFAULT_MAX_ZOOM: u8 = 19;

/// Pixels kept free around fitted content.
pub const DEFAULT_FIT_PADDING: f64 = 20.0;

/// Decimal places used for coordinates in route hashes, indexed by zoom.
pub const PRECISION_PER_ZOOM: [usize; 20] =
    [0, 0, 1, 2, 2, 3, 3, 3, 3, 4, 4, 4, 4, 4, 4, 4, 4, 5, 5, 5];

/// Viewports at or below this width always render maps statically.
pub const MIN_INTERACTIVE_VIEWPORT_WIDTH: f64 = 480.0;

/// Horizontal room a page needs next to a map to stay scrollable.
pub const SCROLL_MARGIN: f64 = 200.0;

/// Quiet period after the last resize signal before the mode is re-evaluated.
pub const RESIZE_DEBOUNCE_MS: u64 = 200;

/// Route segment that prefixes every full-screen map route.
pub const ROUTE_PREFIX: &str = "map";

/// Returns the coordinate precision for a zoom level.
pub fn precision_for_zoom(zoom: u8) -> usize {
    let index = (zoom as usize).min(PRECISION_PER_ZOOM.len() - 1);
    PRECISION_PER_ZOOM[index]
}

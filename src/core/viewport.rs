use crate::core::constants::TILE_SIZE;
use crate::core::geo::{LatLng, LatLngBounds, Point, TileCoord};
use serde::{Deserialize, Serialize};

/// Manages the current view of the map: center, zoom, and screen dimensions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// The center of the map view in geographical coordinates
    pub center: LatLng,
    /// The current zoom level
    pub zoom: u8,
    /// The size of the viewport in pixels
    pub size: Point,
    /// The minimum allowed zoom level
    pub min_zoom: u8,
    /// The maximum allowed zoom level
    pub max_zoom: u8,
    tile_size: u32,
}

impl Viewport {
    /// Creates a new viewport
    pub fn new(center: LatLng, zoom: u8, size: Point) -> Self {
        Self {
            center: center.normalized(),
            zoom,
            size,
            min_zoom: 0,
            max_zoom: crate::core::constants::DEFAULT_MAX_ZOOM,
            tile_size: TILE_SIZE,
        }
    }

    pub fn with_tile_size(mut self, tile_size: u32) -> Self {
        self.tile_size = tile_size;
        self
    }

    /// Sets the zoom limits
    pub fn set_zoom_limits(&mut self, min_zoom: u8, max_zoom: u8) {
        self.min_zoom = min_zoom;
        self.max_zoom = max_zoom.max(min_zoom);
        self.zoom = self.zoom.clamp(self.min_zoom, self.max_zoom);
    }

    /// Sets the center, normalized into the world envelope
    pub fn set_center(&mut self, center: LatLng) {
        self.center = center.normalized();
    }

    /// Sets the zoom level, clamping to valid range
    pub fn set_zoom(&mut self, zoom: u8) {
        self.zoom = zoom.clamp(self.min_zoom, self.max_zoom);
    }

    pub fn set_view(&mut self, center: LatLng, zoom: u8) {
        self.set_center(center);
        self.set_zoom(zoom);
    }

    /// Sets the viewport size
    pub fn set_size(&mut self, size: Point) {
        self.size = size;
    }

    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    /// Projects a LatLng to world pixel coordinates at the given zoom level
    pub fn project(&self, lat_lng: &LatLng, zoom: Option<u8>) -> Point {
        lat_lng.project(zoom.unwrap_or(self.zoom), self.tile_size)
    }

    /// Unprojects world pixel coordinates back to LatLng at the given zoom level
    pub fn unproject(&self, pixel: &Point, zoom: Option<u8>) -> LatLng {
        LatLng::unproject(pixel, zoom.unwrap_or(self.zoom), self.tile_size)
    }

    /// Gets the current viewport bounds in geographical coordinates
    pub fn bounds(&self) -> LatLngBounds {
        let center = self.project(&self.center, None);
        let half = Point::new(self.size.x / 2.0, self.size.y / 2.0);

        let nw = self.unproject(&center.subtract(&half), None);
        let se = self.unproject(&center.add(&half), None);

        LatLngBounds::new(LatLng::new(se.lat, nw.lng), LatLng::new(nw.lat, se.lng))
    }

    /// Fits the viewport to contain the given bounds.
    ///
    /// Picks the highest integer zoom at which the bounds fit inside the
    /// padded viewport, never exceeding `max_zoom`. A viewport without area
    /// fits nothing and falls back to `min_zoom`.
    pub fn fit_bounds(&mut self, bounds: &LatLngBounds, padding: f64, max_zoom: Option<u8>) {
        let max_zoom = max_zoom.unwrap_or(self.max_zoom).min(self.max_zoom);
        let available = Point::new(self.size.x - 2.0 * padding, self.size.y - 2.0 * padding);

        let nw_corner = LatLng::new(bounds.north_east.lat, bounds.south_west.lng);
        let se_corner = LatLng::new(bounds.south_west.lat, bounds.north_east.lng);

        let mut best_zoom = self.min_zoom;
        for zoom in self.min_zoom..=max_zoom {
            let nw = self.project(&nw_corner, Some(zoom));
            let se = self.project(&se_corner, Some(zoom));

            let width = (se.x - nw.x).abs();
            let height = (se.y - nw.y).abs();

            if width <= available.x && height <= available.y {
                best_zoom = zoom;
            } else {
                break;
            }
        }

        // Center in projected space so Mercator stretching does not skew it
        let nw = self.project(&nw_corner, Some(best_zoom));
        let se = self.project(&se_corner, Some(best_zoom));
        let middle = nw.add(&se).multiply(0.5);
        let center = self.unproject(&middle, Some(best_zoom));

        self.set_view(center, best_zoom);
    }

    /// Fits the whole world into the viewport
    pub fn fit_world(&mut self, padding: f64) {
        self.fit_bounds(&LatLngBounds::world(), padding, None);
    }

    /// Tiles covering the visible area at the current zoom
    pub fn visible_tiles(&self) -> Vec<TileCoord> {
        if !self.size.has_area() {
            return Vec::new();
        }

        let bounds = self.bounds();
        let nw = TileCoord::from_lat_lng(
            &LatLng::new(bounds.north_east.lat, bounds.south_west.lng),
            self.zoom,
        );
        let se = TileCoord::from_lat_lng(
            &LatLng::new(bounds.south_west.lat, bounds.north_east.lng),
            self.zoom,
        );

        let mut tiles = Vec::new();
        for y in nw.y..=se.y {
            for x in nw.x..=se.x {
                tiles.push(TileCoord::new(x, y, self.zoom));
            }
        }
        tiles
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(LatLng::new(0.0, 0.0), 0, Point::new(800.0, 600.0))
    }
}

//! Center/zoom ownership for a single map.
//!
//! [`ViewStateController`] places the view either directly (center known) or
//! by auto-fitting to the map's layers, remembers the first resolved position
//! and renders the route hash suffix used by full-screen maps.

use crate::core::config::MapConfig;
use crate::core::constants::precision_for_zoom;
use crate::core::geo::{LatLng, Point};
use crate::core::viewport::Viewport;
use crate::layers::descriptor::RenderableLayer;
use crate::spatial::fitting::BoundsFitter;
use serde::{Deserialize, Serialize};

/// A resolved center/zoom pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewPosition {
    pub center: LatLng,
    pub zoom: u8,
}

impl ViewPosition {
    pub fn new(center: LatLng, zoom: u8) -> Self {
        Self {
            center: center.normalized(),
            zoom,
        }
    }

    /// `zoom/lat/lng` with coordinates rounded for the zoom level
    pub fn hash_segment(&self) -> String {
        let precision = precision_for_zoom(self.zoom);
        let center = self.center.normalized();
        format!(
            "{}/{:.*}/{:.*}",
            self.zoom,
            precision,
            round_to(center.lat, precision),
            precision,
            round_to(center.lng, precision)
        )
    }
}

/// Rounds to `decimals` places. Values rounding to zero come out as `0.0`,
/// never `-0.0`, so both sides of the equator format alike.
fn round_to(value: f64, decimals: usize) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    let rounded = (value * factor).round() / factor;
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

/// A possibly incomplete view request.
///
/// Entries that are non-finite (or out of zoom range) count as absent.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ViewRequest {
    pub center: Option<[f64; 2]>,
    pub zoom: Option<f64>,
}

impl ViewRequest {
    pub fn new(center: Option<[f64; 2]>, zoom: Option<f64>) -> Self {
        Self { center, zoom }
    }

    /// Request to auto-fit the view to the map's content
    pub fn fit() -> Self {
        Self::default()
    }

    pub fn at(position: ViewPosition) -> Self {
        Self {
            center: Some([position.center.lat, position.center.lng]),
            zoom: Some(position.zoom as f64),
        }
    }

    pub fn center(&self) -> Option<LatLng> {
        self.center.and_then(LatLng::from_pair)
    }

    pub fn zoom(&self) -> Option<u8> {
        self.zoom
            .filter(|zoom| zoom.is_finite() && *zoom >= 0.0 && *zoom <= u8::MAX as f64)
            .map(|zoom| zoom.round() as u8)
    }
}

/// Size and visibility of the drawing surface when the view is placed
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceMetrics {
    pub size: Point,
    pub visible: bool,
}

impl SurfaceMetrics {
    pub fn new(size: Point, visible: bool) -> Self {
        Self { size, visible }
    }

    /// Whether the surface is laid out and shown
    pub fn is_rendered(&self) -> bool {
        self.visible && self.size.has_area()
    }
}

/// Owns the view of one map instance
#[derive(Debug, Clone)]
pub struct ViewStateController {
    viewport: Viewport,
    initial_position: Option<ViewPosition>,
    observed_position: Option<ViewPosition>,
    fallback_zoom: u8,
    fit_padding: f64,
}

impl ViewStateController {
    pub fn new(config: &MapConfig) -> Self {
        let mut viewport = Viewport::new(LatLng::default(), 0, Point::default())
            .with_tile_size(config.tile_size);
        viewport.set_zoom_limits(0, config.max_zoom);

        Self {
            viewport,
            initial_position: None,
            observed_position: None,
            fallback_zoom: config.fallback_zoom.min(config.max_zoom),
            fit_padding: config.fit_padding,
        }
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// The current center/zoom
    pub fn position(&self) -> ViewPosition {
        ViewPosition::new(self.viewport.center, self.viewport.zoom)
    }

    pub fn initial_position(&self) -> Option<ViewPosition> {
        self.initial_position
    }

    /// Position last written for downstream consumers by a persisting `set_view`
    pub fn observed_position(&self) -> Option<ViewPosition> {
        self.observed_position
    }

    /// Remembers the starting position and optionally applies it.
    ///
    /// The stored initial position holds whatever part of the request was
    /// valid; a missing center is filled in by the first persisting
    /// `set_view`.
    pub fn init_view<'a, I>(
        &mut self,
        request: ViewRequest,
        apply: bool,
        layers: I,
        surface: SurfaceMetrics,
    ) -> ViewPosition
    where
        I: IntoIterator<Item = &'a RenderableLayer>,
    {
        if let Some(center) = request.center() {
            let zoom = request.zoom().unwrap_or(self.fallback_zoom);
            self.initial_position = Some(ViewPosition::new(center, zoom));
        }

        if apply {
            self.set_view(request, layers, surface, true)
        } else {
            self.position()
        }
    }

    /// Places the view.
    ///
    /// With a valid center the view goes there directly. Without one the view
    /// is fitted to the valid bounds of `layers` (or the world when there are
    /// none) and a requested zoom is applied on top. The call is a pure
    /// function of its inputs, so repeating it is harmless.
    pub fn set_view<'a, I>(
        &mut self,
        request: ViewRequest,
        layers: I,
        surface: SurfaceMetrics,
        persist: bool,
    ) -> ViewPosition
    where
        I: IntoIterator<Item = &'a RenderableLayer>,
    {
        self.viewport.set_size(surface.size);

        match request.center() {
            Some(center) => {
                let zoom = request.zoom().unwrap_or(self.fallback_zoom);
                self.viewport.set_view(center, zoom);
            }
            None => {
                match BoundsFitter::fit_layers(layers) {
                    Some(bounds) if bounds.is_point() => {
                        self.viewport.set_view(bounds.center(), self.fallback_zoom);
                    }
                    Some(bounds) => {
                        self.viewport.fit_bounds(&bounds, self.fit_padding, None);
                    }
                    None => self.viewport.fit_world(0.0),
                }

                if let Some(zoom) = request.zoom() {
                    self.viewport.set_zoom(zoom);
                }
            }
        }

        let position = self.position();

        if persist {
            if surface.is_rendered() {
                self.initial_position = Some(position);
                self.observed_position = Some(position);
            } else {
                log::debug!("container has no visible size, view position not persisted");
            }
        }

        position
    }

    /// Route for this view: the prefix, plus `/zoom/lat/lng` when the view
    /// has moved away from its initial position at the current precision.
    pub fn get_hash(&self, route_prefix: &str) -> String {
        let initial = match self.initial_position {
            Some(initial) => initial,
            None => return route_prefix.to_string(),
        };

        let current = self.position().hash_segment();
        if current == initial.hash_segment() {
            route_prefix.to_string()
        } else {
            format!("{}/{}", route_prefix, current)
        }
    }
}

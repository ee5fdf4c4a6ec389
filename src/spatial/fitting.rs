//! Auto-fit bounds over heterogeneous layers.
//!
//! Hand-authored data regularly contains geometry that sits partly outside
//! the world envelope. Such geometry is dropped from the fit instead of
//! dragging the view to an absurd zoom. Polygons whose outer ring covers the
//! world and whose holes mark the area of interest ("masks") are fitted to
//! their holes.

use crate::core::geo::LatLngBounds;
use crate::layers::descriptor::RenderableLayer;
use geo::BoundingRect;
use geo_types::{Geometry, Polygon};

pub struct BoundsFitter;

impl BoundsFitter {
    /// Valid bounds of one layer, or `None` when nothing in it is valid
    pub fn compute_valid_bounds(layer: &RenderableLayer) -> Option<LatLngBounds> {
        match layer {
            RenderableLayer::Shape(geometry) => Self::geometry_bounds(geometry),
            RenderableLayer::Group(children) => Self::fit_layers(children),
        }
    }

    /// Union of the valid bounds of every layer
    pub fn fit_layers<'a, I>(layers: I) -> Option<LatLngBounds>
    where
        I: IntoIterator<Item = &'a RenderableLayer>,
    {
        layers
            .into_iter()
            .filter_map(Self::compute_valid_bounds)
            .reduce(|acc, bounds| acc.union(&bounds))
    }

    fn geometry_bounds(geometry: &Geometry<f64>) -> Option<LatLngBounds> {
        match geometry {
            Geometry::Polygon(polygon) => Self::polygon_bounds(polygon),
            Geometry::MultiPolygon(multi) => multi
                .0
                .iter()
                .filter_map(Self::polygon_bounds)
                .reduce(|acc, bounds| acc.union(&bounds)),
            Geometry::GeometryCollection(collection) => collection
                .0
                .iter()
                .filter_map(Self::geometry_bounds)
                .reduce(|acc, bounds| acc.union(&bounds)),
            other => other
                .bounding_rect()
                .map(|rect| LatLngBounds::from_rect(&rect))
                .filter(LatLngBounds::is_within_world),
        }
    }

    fn polygon_bounds(polygon: &Polygon<f64>) -> Option<LatLngBounds> {
        let outer = polygon
            .bounding_rect()
            .map(|rect| LatLngBounds::from_rect(&rect));

        if let Some(bounds) = outer.filter(LatLngBounds::is_within_world) {
            return Some(bounds);
        }

        // Mask: skip the outer ring and fit to the holes
        polygon
            .interiors()
            .iter()
            .filter_map(|ring| ring.bounding_rect())
            .map(|rect| LatLngBounds::from_rect(&rect))
            .reduce(|acc, bounds| acc.union(&bounds))
            .filter(LatLngBounds::is_within_world)
    }
}

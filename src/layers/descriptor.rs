use geo::BoundingRect;
use geo_types::{Geometry, Rect};
use serde::{Deserialize, Serialize};

/// Drawable content of a data group.
///
/// A `Shape` is one geometry the renderer draws as a unit; a `Group` mirrors a
/// feature collection (or a multi-polygon) whose members are validated on
/// their own when fitting bounds.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderableLayer {
    Shape(Geometry<f64>),
    Group(Vec<RenderableLayer>),
}

impl RenderableLayer {
    pub fn empty() -> Self {
        RenderableLayer::Group(Vec::new())
    }

    /// True when there is nothing to draw
    pub fn is_empty(&self) -> bool {
        match self {
            RenderableLayer::Shape(_) => false,
            RenderableLayer::Group(children) => children.iter().all(RenderableLayer::is_empty),
        }
    }

    /// Number of shapes in the tree
    pub fn shape_count(&self) -> usize {
        match self {
            RenderableLayer::Shape(_) => 1,
            RenderableLayer::Group(children) => children.iter().map(Self::shape_count).sum(),
        }
    }

    /// Raw bounding box of everything in the tree, valid or not
    pub fn bounding_rect(&self) -> Option<Rect<f64>> {
        match self {
            RenderableLayer::Shape(geometry) => geometry.bounding_rect(),
            RenderableLayer::Group(children) => children
                .iter()
                .filter_map(Self::bounding_rect)
                .reduce(|acc, rect| {
                    Rect::new(
                        geo_types::coord! {
                            x: acc.min().x.min(rect.min().x),
                            y: acc.min().y.min(rect.min().y),
                        },
                        geo_types::coord! {
                            x: acc.max().x.max(rect.max().x),
                            y: acc.max().y.max(rect.max().y),
                        },
                    )
                }),
        }
    }
}

/// Per-layer options supplied alongside the geometry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayerOptions {
    pub attribution: String,
    pub is_external: bool,
}

/// A resolved, renderable data group. Never mutated once created.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerDescriptor {
    pub group_id: String,
    pub geometry: RenderableLayer,
    pub attribution: String,
    pub is_external: bool,
}

impl LayerDescriptor {
    pub fn new(group_id: impl Into<String>, geometry: RenderableLayer, options: LayerOptions) -> Self {
        Self {
            group_id: group_id.into(),
            geometry,
            attribution: options.attribution,
            is_external: options.is_external,
        }
    }

    /// Name shown in layer listings; external sources go by their attribution
    pub fn display_name(&self) -> &str {
        if self.is_external && !self.attribution.is_empty() {
            &self.attribution
        } else {
            &self.group_id
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::point;

    #[test]
    fn test_empty_groups() {
        assert!(RenderableLayer::empty().is_empty());
        assert!(RenderableLayer::Group(vec![RenderableLayer::empty()]).is_empty());

        let shape = RenderableLayer::Shape(Geometry::Point(point!(x: 1.0, y: 2.0)));
        assert!(!shape.is_empty());
        assert_eq!(RenderableLayer::Group(vec![shape.clone(), shape]).shape_count(), 2);
    }

    #[test]
    fn test_display_name() {
        let internal = LayerDescriptor::new(
            "trail",
            RenderableLayer::empty(),
            LayerOptions {
                attribution: "Trail data".to_string(),
                is_external: false,
            },
        );
        assert_eq!(internal.display_name(), "trail");

        let external = LayerDescriptor::new(
            "ext-1",
            RenderableLayer::empty(),
            LayerOptions {
                attribution: "OpenStreetMap contributors".to_string(),
                is_external: true,
            },
        );
        assert_eq!(external.display_name(), "OpenStreetMap contributors");
    }

    #[test]
    fn test_group_bounding_rect() {
        let layer = RenderableLayer::Group(vec![
            RenderableLayer::Shape(Geometry::Point(point!(x: 1.0, y: 2.0))),
            RenderableLayer::Shape(Geometry::Point(point!(x: -3.0, y: 5.0))),
        ]);
        let rect = layer.bounding_rect().unwrap();
        assert_eq!(rect.min().x, -3.0);
        assert_eq!(rect.max().y, 5.0);
    }
}

use crate::layers::descriptor::RenderableLayer;
use crate::{MapError, Result};
use geo_types::{Coord, Geometry, LineString, MultiLineString, MultiPoint, Point, Polygon};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use std::collections::HashMap;

/// A GeoJSON position: `[longitude, latitude, ...]`
pub type Position = Vec<f64>;

/// GeoJSON geometry types
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type")]
pub enum GeoJsonGeometry {
    Point {
        coordinates: Position,
    },
    LineString {
        coordinates: Vec<Position>,
    },
    Polygon {
        coordinates: Vec<Vec<Position>>,
    },
    MultiPoint {
        coordinates: Vec<Position>,
    },
    MultiLineString {
        coordinates: Vec<Vec<Position>>,
    },
    MultiPolygon {
        coordinates: Vec<Vec<Vec<Position>>>,
    },
    GeometryCollection {
        geometries: Vec<GeoJsonGeometry>,
    },
}

/// GeoJSON feature with geometry and properties
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct GeoJsonFeature {
    #[serde(default)]
    pub id: Option<serde_json::Value>,
    #[serde(default)]
    pub geometry: Option<GeoJsonGeometry>,
    #[serde(default)]
    pub properties: Option<HashMap<String, serde_json::Value>>,
}

/// Root GeoJSON object
#[derive(Debug, Clone, PartialEq)]
pub enum GeoJson {
    Feature(GeoJsonFeature),
    FeatureCollection { features: Vec<GeoJsonFeature> },
    Geometry(GeoJsonGeometry),
}

#[derive(Deserialize)]
struct FeatureCollectionBody {
    #[serde(default)]
    features: Vec<GeoJsonFeature>,
}

impl<'de> Deserialize<'de> for GeoJson {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = serde_json::Value::deserialize(deserializer)?;
        let kind = value
            .get("type")
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| D::Error::missing_field("type"))?
            .to_string();

        let parsed = match kind.as_str() {
            "Feature" => serde_json::from_value(value).map(GeoJson::Feature),
            "FeatureCollection" => serde_json::from_value::<FeatureCollectionBody>(value)
                .map(|body| GeoJson::FeatureCollection {
                    features: body.features,
                }),
            _ => serde_json::from_value(value).map(GeoJson::Geometry),
        };

        parsed.map_err(D::Error::custom)
    }
}

impl GeoJson {
    /// Parses GeoJSON from a raw JSON string
    pub fn from_str(geojson_str: &str) -> Result<Self> {
        serde_json::from_str(geojson_str)
            .map_err(|e| MapError::ParseError(format!("Invalid GeoJSON: {}", e)))
    }

    /// An empty feature collection
    pub fn empty() -> Self {
        GeoJson::FeatureCollection {
            features: Vec::new(),
        }
    }

    /// True when the object carries no geometry at all
    pub fn is_empty(&self) -> bool {
        match self {
            GeoJson::Feature(feature) => feature.geometry.is_none(),
            GeoJson::FeatureCollection { features } => {
                features.iter().all(|feature| feature.geometry.is_none())
            }
            GeoJson::Geometry(GeoJsonGeometry::GeometryCollection { geometries }) => {
                geometries.is_empty()
            }
            GeoJson::Geometry(_) => false,
        }
    }

    /// Converts into a renderable layer tree.
    ///
    /// Fails with [`MapError::Render`] on malformed geometry: non-finite or
    /// short positions, lines with fewer than two positions, polygon rings
    /// with fewer than four.
    pub fn to_renderable(&self) -> Result<RenderableLayer> {
        match self {
            GeoJson::Feature(feature) => feature.to_renderable(),
            GeoJson::FeatureCollection { features } => features
                .iter()
                .map(GeoJsonFeature::to_renderable)
                .collect::<Result<Vec<_>>>()
                .map(RenderableLayer::Group),
            GeoJson::Geometry(geometry) => geometry.to_renderable(),
        }
    }
}

impl GeoJsonFeature {
    pub fn from_geometry(geometry: GeoJsonGeometry) -> Self {
        Self {
            geometry: Some(geometry),
            ..Default::default()
        }
    }

    fn to_renderable(&self) -> Result<RenderableLayer> {
        match &self.geometry {
            Some(geometry) => geometry.to_renderable(),
            None => Ok(RenderableLayer::empty()),
        }
    }
}

impl GeoJsonGeometry {
    fn to_renderable(&self) -> Result<RenderableLayer> {
        let shape = |geometry: Geometry<f64>| -> Result<RenderableLayer> {
            Ok(RenderableLayer::Shape(geometry))
        };

        match self {
            GeoJsonGeometry::Point { coordinates } => shape(Point(to_coord(coordinates)?).into()),
            GeoJsonGeometry::LineString { coordinates } => shape(to_line(coordinates)?.into()),
            GeoJsonGeometry::Polygon { coordinates } => shape(to_polygon(coordinates)?.into()),
            GeoJsonGeometry::MultiPoint { coordinates } => {
                let points = coordinates
                    .iter()
                    .map(|position| to_coord(position).map(Point))
                    .collect::<Result<Vec<_>>>()?;
                shape(MultiPoint(points).into())
            }
            GeoJsonGeometry::MultiLineString { coordinates } => {
                let lines = coordinates
                    .iter()
                    .map(|line| to_line(line))
                    .collect::<Result<Vec<_>>>()?;
                shape(MultiLineString(lines).into())
            }
            // Each member polygon is fitted and masked on its own
            GeoJsonGeometry::MultiPolygon { coordinates } => coordinates
                .iter()
                .map(|rings| to_polygon(rings).map(|p| RenderableLayer::Shape(p.into())))
                .collect::<Result<Vec<_>>>()
                .map(RenderableLayer::Group),
            GeoJsonGeometry::GeometryCollection { geometries } => geometries
                .iter()
                .map(GeoJsonGeometry::to_renderable)
                .collect::<Result<Vec<_>>>()
                .map(RenderableLayer::Group),
        }
    }
}

fn to_coord(position: &[f64]) -> Result<Coord<f64>> {
    match position {
        [lng, lat, ..] if lng.is_finite() && lat.is_finite() => Ok(Coord { x: *lng, y: *lat }),
        [_, _, ..] => Err(MapError::Render(format!(
            "non-finite position {:?}",
            position
        ))),
        _ => Err(MapError::Render(format!(
            "position needs two values, got {}",
            position.len()
        ))),
    }
}

fn to_line(positions: &[Position]) -> Result<LineString<f64>> {
    if positions.len() < 2 {
        return Err(MapError::Render(format!(
            "line needs at least 2 positions, got {}",
            positions.len()
        )));
    }
    positions
        .iter()
        .map(|position| to_coord(position))
        .collect::<Result<Vec<_>>>()
        .map(LineString::new)
}

fn to_ring(positions: &[Position]) -> Result<LineString<f64>> {
    if positions.len() < 4 {
        return Err(MapError::Render(format!(
            "polygon ring needs at least 4 positions, got {}",
            positions.len()
        )));
    }
    to_line(positions)
}

fn to_polygon(rings: &[Vec<Position>]) -> Result<Polygon<f64>> {
    let (exterior, interiors) = rings
        .split_first()
        .ok_or_else(|| MapError::Render("polygon without rings".to_string()))?;

    let exterior = to_ring(exterior)?;
    let interiors = interiors
        .iter()
        .map(|ring| to_ring(ring))
        .collect::<Result<Vec<_>>>()?;

    Ok(Polygon::new(exterior, interiors))
}

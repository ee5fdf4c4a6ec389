use crate::core::constants::ROUTE_PREFIX;
use crate::core::geo::LatLng;
use crate::core::view_state::ViewPosition;
use crate::{MapError, Result};
use std::fmt;
use std::str::FromStr;

/// Longest accepted fractional part of a route coordinate
const MAX_COORDINATE_DECIMALS: usize = 5;

/// A parsed `map/<index>(/<zoom>)(/<lat>/<lng>)` route
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapRoute {
    pub index: usize,
    /// Requested view. `None` means the map's remembered initial position.
    pub position: Option<ViewPosition>,
}

impl MapRoute {
    pub fn new(index: usize, position: Option<ViewPosition>) -> Self {
        Self { index, position }
    }

    /// Parses a route. Returns `None` for routes that do not address a map.
    ///
    /// Leading `#` and `/` are ignored. A zoom without coordinates is accepted
    /// and dropped.
    pub fn parse(route: &str) -> Option<Self> {
        let trimmed = route.trim_start_matches('#').trim_start_matches('/');
        let mut segments = trimmed.split('/');

        if segments.next()? != ROUTE_PREFIX {
            return None;
        }
        let index = parse_digits(segments.next()?)?;
        let rest: Vec<&str> = segments.collect();

        let position = match rest.as_slice() {
            [] => None,
            [zoom] => {
                parse_digits::<u8>(zoom)?;
                None
            }
            [zoom, lat, lng] => {
                let zoom = parse_digits(zoom)?;
                let lat = parse_coordinate(lat)?;
                let lng = parse_coordinate(lng)?;
                Some(ViewPosition::new(LatLng::new(lat, lng), zoom))
            }
            _ => return None,
        };

        Some(Self { index, position })
    }

    /// Whether a route addresses a map at all
    pub fn is_map_route(route: &str) -> bool {
        Self::parse(route).is_some()
    }
}

impl FromStr for MapRoute {
    type Err = MapError;

    fn from_str(route: &str) -> Result<Self> {
        Self::parse(route).ok_or_else(|| MapError::ParseError(format!("not a map route: {}", route)))
    }
}

impl fmt::Display for MapRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}/{}", ROUTE_PREFIX, self.index)?;
        if let Some(position) = &self.position {
            write!(f, "/{}", position.hash_segment())?;
        }
        Ok(())
    }
}

fn parse_digits<T: FromStr>(segment: &str) -> Option<T> {
    if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    segment.parse().ok()
}

fn parse_coordinate(segment: &str) -> Option<f64> {
    let unsigned = segment.strip_prefix('-').unwrap_or(segment);
    let (whole, fraction) = match unsigned.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (unsigned, None),
    };

    if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if let Some(fraction) = fraction {
        if fraction.is_empty()
            || fraction.len() > MAX_COORDINATE_DECIMALS
            || !fraction.bytes().all(|b| b.is_ascii_digit())
        {
            return None;
        }
    }

    segment.parse().ok()
}

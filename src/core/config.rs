//! Configuration for map construction and behavior tuning
//!
//! The host reads one [`MapConfig`] for its whole lifetime. It can be built in
//! code, loaded from the JSON blob the document collaborator exposes, or taken
//! from one of the presets.

use crate::core::constants::{
    DEFAULT_FALLBACK_ZOOM, DEFAULT_FIT_PADDING, DEFAULT_MAX_ZOOM, MIN_INTERACTIVE_VIEWPORT_WIDTH,
    RESIZE_DEBOUNCE_MS, SCROLL_MARGIN, TILE_SIZE,
};
use crate::{MapError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MapConfig {
    /// Base URL of the tile server. Required.
    pub tile_server: Option<String>,
    /// Style used when the map options do not name one
    pub default_style: String,
    pub tile_size: u32,
    pub fallback_zoom: u8,
    pub max_zoom: u8,
    pub fit_padding: f64,
    /// Number of resolved data groups kept across maps
    pub cache_capacity: usize,
    pub responsive: ResponsiveConfig,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            tile_server: None,
            default_style: "osm-intl".to_string(),
            tile_size: TILE_SIZE,
            fallback_zoom: DEFAULT_FALLBACK_ZOOM,
            max_zoom: DEFAULT_MAX_ZOOM,
            fit_padding: DEFAULT_FIT_PADDING,
            cache_capacity: 256,
            responsive: ResponsiveConfig::default(),
        }
    }
}

impl MapConfig {
    /// Config with the given tile server and defaults everywhere else
    pub fn with_tile_server(url: impl Into<String>) -> Self {
        Self {
            tile_server: Some(url.into()),
            ..Default::default()
        }
    }

    /// Parses a config from its JSON representation and validates it
    pub fn from_json(json: &str) -> Result<Self> {
        let config: MapConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Small cache and no debounce delay, for deterministic tests
    pub fn for_testing() -> Self {
        Self {
            tile_server: Some("https://tiles.test/".to_string()),
            cache_capacity: 16,
            responsive: ResponsiveConfig {
                debounce_ms: 0,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Ensures the settings a map cannot be built without are present
    pub fn validate(&self) -> Result<()> {
        match self.tile_server.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => {}
            _ => {
                log::error!("map tile server endpoint is not configured");
                return Err(MapError::Config(
                    "tile server endpoint is missing".to_string(),
                ));
            }
        }

        if self.fallback_zoom > self.max_zoom {
            return Err(MapError::Config(format!(
                "fallback zoom {} exceeds max zoom {}",
                self.fallback_zoom, self.max_zoom
            )));
        }

        if self.tile_size == 0 {
            return Err(MapError::Config("tile size must be positive".to_string()));
        }

        Ok(())
    }

    /// The validated tile server URL without a trailing slash
    pub fn tile_server(&self) -> Result<&str> {
        self.tile_server
            .as_deref()
            .map(|url| url.trim().trim_end_matches('/'))
            .filter(|url| !url.is_empty())
            .ok_or_else(|| MapError::Config("tile server endpoint is missing".to_string()))
    }
}

/// Thresholds driving the static/interactive decision
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ResponsiveConfig {
    pub min_interactive_width: f64,
    pub scroll_margin: f64,
    pub debounce_ms: u64,
}

impl ResponsiveConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl Default for ResponsiveConfig {
    fn default() -> Self {
        Self {
            min_interactive_width: MIN_INTERACTIVE_VIEWPORT_WIDTH,
            scroll_margin: SCROLL_MARGIN,
            debounce_ms: RESIZE_DEBOUNCE_MS,
        }
    }
}

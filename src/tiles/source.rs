use crate::core::config::MapConfig;
use crate::core::geo::TileCoord;
use crate::Result;

/// Trait representing anything that can produce tile URLs for a given coordinate.
pub trait TileSource {
    /// Build a URL for the requested `coord`.
    fn url(&self, coord: TileCoord) -> String;
}

/// Styled raster tiles from the configured tile server:
/// `{server}/{style}/{z}/{x}/{y}.png`, with an optional `?lang=` suffix.
#[derive(Debug, Clone, PartialEq)]
pub struct StyledTileSource {
    server: String,
    style: String,
    lang: Option<String>,
}

impl StyledTileSource {
    /// Fails with a configuration error when no tile server is configured
    pub fn from_config(config: &MapConfig, style: Option<&str>, lang: Option<&str>) -> Result<Self> {
        let server = config.tile_server()?.to_string();
        let style = style
            .filter(|style| !style.trim().is_empty())
            .unwrap_or(&config.default_style)
            .to_string();

        Ok(Self {
            server,
            style,
            lang: lang.filter(|lang| !lang.is_empty()).map(str::to_string),
        })
    }

    pub fn style(&self) -> &str {
        &self.style
    }
}

impl TileSource for StyledTileSource {
    fn url(&self, coord: TileCoord) -> String {
        let base = format!(
            "{}/{}/{}/{}/{}.png",
            self.server, self.style, coord.z, coord.x, coord.y
        );
        match &self.lang {
            Some(lang) => format!("{}?lang={}", base, lang),
            None => base,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MapError;

    #[test]
    fn test_styled_urls() {
        let config = MapConfig::for_testing();
        let source = StyledTileSource::from_config(&config, Some("osm"), Some("de")).unwrap();
        assert_eq!(
            source.url(TileCoord::new(1, 2, 3)),
            "https://tiles.test/osm/3/1/2.png?lang=de"
        );

        let source = StyledTileSource::from_config(&config, None, None).unwrap();
        assert_eq!(source.style(), config.default_style);
        assert!(!source.url(TileCoord::new(0, 0, 0)).contains("lang"));
    }

    #[test]
    fn test_missing_server_fails() {
        let config = MapConfig::default();
        assert!(matches!(
            StyledTileSource::from_config(&config, None, None),
            Err(MapError::Config(_))
        ));
    }
}

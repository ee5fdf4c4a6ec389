//! Boundary to the service that fetches named data groups.
//!
//! Fetching and caching over the network live outside this crate; the store
//! only sees resolved groups. Implementations report "not found" as an empty
//! result rather than an error.

use crate::data::geojson::GeoJson;
use async_trait::async_trait;

/// One resolved data group as delivered by the loader
#[derive(Debug, Clone, PartialEq)]
pub struct GroupData {
    pub id: String,
    pub geometry: GeoJson,
    pub attribution: String,
    pub is_external: bool,
}

impl GroupData {
    pub fn new(id: impl Into<String>, geometry: GeoJson) -> Self {
        Self {
            id: id.into(),
            geometry,
            attribution: String::new(),
            is_external: false,
        }
    }

    pub fn with_attribution(mut self, attribution: impl Into<String>) -> Self {
        self.attribution = attribution.into();
        self
    }

    pub fn external(mut self) -> Self {
        self.is_external = true;
        self
    }
}

/// Loads data groups for maps.
///
/// Futures run on the page's single execution queue and are not `Send`.
#[async_trait(?Send)]
pub trait DataLoader {
    /// Resolves the named groups. Unknown ids are simply missing from the result.
    async fn load_groups(&self, ids: &[String]) -> anyhow::Result<Vec<GroupData>>;

    /// Resolves caller-supplied data, e.g. inline GeoJSON referencing external sources
    async fn load_inline(&self, data: &GeoJson) -> anyhow::Result<Vec<GroupData>>;
}

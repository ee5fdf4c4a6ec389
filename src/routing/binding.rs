use crate::core::map::MapId;

/// Append-only index of maps that can be opened by route.
///
/// Indexes are never reused while the content lives; [`RouteBinding::clear`]
/// drops them all when the document content is replaced.
#[derive(Debug, Clone, Default)]
pub struct RouteBinding {
    maps: Vec<MapId>,
}

impl RouteBinding {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a map and returns its index. Registering twice keeps the first index.
    pub fn register(&mut self, map: MapId) -> usize {
        if let Some(index) = self.index_of(map) {
            return index;
        }
        self.maps.push(map);
        self.maps.len() - 1
    }

    pub fn resolve(&self, index: usize) -> Option<MapId> {
        self.maps.get(index).copied()
    }

    pub fn index_of(&self, map: MapId) -> Option<usize> {
        self.maps.iter().position(|candidate| *candidate == map)
    }

    pub fn len(&self) -> usize {
        self.maps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.maps.is_empty()
    }

    pub fn clear(&mut self) {
        self.maps.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indexes_are_appended() {
        let mut binding = RouteBinding::new();
        assert_eq!(binding.register(MapId::new(7)), 0);
        assert_eq!(binding.register(MapId::new(3)), 1);
        assert_eq!(binding.register(MapId::new(7)), 0);

        assert_eq!(binding.resolve(1), Some(MapId::new(3)));
        assert_eq!(binding.resolve(2), None);
        assert_eq!(binding.len(), 2);
    }

    #[test]
    fn test_clear_starts_over() {
        let mut binding = RouteBinding::new();
        binding.register(MapId::new(1));
        binding.clear();
        assert!(binding.is_empty());
        assert_eq!(binding.register(MapId::new(2)), 0);
    }
}

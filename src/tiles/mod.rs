pub mod source;

pub use source::{StyledTileSource, TileSource};

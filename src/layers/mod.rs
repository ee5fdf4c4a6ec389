pub mod descriptor;
pub mod loader;
pub mod store;

pub use descriptor::{LayerDescriptor, LayerOptions, RenderableLayer};
pub use loader::{DataLoader, GroupData};
pub use store::DataLayerStore;

pub mod events;

pub use events::{EventCallback, EventManager, MapEvent};

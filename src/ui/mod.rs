pub mod fullscreen;
pub mod responsive;

pub use fullscreen::{FullScreenController, FullScreenState, Presentation, PresentationLoader};
pub use responsive::{Debouncer, InteractionStrategy, ResponsiveModeController};

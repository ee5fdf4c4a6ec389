//! Full-screen dialog lifecycle.
//!
//! Each full-screen target (the child of a `mapframe`, or a `maplink`
//! itself) carries a [`FullScreenController`]. The host drives it from user
//! actions and router dispatches; the dialog itself is a [`Presentation`]
//! whose module is loaded asynchronously on first use.

use crate::core::map::MapInstance;
use async_trait::async_trait;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FullScreenState {
    #[default]
    Closed,
    Opening,
    Open,
    Closing,
}

/// Outcome of an open request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenDecision {
    Proceed,
    /// The target is being closed by the router; drop the request
    Abort,
}

#[derive(Debug, Clone, Default)]
pub struct FullScreenController {
    state: FullScreenState,
}

impl FullScreenController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> FullScreenState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == FullScreenState::Open
    }

    /// True while opening or open
    pub fn is_active(&self) -> bool {
        matches!(self.state, FullScreenState::Opening | FullScreenState::Open)
    }

    pub fn begin_open(&mut self) -> OpenDecision {
        match self.state {
            FullScreenState::Closing => {
                log::debug!("full screen open dropped, target is closing");
                self.state = FullScreenState::Closed;
                OpenDecision::Abort
            }
            _ => {
                self.state = FullScreenState::Opening;
                OpenDecision::Proceed
            }
        }
    }

    /// Completes an open. Returns false if a close arrived in the meantime.
    pub fn finish_open(&mut self) -> bool {
        match self.state {
            FullScreenState::Opening | FullScreenState::Open => {
                self.state = FullScreenState::Open;
                true
            }
            FullScreenState::Closing | FullScreenState::Closed => {
                self.state = FullScreenState::Closed;
                false
            }
        }
    }

    /// Starts closing. Returns true when the dialog is currently shown and
    /// must be torn down by the caller.
    ///
    /// A router-driven close of a pending open leaves the target in
    /// `Closing`, which makes the pending open abort.
    pub fn begin_close(&mut self, from_router: bool) -> bool {
        match self.state {
            FullScreenState::Open => {
                self.state = FullScreenState::Closing;
                true
            }
            FullScreenState::Opening if from_router => {
                self.state = FullScreenState::Closing;
                false
            }
            FullScreenState::Opening => {
                self.state = FullScreenState::Closed;
                false
            }
            FullScreenState::Closing | FullScreenState::Closed => false,
        }
    }

    pub fn finish_close(&mut self) {
        self.state = FullScreenState::Closed;
    }
}

/// The full-screen dialog surface
pub trait Presentation {
    /// Renders the map into the dialog and shows it
    fn show(&mut self, map: &MapInstance);

    /// Tears the dialog down; the map instance stays alive
    fn close(&mut self);
}

/// Loads the dialog module
#[async_trait(?Send)]
pub trait PresentationLoader {
    async fn load(&self) -> anyhow::Result<Box<dyn Presentation>>;
}

//! Static/interactive mode selection.
//!
//! Embedded maps must not hijack page scrolling, so narrow viewports and maps
//! spanning (almost) the whole page width are rendered statically and need an
//! explicit click before they pan or zoom. Resize signals are debounced; only
//! the last signal in a burst is evaluated.

use crate::core::config::ResponsiveConfig;
use crate::core::map::{InteractionFlags, Mode};
use instant::Instant;
use std::time::Duration;

/// Last-write-wins timer: every signal pushes the deadline out again
#[derive(Debug, Clone)]
pub struct Debouncer {
    quiet_period: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    pub fn new(quiet_period: Duration) -> Self {
        Self {
            quiet_period,
            deadline: None,
        }
    }

    /// Cancels any pending deadline and starts a new one
    pub fn signal(&mut self, now: Instant) {
        self.deadline = Some(now + self.quiet_period);
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Returns true once when the quiet period has elapsed
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

impl Mode {
    /// Interaction handlers matching the mode
    pub fn flags(self) -> InteractionFlags {
        match self {
            Mode::Static => InteractionFlags {
                dragging: false,
                scroll_wheel_zoom: false,
                sleep: true,
            },
            Mode::Interactive => InteractionFlags {
                dragging: true,
                scroll_wheel_zoom: true,
                sleep: false,
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResponsiveModeController {
    config: ResponsiveConfig,
    mode: Option<Mode>,
    debouncer: Debouncer,
    viewport_width: f64,
}

impl ResponsiveModeController {
    pub fn new(config: ResponsiveConfig) -> Self {
        let debouncer = Debouncer::new(config.debounce());
        Self {
            config,
            mode: None,
            debouncer,
            viewport_width: 0.0,
        }
    }

    /// Current mode; interactive until the first evaluation
    pub fn mode(&self) -> Mode {
        self.mode.unwrap_or(Mode::Interactive)
    }

    pub fn compute_mode(&self, viewport_width: f64, container_width: f64) -> Mode {
        if viewport_width <= self.config.min_interactive_width
            || container_width + self.config.scroll_margin > viewport_width
        {
            Mode::Static
        } else {
            Mode::Interactive
        }
    }

    /// Evaluates right away. Returns the new mode on a transition.
    pub fn evaluate(&mut self, viewport_width: f64, container_width: f64) -> Option<Mode> {
        self.viewport_width = viewport_width;
        let next = self.compute_mode(viewport_width, container_width);
        if self.mode == Some(next) {
            return None;
        }
        self.mode = Some(next);
        Some(next)
    }

    /// Records a resize and restarts the quiet period
    pub fn on_resize(&mut self, viewport_width: f64, now: Instant) {
        self.viewport_width = viewport_width;
        self.debouncer.signal(now);
    }

    /// Evaluates once the quiet period after the last resize has passed
    pub fn poll(&mut self, now: Instant, container_width: f64) -> Option<Mode> {
        if self.debouncer.poll(now) {
            self.evaluate(self.viewport_width, container_width)
        } else {
            None
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.debouncer.deadline()
    }
}

/// How an instance decides its interaction mode, fixed at construction
#[derive(Debug, Clone)]
pub enum InteractionStrategy {
    Responsive(ResponsiveModeController),
    Fixed(Mode),
}

impl InteractionStrategy {
    /// Full-screen and always-interactive maps never go static
    pub fn select(full_screen: bool, always_interactive: bool, config: &ResponsiveConfig) -> Self {
        if full_screen || always_interactive {
            InteractionStrategy::Fixed(Mode::Interactive)
        } else {
            InteractionStrategy::Responsive(ResponsiveModeController::new(config.clone()))
        }
    }

    pub fn mode(&self) -> Mode {
        match self {
            InteractionStrategy::Responsive(controller) => controller.mode(),
            InteractionStrategy::Fixed(mode) => *mode,
        }
    }

    pub fn is_responsive(&self) -> bool {
        matches!(self, InteractionStrategy::Responsive(_))
    }

    pub fn evaluate(&mut self, viewport_width: f64, container_width: f64) -> Option<Mode> {
        match self {
            InteractionStrategy::Responsive(controller) => {
                controller.evaluate(viewport_width, container_width)
            }
            InteractionStrategy::Fixed(_) => None,
        }
    }

    pub fn on_resize(&mut self, viewport_width: f64, now: Instant) {
        if let InteractionStrategy::Responsive(controller) = self {
            controller.on_resize(viewport_width, now);
        }
    }

    pub fn poll(&mut self, now: Instant, container_width: f64) -> Option<Mode> {
        match self {
            InteractionStrategy::Responsive(controller) => controller.poll(now, container_width),
            InteractionStrategy::Fixed(_) => None,
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        match self {
            InteractionStrategy::Responsive(controller) => controller.deadline(),
            InteractionStrategy::Fixed(_) => None,
        }
    }
}

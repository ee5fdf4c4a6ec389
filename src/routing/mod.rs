//! Hash-route integration for full-screen maps.
//!
//! Full-screen maps are addressable as `map/<index>(/<zoom>/<lat>/<lng>)`.
//! The document's router is reached through [`Router`]; the index space is
//! kept by [`RouteBinding`].

pub mod binding;
pub mod route;

pub use binding::RouteBinding;
pub use route::MapRoute;

/// The document's hash router
pub trait Router {
    /// Current route, empty when none is set
    fn current(&self) -> String;

    /// Pushes a new route
    fn navigate(&mut self, route: &str);

    /// Rewrites the current route without adding a history entry
    fn replace(&mut self, route: &str) {
        self.navigate(route);
    }
}

pub mod fitting;

pub use fitting::BoundsFitter;

//! Path-planning laboratory: potential-field navigation, wavefront BFS and
//! RRT planners driven one frame at a time.
//!
//! The [`engine`] module holds the planners and their shared geometry.
//! [`scenario`] loads planner inputs from JSON and [`lab`] wraps one planner
//! with the run/pause/reset/speed controls an interactive front end needs.

pub mod engine;
pub mod error;
pub mod lab;
pub mod scenario;

pub use error::{ConfigError, ScenarioError};
pub use lab::{Lab, Planner, Stats};
pub use scenario::Scenario;

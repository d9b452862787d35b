// Engine module - the three planners and the primitives they share.
// Engines never call each other; the lab driver owns exactly one at a time.

pub mod geometry;
pub mod pacing;
pub mod params;
pub mod potential_field;
pub mod rrt;
pub mod wavefront;

// Re-export commonly used items
pub use geometry::{Obstacle, Point2, Vector2, distance, segment_clear_of_obstacles};
pub use pacing::{FrameAccumulator, Speed};
pub use params::{ForceParams, RrtParams};
pub use potential_field::{Agent, FieldStats, PotentialFieldEngine, force, scalar_potential};
pub use rrt::{RrtEngine, RrtNode, RrtStats};
pub use wavefront::{Cell, OccupancyGrid, WavefrontEngine, WavefrontStats};

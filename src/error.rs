//! Error types for the fallible edges of the crate.
//!
//! The planners themselves never fail: unreachable goals and exhausted node
//! budgets are terminal states, not errors. Only parameter validation and
//! scenario loading can be rejected.

use std::path::PathBuf;

use thiserror::Error;

/// A [`ForceParams`](crate::engine::ForceParams) field is out of range.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("parameter `{name}` must be finite and non-negative, got {value}")]
    Negative { name: &'static str, value: f64 },
    #[error("parameter `{name}` must be strictly positive, got {value}")]
    NotPositive { name: &'static str, value: f64 },
    #[error("parameter `{name}` must lie in [{min}, {max}], got {value}")]
    OutOfRange {
        name: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
}

/// A scenario file could not be read or describes an invalid world.
#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("failed to read scenario {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed scenario JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("grid row {row} has {found} columns, expected {expected}")]
    RaggedGrid {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("grid must have at least one row and one column")]
    EmptyGrid,
    #[error("{what} cell ({row}, {col}) lies outside the {rows}x{cols} grid")]
    CellOutOfBounds {
        what: &'static str,
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },
    #[error("potential-field scenario needs at least one agent")]
    NoAgents,
    #[error("obstacle {index} has negative radius {radius}")]
    NegativeRadius { index: usize, radius: f64 },
    #[error(transparent)]
    Params(#[from] ConfigError),
}

//! Scenario descriptors.
//!
//! Scenarios are authored outside the crate and loaded from JSON. Each one
//! targets exactly one planner and carries everything needed to build a
//! fresh engine for it:
//!
//! ```json
//! { "kind": "field", "name": "corridor",
//!   "obstacles": [{ "x": 0.5, "y": 0.2, "r": 0.12 }],
//!   "agents": [{ "x": 0.08, "y": 0.08 }],
//!   "goal": { "x": 0.92, "y": 0.92 } }
//! ```
//!
//! Wavefront grids are rows of `0` (open) / `1` (wall).

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::engine::{
    Cell, ForceParams, Obstacle, OccupancyGrid, Point2, PotentialFieldEngine, RrtEngine,
    RrtParams, WavefrontEngine,
};
use crate::error::ScenarioError;

/// A point as written in scenario files.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointSpec {
    pub x: f64,
    pub y: f64,
}

impl From<PointSpec> for Point2 {
    fn from(p: PointSpec) -> Self {
        Point2::new(p.x, p.y)
    }
}

/// A circular obstacle as written in scenario files.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObstacleSpec {
    pub x: f64,
    pub y: f64,
    pub r: f64,
}

impl From<ObstacleSpec> for Obstacle {
    fn from(o: ObstacleSpec) -> Self {
        Obstacle::new(o.x, o.y, o.r)
    }
}

/// A grid cell as written in scenario files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellSpec {
    pub r: usize,
    pub c: usize,
}

impl From<CellSpec> for Cell {
    fn from(c: CellSpec) -> Self {
        Cell::new(c.r, c.c)
    }
}

/// Multi-agent potential-field scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldScenario {
    #[serde(default)]
    pub obstacles: Vec<ObstacleSpec>,
    pub agents: Vec<PointSpec>,
    pub goal: PointSpec,
    /// Overrides applied on top of the default parameters.
    #[serde(default)]
    pub params: Option<ForceParams>,
}

/// Grid scenario for wavefront search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridScenario {
    pub grid: Vec<Vec<u8>>,
    pub start: CellSpec,
    pub goal: CellSpec,
}

/// Single-query RRT scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RrtScenario {
    #[serde(default)]
    pub obstacles: Vec<ObstacleSpec>,
    pub start: PointSpec,
    pub goal: PointSpec,
    #[serde(default)]
    pub params: Option<RrtParams>,
}

/// A scenario for any of the three planners.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ScenarioKind {
    Field(FieldScenario),
    Wavefront(GridScenario),
    Rrt(RrtScenario),
}

/// Named scenario, the unit the driver activates and resets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(flatten)]
    pub kind: ScenarioKind,
}

impl Scenario {
    pub fn from_json(text: &str) -> Result<Self, ScenarioError> {
        let scenario: Scenario = serde_json::from_str(text)?;
        scenario.validate()?;
        Ok(scenario)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ScenarioError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ScenarioError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    /// Reject inputs the engines assume never happen.
    pub fn validate(&self) -> Result<(), ScenarioError> {
        match &self.kind {
            ScenarioKind::Field(s) => {
                if s.agents.is_empty() {
                    return Err(ScenarioError::NoAgents);
                }
                check_radii(&s.obstacles)?;
                if let Some(params) = &s.params {
                    params.validate()?;
                }
            }
            ScenarioKind::Wavefront(s) => {
                let rows = s.grid.len();
                let cols = s.grid.first().map_or(0, Vec::len);
                if rows == 0 || cols == 0 {
                    return Err(ScenarioError::EmptyGrid);
                }
                if let Some((row, r)) = s.grid.iter().enumerate().find(|(_, r)| r.len() != cols) {
                    return Err(ScenarioError::RaggedGrid {
                        row,
                        expected: cols,
                        found: r.len(),
                    });
                }
                for (what, cell) in [("start", s.start), ("goal", s.goal)] {
                    if cell.r >= rows || cell.c >= cols {
                        return Err(ScenarioError::CellOutOfBounds {
                            what,
                            row: cell.r,
                            col: cell.c,
                            rows,
                            cols,
                        });
                    }
                }
            }
            ScenarioKind::Rrt(s) => {
                check_radii(&s.obstacles)?;
                if let Some(params) = &s.params {
                    params.validate()?;
                }
            }
        }
        Ok(())
    }
}

fn check_radii(obstacles: &[ObstacleSpec]) -> Result<(), ScenarioError> {
    match obstacles.iter().position(|o| o.r < 0.0) {
        Some(index) => Err(ScenarioError::NegativeRadius {
            index,
            radius: obstacles[index].r,
        }),
        None => Ok(()),
    }
}

fn obstacles(specs: &[ObstacleSpec]) -> Vec<Obstacle> {
    specs.iter().copied().map(Obstacle::from).collect()
}

impl FieldScenario {
    /// Fresh engine. `params` wins over the scenario's own overrides.
    pub fn build(&self, params: Option<ForceParams>) -> PotentialFieldEngine {
        let starts: Vec<Point2> = self.agents.iter().copied().map(Point2::from).collect();
        PotentialFieldEngine::new(
            &starts,
            self.goal.into(),
            obstacles(&self.obstacles),
            params.or(self.params).unwrap_or_default(),
        )
    }
}

impl GridScenario {
    pub fn occupancy(&self) -> OccupancyGrid {
        let rows: Vec<Vec<bool>> = self
            .grid
            .iter()
            .map(|row| row.iter().map(|&v| v != 0).collect())
            .collect();
        OccupancyGrid::from_rows(&rows)
    }

    pub fn build(&self) -> WavefrontEngine {
        WavefrontEngine::new(self.occupancy(), self.start.into(), self.goal.into())
    }
}

impl RrtScenario {
    pub fn build(&self) -> RrtEngine {
        RrtEngine::new(
            self.start.into(),
            self.goal.into(),
            obstacles(&self.obstacles),
            self.params.unwrap_or_default(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigError;

    #[test]
    fn parses_field_scenario() {
        let s = Scenario::from_json(
            r#"{ "kind": "field", "name": "corridor",
                 "obstacles": [{ "x": 0.5, "y": 0.2, "r": 0.12 }],
                 "agents": [{ "x": 0.08, "y": 0.08 }, { "x": 0.08, "y": 0.92 }],
                 "goal": { "x": 0.92, "y": 0.92 } }"#,
        )
        .unwrap();
        assert_eq!(s.name, "corridor");
        let ScenarioKind::Field(field) = &s.kind else {
            panic!("expected field scenario");
        };
        let engine = field.build(None);
        assert_eq!(engine.agents().len(), 2);
        assert_eq!(engine.obstacles()[0].radius, 0.12);
    }

    #[test]
    fn field_params_override_defaults() {
        let s = Scenario::from_json(
            r#"{ "kind": "field",
                 "agents": [{ "x": 0.1, "y": 0.1 }],
                 "goal": { "x": 0.9, "y": 0.9 },
                 "params": { "forceCap": 1.2 } }"#,
        )
        .unwrap();
        let ScenarioKind::Field(field) = &s.kind else {
            panic!("expected field scenario");
        };
        assert_eq!(field.build(None).params().force_cap, 1.2);
        let explicit = ForceParams {
            force_cap: 0.5,
            ..ForceParams::default()
        };
        assert_eq!(field.build(Some(explicit)).params().force_cap, 0.5);
    }

    #[test]
    fn parses_grid_scenario() {
        let s = Scenario::from_json(
            r#"{ "kind": "wavefront",
                 "grid": [[0, 0, 0], [0, 1, 0], [0, 0, 0]],
                 "start": { "r": 0, "c": 0 }, "goal": { "r": 2, "c": 2 } }"#,
        )
        .unwrap();
        let ScenarioKind::Wavefront(grid) = &s.kind else {
            panic!("expected wavefront scenario");
        };
        let occupancy = grid.occupancy();
        assert_eq!(occupancy.wall_count(), 1);
        assert!(occupancy.is_wall(Cell::new(1, 1)));
    }

    #[test]
    fn rejects_ragged_grid() {
        let err = Scenario::from_json(
            r#"{ "kind": "wavefront", "grid": [[0, 0], [0]],
                 "start": { "r": 0, "c": 0 }, "goal": { "r": 0, "c": 1 } }"#,
        )
        .unwrap_err();
        assert!(matches!(err, ScenarioError::RaggedGrid { row: 1, .. }));
    }

    #[test]
    fn rejects_out_of_bounds_goal() {
        let err = Scenario::from_json(
            r#"{ "kind": "wavefront", "grid": [[0, 0], [0, 0]],
                 "start": { "r": 0, "c": 0 }, "goal": { "r": 5, "c": 1 } }"#,
        )
        .unwrap_err();
        assert!(matches!(err, ScenarioError::CellOutOfBounds { what: "goal", .. }));
    }

    #[test]
    fn rejects_empty_agent_list() {
        let err = Scenario::from_json(
            r#"{ "kind": "field", "agents": [], "goal": { "x": 0.5, "y": 0.5 } }"#,
        )
        .unwrap_err();
        assert!(matches!(err, ScenarioError::NoAgents));
    }

    #[test]
    fn rejects_negative_radius() {
        let err = Scenario::from_json(
            r#"{ "kind": "rrt", "obstacles": [{ "x": 0.5, "y": 0.5, "r": -0.1 }],
                 "start": { "x": 0.1, "y": 0.1 }, "goal": { "x": 0.9, "y": 0.9 } }"#,
        )
        .unwrap_err();
        assert!(matches!(err, ScenarioError::NegativeRadius { index: 0, .. }));
    }

    #[test]
    fn rejects_invalid_tree_params() {
        let err = Scenario::from_json(
            r#"{ "kind": "rrt", "start": { "x": 0.1, "y": 0.1 }, "goal": { "x": 0.9, "y": 0.9 },
                 "params": { "goalBias": 2.0 } }"#,
        )
        .unwrap_err();
        assert!(matches!(err, ScenarioError::Params(ConfigError::OutOfRange { .. })));
    }

    #[test]
    fn rejects_unknown_kind() {
        assert!(matches!(
            Scenario::from_json(r#"{ "kind": "prm" }"#),
            Err(ScenarioError::Json(_))
        ));
    }
}

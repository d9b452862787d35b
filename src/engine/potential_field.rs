// Artificial potential-field navigation for a fixed set of agents.
//
// Force model per agent:
//   1. Linear attraction toward the goal.
//   2. Repulsion from every obstacle surface within `rep_range`, with the
//      goal-opposing component damped so agents slide past surfaces instead
//      of bouncing straight back.
//   3. Minimum forward bias near obstacles (outside the collision zone).
//   4. Tangential escape force scaled by how long the agent has stalled.
//   5. Magnitude cap.
//
// Integration is damped Euler with injected noise. The scalar potential is
// only used to shade field overlays and never feeds back into motion.

use std::collections::VecDeque;

use log::debug;
use rand::Rng;
use serde::Serialize;

use super::geometry::{NORMALIZE_EPSILON, Obstacle, Point2, Vector2, distance};
use super::pacing::Speed;
use super::params::ForceParams;

// ============================================================================
// CONSTANTS
// ============================================================================

/// Live trail length; older points are dropped first.
pub const TRAIL_CAPACITY: usize = 3000;
/// Upper bound of `Agent::stuck_count`.
pub const STUCK_COUNT_MAX: u32 = 300;
/// Stuck count at which the stuck factor saturates at 1.
pub const STUCK_RAMP: f64 = 80.0;
/// Distance to goal that counts as arrival.
pub const REACH_RADIUS: f64 = 0.025;
/// Simulated time advanced per substep.
pub const TIME_PER_SUBSTEP: f64 = 0.012;

/// Surface-distance floor for repulsion forces.
const FORCE_RHO_FLOOR: f64 = 0.002;
/// Surface-distance floor for the scalar potential.
const POTENTIAL_RHO_FLOOR: f64 = 0.001;
/// Goal distance below which the tangential force has no defined direction.
const TANGENT_EPSILON: f64 = 0.001;
/// Stuck-count decrement on measurable progress.
const PROGRESS_RELIEF: u32 = 3;

// ============================================================================
// FIELD FUNCTIONS
// ============================================================================

/// Scalar potential at `position`: squared goal distance plus the classic
/// FIRAS repulsive term for every obstacle within `rep_range`.
pub fn scalar_potential(
    position: Point2,
    goal: Point2,
    obstacles: &[Obstacle],
    params: &ForceParams,
) -> f64 {
    let rho0 = params.rep_range;
    let attractive = (goal - position).length_squared();
    let repulsive: f64 = obstacles
        .iter()
        .map(|obs| obs.surface_distance(position).max(POTENTIAL_RHO_FLOOR))
        .filter(|&rho| rho < rho0)
        .map(|rho| {
            let t = 1.0 / rho - 1.0 / rho0;
            0.5 * params.k_rep_potential * t * t
        })
        .sum();
    attractive + repulsive
}

/// Navigation force at `position`.
///
/// `stuck_factor` in [0,1] scales the tangential escape term. The result
/// never exceeds `params.force_cap` in magnitude.
pub fn force(
    position: Point2,
    goal: Point2,
    obstacles: &[Obstacle],
    stuck_factor: f64,
    params: &ForceParams,
) -> Vector2 {
    let rho0 = params.rep_range;
    let to_goal = goal - position;
    let goal_dist = to_goal.length();
    let goal_active = goal_dist > NORMALIZE_EPSILON;
    let goal_dir = if goal_active {
        to_goal / goal_dist
    } else {
        Vector2::ZERO
    };

    let mut f = params.k_att * to_goal;
    let mut min_rho = f64::INFINITY;

    for obs in obstacles {
        let away = position - obs.center;
        let center_dist = away.length().max(NORMALIZE_EPSILON);
        let rho = (center_dist - obs.radius).max(FORCE_RHO_FLOOR);
        min_rho = min_rho.min(rho);
        if rho >= rho0 {
            continue;
        }

        let mag = params.k_rep * (1.0 / rho - 1.0 / rho0) / (rho * rho);
        let mut rep = away / center_dist * mag;

        // Damp only the part that pushes back along the goal direction.
        let along_goal = rep.dot(goal_dir);
        if along_goal < 0.0 && goal_active {
            let near = ((rho0 - rho) / rho0).clamp(0.0, 1.0);
            let scale = params.backward_scale_min
                + (1.0 - params.backward_scale_min) * near.powf(params.backward_scale_near_power);
            let lateral = rep - along_goal * goal_dir;
            rep = lateral + along_goal * scale * goal_dir;
        }

        f += rep;
    }

    if goal_active && min_rho < rho0 {
        let proximity = ((rho0 - min_rho) / rho0).clamp(0.0, 1.0);
        let min_forward = params.min_forward_base + params.min_forward_gain * proximity;
        let forward = f.dot(goal_dir);
        if forward < min_forward && min_rho > params.collision_zone {
            f += goal_dir * (min_forward - forward);
        }
    }

    if stuck_factor > 0.0 && goal_dist > TANGENT_EPSILON {
        f += (to_goal / goal_dist).perp() * (stuck_factor * params.tangential_gain);
    }

    let mag = f.length();
    if mag > params.force_cap {
        f = f / mag * params.force_cap;
    }
    f
}

// ============================================================================
// AGENT
// ============================================================================

/// One navigating agent. Mutated only by [`Agent::step`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    pub position: Point2,
    pub velocity: Vector2,
    trail: VecDeque<Point2>,
    finished_trail: Option<Vec<Point2>>,
    pub reached: bool,
    pub steps: u32,
    pub stuck_count: u32,
    pub prev_dist: f64,
}

impl Agent {
    pub fn new(start: Point2) -> Self {
        let mut trail = VecDeque::with_capacity(TRAIL_CAPACITY + 1);
        trail.push_back(start);
        Self {
            position: start,
            velocity: Vector2::ZERO,
            trail,
            finished_trail: None,
            reached: false,
            steps: 0,
            stuck_count: 0,
            prev_dist: f64::INFINITY,
        }
    }

    /// Recent positions, oldest first. At most [`TRAIL_CAPACITY`] entries.
    pub fn trail(&self) -> &VecDeque<Point2> {
        &self.trail
    }

    /// Snapshot of the trail taken on arrival.
    pub fn finished_trail(&self) -> Option<&[Point2]> {
        self.finished_trail.as_deref()
    }

    /// Normalized stall measure in [0,1].
    pub fn stuck_factor(&self) -> f64 {
        (self.stuck_count as f64 / STUCK_RAMP).clamp(0.0, 1.0)
    }

    /// Advance one substep. Agents that already reached the goal are left
    /// untouched.
    pub fn step<R: Rng + ?Sized>(
        &mut self,
        goal: Point2,
        obstacles: &[Obstacle],
        params: &ForceParams,
        rng: &mut R,
    ) {
        if self.reached {
            return;
        }

        let cur_dist = distance(self.position, goal);
        let speed = self.velocity.length();
        if speed < params.stuck_vel_threshold && self.steps > params.stuck_warmup_steps {
            self.stuck_count = (self.stuck_count + 1).min(STUCK_COUNT_MAX);
        } else if cur_dist < self.prev_dist - params.progress_eps {
            self.stuck_count = self.stuck_count.saturating_sub(PROGRESS_RELIEF);
        }
        self.prev_dist = cur_dist;

        let stuck_factor = self.stuck_factor();
        let f = force(self.position, goal, obstacles, stuck_factor, params);
        self.velocity = self.velocity * params.damping + f * params.force_step;

        let noise = params.base_noise + stuck_factor * params.stuck_noise_gain;
        self.velocity += Vector2::new(
            rng.gen_range(-0.5..0.5) * noise,
            rng.gen_range(-0.5..0.5) * noise,
        );
        self.position = (self.position + self.velocity * params.step_scale)
            .clamp(Point2::ZERO, Point2::ONE);

        self.steps += 1;
        self.trail.push_back(self.position);
        if self.trail.len() > TRAIL_CAPACITY {
            self.trail.pop_front();
        }

        if cur_dist < REACH_RADIUS {
            self.reached = true;
            self.finished_trail = Some(self.trail.iter().copied().collect());
        }
    }
}

// ============================================================================
// POTENTIAL RASTER
// ============================================================================

/// Scalar potential sampled on a regular grid over the unit square.
#[derive(Debug, Clone)]
pub struct PotentialRaster {
    pub cols: usize,
    pub rows: usize,
    values: Vec<f64>,
    pub min: f64,
    pub max: f64,
}

impl PotentialRaster {
    /// Sample cell `(gx, gy)` at `(gx / cols, gy / rows)`.
    pub fn compute(
        cols: usize,
        rows: usize,
        goal: Point2,
        obstacles: &[Obstacle],
        params: &ForceParams,
    ) -> Self {
        let mut values = Vec::with_capacity(cols * rows);
        for gy in 0..rows {
            for gx in 0..cols {
                let p = Point2::new(gx as f64 / cols as f64, gy as f64 / rows as f64);
                values.push(scalar_potential(p, goal, obstacles, params));
            }
        }
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        Self {
            cols,
            rows,
            values,
            min,
            max,
        }
    }

    pub fn value(&self, gx: usize, gy: usize) -> f64 {
        self.values[gy * self.cols + gx]
    }

    /// Contrast-compressed value in [0,1] for shading.
    pub fn normalized(&self, gx: usize, gy: usize) -> f64 {
        let t = (self.value(gx, gy) - self.min) / (self.max - self.min + 0.001);
        t.min(1.0).powf(0.4)
    }
}

/// Force vector sampled at a grid point, for arrow overlays.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ForceSample {
    pub position: Point2,
    pub force: Vector2,
}

// ============================================================================
// ENGINE
// ============================================================================

/// Per-frame summary for display.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldStats {
    pub reached_count: usize,
    pub total_agents: usize,
    pub simulated_time: f64,
    pub all_done: bool,
}

/// All agents of one potential-field scenario run.
#[derive(Debug, Clone)]
pub struct PotentialFieldEngine {
    agents: Vec<Agent>,
    goal: Point2,
    obstacles: Vec<Obstacle>,
    params: ForceParams,
    time: f64,
    raster: Option<PotentialRaster>,
}

impl PotentialFieldEngine {
    pub fn new(
        starts: &[Point2],
        goal: Point2,
        obstacles: Vec<Obstacle>,
        params: ForceParams,
    ) -> Self {
        debug_assert!(!starts.is_empty(), "potential field needs at least one agent");
        debug_assert!(params.validate().is_ok(), "invalid force params");
        Self {
            agents: starts.iter().copied().map(Agent::new).collect(),
            goal,
            obstacles,
            params,
            time: 0.0,
            raster: None,
        }
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn goal(&self) -> Point2 {
        self.goal
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    pub fn params(&self) -> &ForceParams {
        &self.params
    }

    pub fn simulated_time(&self) -> f64 {
        self.time
    }

    /// Swap in new parameters. Agent state is kept; cached rasters are
    /// dropped.
    pub fn set_params(&mut self, params: ForceParams) {
        if params != self.params {
            self.params = params;
            self.raster = None;
        }
    }

    /// Run `substeps` integration steps over every agent still travelling.
    pub fn step<R: Rng + ?Sized>(&mut self, substeps: u32, rng: &mut R) {
        for _ in 0..substeps {
            self.time += TIME_PER_SUBSTEP;
            for (i, agent) in self.agents.iter_mut().enumerate() {
                if agent.reached {
                    continue;
                }
                agent.step(self.goal, &self.obstacles, &self.params, rng);
                if agent.reached {
                    debug!("agent {i} reached goal after {} steps", agent.steps);
                }
            }
        }
    }

    /// One animation frame at the given playback speed.
    pub fn tick<R: Rng + ?Sized>(&mut self, speed: Speed, rng: &mut R) {
        self.step(speed.substeps(), rng);
    }

    pub fn stats(&self) -> FieldStats {
        let reached_count = self.agents.iter().filter(|a| a.reached).count();
        FieldStats {
            reached_count,
            total_agents: self.agents.len(),
            simulated_time: self.time,
            all_done: reached_count == self.agents.len(),
        }
    }

    /// Potential sampled on a `cols × rows` grid, cached until the
    /// parameters or requested resolution change.
    pub fn potential_raster(&mut self, cols: usize, rows: usize) -> &PotentialRaster {
        let stale = self
            .raster
            .as_ref()
            .is_none_or(|r| r.cols != cols || r.rows != rows);
        if stale {
            self.raster = None;
        }
        self.raster.get_or_insert_with(|| {
            PotentialRaster::compute(cols, rows, self.goal, &self.obstacles, &self.params)
        })
    }

    /// Stall-free force samples on a lattice with the given spacing,
    /// offset by half a cell from the origin.
    /// A non-positive or NaN spacing yields no samples.
    pub fn force_samples(&self, spacing: f64) -> Vec<ForceSample> {
        let mut samples = Vec::new();
        if spacing.is_nan() || spacing <= 0.0 {
            return samples;
        }
        let mut x = spacing * 0.5;
        while x < 1.0 {
            let mut y = spacing * 0.5;
            while y < 1.0 {
                let position = Point2::new(x, y);
                samples.push(ForceSample {
                    position,
                    force: force(position, self.goal, &self.obstacles, 0.0, &self.params),
                });
                y += spacing;
            }
            x += spacing;
        }
        samples
    }
}

//! Headless per-frame driver.
//!
//! [`Lab`] stands in for the interactive front end: it owns the active
//! scenario, one planner built from it, the run/pause flag, the playback
//! speed and a seeded RNG. Call [`Lab::frame`] once per frame and read the
//! returned [`Stats`].

use log::{info, warn};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

use crate::engine::{
    FieldStats, ForceParams, PotentialFieldEngine, RrtEngine, RrtStats, Speed, WavefrontEngine,
    WavefrontStats,
};
use crate::error::ConfigError;
use crate::scenario::{Scenario, ScenarioKind};

/// The planner currently driven by the lab.
#[derive(Debug, Clone)]
pub enum Planner {
    PotentialField(PotentialFieldEngine),
    Wavefront(WavefrontEngine),
    Rrt(RrtEngine),
}

/// Snapshot of whichever planner is active.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "planner", rename_all = "lowercase")]
pub enum Stats {
    Field(FieldStats),
    Wavefront(WavefrontStats),
    Rrt(RrtStats),
}

impl Stats {
    /// True once the planner met its goal condition. An exhausted RRT
    /// stays unfinished; see [`Lab::is_settled`].
    pub fn finished(&self) -> bool {
        match self {
            Stats::Field(s) => s.all_done,
            Stats::Wavefront(s) => s.done,
            Stats::Rrt(s) => s.done,
        }
    }
}

pub struct Lab {
    scenario: Scenario,
    planner: Planner,
    force_params: Option<ForceParams>,
    running: bool,
    speed: Speed,
    seed: u64,
    rng: ChaCha8Rng,
    frames: u64,
}

impl Lab {
    pub fn new(scenario: Scenario, seed: u64) -> Self {
        let planner = build_planner(&scenario, None);
        info!("activated scenario {:?} (seed {seed})", scenario.name);
        Self {
            scenario,
            planner,
            force_params: None,
            running: true,
            speed: Speed::default(),
            seed,
            rng: ChaCha8Rng::seed_from_u64(seed),
            frames: 0,
        }
    }

    /// Advance the active planner by one frame if running.
    pub fn frame(&mut self) -> Stats {
        if self.running {
            match &mut self.planner {
                Planner::PotentialField(engine) => engine.tick(self.speed, &mut self.rng),
                Planner::Wavefront(engine) => engine.tick(self.speed),
                Planner::Rrt(engine) => engine.tick(self.speed, &mut self.rng),
            }
            self.frames += 1;
        }
        self.stats()
    }

    pub fn stats(&self) -> Stats {
        match &self.planner {
            Planner::PotentialField(engine) => Stats::Field(engine.stats()),
            Planner::Wavefront(engine) => Stats::Wavefront(engine.stats()),
            Planner::Rrt(engine) => Stats::Rrt(engine.stats()),
        }
    }

    /// Discard all run state and rebuild from the active scenario. The RNG
    /// is reseeded, so a reset run replays the first one exactly.
    pub fn reset(&mut self) {
        self.planner = build_planner(&self.scenario, self.force_params);
        self.rng = ChaCha8Rng::seed_from_u64(self.seed);
        self.frames = 0;
        info!("reset scenario {:?}", self.scenario.name);
    }

    /// Switch to another scenario. Implies a reset.
    pub fn select(&mut self, scenario: Scenario) {
        self.scenario = scenario;
        self.reset();
    }

    /// Apply new force parameters without touching agent state.
    pub fn set_force_params(&mut self, params: ForceParams) -> Result<(), ConfigError> {
        if let Err(err) = params.validate() {
            warn!("rejected force params: {err}");
            return Err(err);
        }
        self.force_params = Some(params);
        if let Planner::PotentialField(engine) = &mut self.planner {
            engine.set_params(params);
        }
        Ok(())
    }

    /// Restore default force parameters and restart the run.
    pub fn reset_force_params(&mut self) {
        self.force_params = None;
        self.reset();
    }

    pub fn pause(&mut self) {
        self.running = false;
    }

    pub fn resume(&mut self) {
        self.running = true;
    }

    pub fn toggle_running(&mut self) {
        self.running = !self.running;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn set_speed(&mut self, speed: Speed) {
        self.speed = speed;
    }

    pub fn speed(&self) -> Speed {
        self.speed
    }

    /// True once another frame cannot change anything: every agent has
    /// arrived, the wave has finished, or the tree has stopped growing.
    pub fn is_settled(&self) -> bool {
        match &self.planner {
            Planner::PotentialField(engine) => engine.stats().all_done,
            Planner::Wavefront(engine) => engine.is_done(),
            Planner::Rrt(engine) => !engine.is_growing(),
        }
    }

    /// Frames advanced since the last reset.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn scenario(&self) -> &Scenario {
        &self.scenario
    }

    pub fn planner(&self) -> &Planner {
        &self.planner
    }

    /// Mutable access for overlays that cache derived data.
    pub fn planner_mut(&mut self) -> &mut Planner {
        &mut self.planner
    }
}

fn build_planner(scenario: &Scenario, force_params: Option<ForceParams>) -> Planner {
    match &scenario.kind {
        ScenarioKind::Field(s) => Planner::PotentialField(s.build(force_params)),
        ScenarioKind::Wavefront(s) => Planner::Wavefront(s.build()),
        ScenarioKind::Rrt(s) => Planner::Rrt(s.build()),
    }
}

// Rapidly-exploring Random Tree over the unit square with circular
// obstacles.
//
// The tree is an append-only arena: nodes refer to their parent by index,
// so indices stay stable for the whole run and the structure is acyclic by
// construction. Every edge is collision-checked before insertion.

use log::debug;
use rand::Rng;
use serde::Serialize;

use super::geometry::{
    NORMALIZE_EPSILON, Obstacle, Point2, distance, in_unit_square, segment_clear_of_obstacles,
};
use super::pacing::{FrameAccumulator, Speed};
use super::params::RrtParams;

/// Growth iterations per frame at 1× speed.
pub const ITERATIONS_PER_FRAME: f64 = 2.5;

/// Tree node. The root is the only node without a parent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RrtNode {
    pub position: Point2,
    pub parent: Option<usize>,
}

/// Per-frame summary for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RrtStats {
    pub done: bool,
    pub node_count: usize,
    pub path_length: Option<usize>,
}

/// Tree state for one scenario run.
#[derive(Debug, Clone)]
pub struct RrtEngine {
    goal: Point2,
    obstacles: Vec<Obstacle>,
    params: RrtParams,
    nodes: Vec<RrtNode>,
    done: bool,
    path: Option<Vec<Point2>>,
    accumulator: FrameAccumulator,
}

impl RrtEngine {
    pub fn new(start: Point2, goal: Point2, obstacles: Vec<Obstacle>, params: RrtParams) -> Self {
        debug_assert!(params.max_nodes >= 1);
        debug_assert!(obstacles.iter().all(|o| o.radius >= 0.0));
        Self {
            goal,
            obstacles,
            params,
            nodes: vec![RrtNode {
                position: start,
                parent: None,
            }],
            done: false,
            path: None,
            accumulator: FrameAccumulator::default(),
        }
    }

    /// True while the tree may still grow.
    pub fn is_growing(&self) -> bool {
        !self.done && self.nodes.len() < self.params.max_nodes
    }

    /// True when the node cap was hit without reaching the goal.
    pub fn is_exhausted(&self) -> bool {
        !self.done && self.nodes.len() >= self.params.max_nodes
    }

    /// Run up to `budget` sample-steer-insert iterations. Rejected samples
    /// still consume budget.
    pub fn advance<R: Rng + ?Sized>(&mut self, budget: u32, rng: &mut R) {
        for _ in 0..budget {
            if !self.is_growing() {
                break;
            }
            self.grow_once(rng);
        }
    }

    /// One animation frame at the given playback speed. A running frame
    /// always grants at least one iteration.
    pub fn tick<R: Rng + ?Sized>(&mut self, speed: Speed, rng: &mut R) {
        if !self.is_growing() {
            return;
        }
        let budget = self
            .accumulator
            .take_at_least_one(speed.multiplier(), ITERATIONS_PER_FRAME);
        self.advance(budget, rng);
    }

    fn grow_once<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let sample = if rng.gen_bool(self.params.goal_bias) {
            self.goal
        } else {
            Point2::new(rng.gen_range(0.0..1.0), rng.gen_range(0.0..1.0))
        };

        let nearest = self.nearest(sample);
        let from = self.nodes[nearest].position;
        let gap = distance(from, sample);
        if gap < NORMALIZE_EPSILON {
            return;
        }
        let candidate = from + (sample - from) / gap * gap.min(self.params.step_size);

        if !in_unit_square(candidate)
            || !segment_clear_of_obstacles(from, candidate, &self.obstacles, self.params.margin)
        {
            return;
        }

        let index = self.nodes.len();
        self.nodes.push(RrtNode {
            position: candidate,
            parent: Some(nearest),
        });

        if distance(candidate, self.goal) < self.params.goal_radius {
            let path = self.trace(index);
            debug!(
                "rrt reached goal with {} nodes, path of {} nodes",
                self.nodes.len(),
                path.len()
            );
            self.path = Some(path);
            self.done = true;
        } else if self.nodes.len() >= self.params.max_nodes {
            debug!("rrt exhausted its {} node budget", self.params.max_nodes);
        }
    }

    /// Index of the node closest to `p`. Ties go to the lowest index.
    pub fn nearest(&self, p: Point2) -> usize {
        let mut best = 0;
        let mut best_dist = f64::INFINITY;
        for (i, node) in self.nodes.iter().enumerate() {
            let d = distance(node.position, p);
            if d < best_dist {
                best_dist = d;
                best = i;
            }
        }
        best
    }

    /// Root-to-`index` positions.
    fn trace(&self, index: usize) -> Vec<Point2> {
        let mut path = Vec::new();
        let mut cur = Some(index);
        while let Some(i) = cur {
            path.push(self.nodes[i].position);
            cur = self.nodes[i].parent;
        }
        path.reverse();
        path
    }

    pub fn nodes(&self) -> &[RrtNode] {
        &self.nodes
    }

    pub fn goal(&self) -> Point2 {
        self.goal
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    pub fn params(&self) -> &RrtParams {
        &self.params
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn path(&self) -> Option<&[Point2]> {
        self.path.as_deref()
    }

    pub fn stats(&self) -> RrtStats {
        RrtStats {
            done: self.done,
            node_count: self.nodes.len(),
            path_length: self.path.as_ref().map(Vec::len),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn run(engine: &mut RrtEngine, rng: &mut ChaCha8Rng) {
        while engine.is_growing() {
            engine.advance(64, rng);
        }
    }

    #[test]
    fn open_field_finds_goal() {
        let goal = Point2::new(0.92, 0.92);
        let mut engine =
            RrtEngine::new(Point2::new(0.08, 0.08), goal, Vec::new(), RrtParams::default());
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        run(&mut engine, &mut rng);
        assert!(engine.is_done());
        assert!(engine.stats().node_count <= RrtParams::default().max_nodes);
        let path = engine.path().unwrap();
        assert_eq!(path.first(), Some(&Point2::new(0.08, 0.08)));
        assert!(distance(*path.last().unwrap(), goal) < RrtParams::default().goal_radius);
        for pair in path.windows(2) {
            assert!(distance(pair[0], pair[1]) <= RrtParams::default().step_size + 1e-12);
        }
    }

    #[test]
    fn path_follows_parent_links() {
        let mut engine = RrtEngine::new(
            Point2::new(0.1, 0.5),
            Point2::new(0.9, 0.5),
            vec![Obstacle::new(0.5, 0.5, 0.12)],
            RrtParams::default(),
        );
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        run(&mut engine, &mut rng);
        assert!(engine.is_done());
        let path = engine.path().unwrap();
        assert_eq!(engine.stats().path_length, Some(path.len()));

        // Walk from the last inserted node back to the root.
        let mut expected = Vec::new();
        let mut cur = Some(engine.nodes().len() - 1);
        while let Some(i) = cur {
            expected.push(engine.nodes()[i].position);
            cur = engine.nodes()[i].parent;
        }
        expected.reverse();
        assert_eq!(path, &expected[..]);
    }

    #[test]
    fn walled_goal_exhausts_budget() {
        let params = RrtParams {
            max_nodes: 300,
            ..RrtParams::default()
        };
        // Ring of obstacles around the goal.
        let goal = Point2::new(0.8, 0.8);
        let ring: Vec<Obstacle> = (0..24)
            .map(|k| {
                let a = k as f64 / 24.0 * std::f64::consts::TAU;
                Obstacle::new(0.8 + 0.12 * a.cos(), 0.8 + 0.12 * a.sin(), 0.04)
            })
            .collect();
        let mut engine = RrtEngine::new(Point2::new(0.1, 0.1), goal, ring, params);
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        run(&mut engine, &mut rng);
        assert!(!engine.is_done());
        assert!(engine.is_exhausted());
        assert_eq!(engine.stats().node_count, 300);
        assert_eq!(engine.path(), None);

        engine.advance(100, &mut rng);
        engine.tick(Speed::Quadruple, &mut rng);
        assert_eq!(engine.stats().node_count, 300);
    }

    #[test]
    fn nearest_prefers_lowest_index_on_ties() {
        let mut engine = RrtEngine::new(
            Point2::new(0.5, 0.5),
            Point2::new(0.9, 0.9),
            Vec::new(),
            RrtParams::default(),
        );
        engine.nodes.push(RrtNode {
            position: Point2::new(0.5, 0.5),
            parent: Some(0),
        });
        assert_eq!(engine.nearest(Point2::new(0.2, 0.2)), 0);
    }

    #[test]
    fn tick_runs_at_least_one_iteration() {
        let mut engine = RrtEngine::new(
            Point2::new(0.5, 0.5),
            Point2::new(0.9, 0.9),
            Vec::new(),
            RrtParams {
                goal_bias: 1.0,
                ..RrtParams::default()
            },
        );
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        engine.tick(Speed::Quarter, &mut rng);
        assert_eq!(engine.stats().node_count, 2);
    }

    #[test]
    fn goal_bias_one_grows_straight_to_goal() {
        let start = Point2::new(0.1, 0.1);
        let goal = Point2::new(0.5, 0.1);
        let mut engine = RrtEngine::new(
            start,
            goal,
            Vec::new(),
            RrtParams {
                goal_bias: 1.0,
                ..RrtParams::default()
            },
        );
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        engine.advance(100, &mut rng);
        assert!(engine.is_done());
        // 0.4 at 0.04 per edge: ten edges, plus the root.
        assert_eq!(engine.stats().node_count, 11);
        assert_eq!(engine.stats().path_length, Some(11));
        assert!(engine.nodes().iter().all(|n| (n.position.y - 0.1).abs() < 1e-12));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn every_edge_is_collision_free(
            seed in any::<u64>(),
            obstacles in prop::collection::vec(
                (0.1f64..0.9, 0.1f64..0.9, 0.02f64..0.12)
                    .prop_map(|(x, y, r)| Obstacle::new(x, y, r)),
                0..6,
            ),
        ) {
            let params = RrtParams { max_nodes: 400, ..RrtParams::default() };
            let mut engine = RrtEngine::new(
                Point2::new(0.02, 0.02),
                Point2::new(0.98, 0.98),
                obstacles.clone(),
                params,
            );
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            engine.advance(5_000, &mut rng);
            for node in &engine.nodes()[1..] {
                let parent = engine.nodes()[node.parent.unwrap()];
                prop_assert!(in_unit_square(node.position));
                prop_assert!(segment_clear_of_obstacles(
                    parent.position,
                    node.position,
                    &obstacles,
                    params.margin,
                ));
            }
        }
    }
}

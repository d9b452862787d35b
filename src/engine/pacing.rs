// Frame pacing: converts a per-frame speed multiplier into a whole number
// of engine steps.
//
// Engines never own a timer. The driver calls them once per frame and the
// helpers here decide how much work that frame buys.

use serde::{Deserialize, Serialize};

/// Discrete playback speeds offered to the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Speed {
    Quarter,
    Half,
    #[default]
    Normal,
    Double,
    Quadruple,
}

impl Speed {
    pub const ALL: [Speed; 5] = [
        Speed::Quarter,
        Speed::Half,
        Speed::Normal,
        Speed::Double,
        Speed::Quadruple,
    ];

    pub fn multiplier(self) -> f64 {
        match self {
            Speed::Quarter => 0.25,
            Speed::Half => 0.5,
            Speed::Normal => 1.0,
            Speed::Double => 2.0,
            Speed::Quadruple => 4.0,
        }
    }

    /// Match a multiplier such as `0.5` or `4` to its speed setting.
    pub fn from_multiplier(value: f64) -> Option<Speed> {
        Self::ALL
            .into_iter()
            .find(|s| (s.multiplier() - value).abs() < 1e-9)
    }

    /// Substeps per frame for engines that integrate in whole steps.
    /// Never less than one, so slow speeds still make progress.
    pub fn substeps(self) -> u32 {
        (self.multiplier().round() as u32).max(1)
    }
}

/// Fractional step accumulator.
///
/// Each frame adds `speed × rate`; the integer part is handed out as the
/// frame's step budget and the remainder carries to the next frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct FrameAccumulator {
    value: f64,
}

impl FrameAccumulator {
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Add one frame's worth of work and consume the whole steps.
    pub fn take(&mut self, speed: f64, rate: f64) -> u32 {
        self.value += speed * rate;
        let steps = self.value.floor().max(0.0);
        self.value -= steps;
        steps as u32
    }

    /// Like [`take`](Self::take) but always grants at least one step.
    /// The remainder may go negative, which delays the following frames.
    pub fn take_at_least_one(&mut self, speed: f64, rate: f64) -> u32 {
        self.value += speed * rate;
        let steps = self.value.floor().max(1.0);
        self.value -= steps;
        steps as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substeps_round_and_floor_at_one() {
        assert_eq!(Speed::Quarter.substeps(), 1);
        assert_eq!(Speed::Half.substeps(), 1);
        assert_eq!(Speed::Normal.substeps(), 1);
        assert_eq!(Speed::Double.substeps(), 2);
        assert_eq!(Speed::Quadruple.substeps(), 4);
    }

    #[test]
    fn from_multiplier_round_trips_known_values() {
        for speed in Speed::ALL {
            assert_eq!(Speed::from_multiplier(speed.multiplier()), Some(speed));
        }
        assert_eq!(Speed::from_multiplier(3.0), None);
    }

    #[test]
    fn accumulator_carries_fraction() {
        let mut acc = FrameAccumulator::default();
        // 0.4 per frame: 0.4, 0.8, 1.2 -> 1, 0.6, 1.0 -> 1
        let budgets: Vec<u32> = (0..5).map(|_| acc.take(1.0, 0.4)).collect();
        assert_eq!(budgets, vec![0, 0, 1, 0, 1]);
        assert!(acc.value() < 1e-9);
    }

    #[test]
    fn accumulator_total_matches_rate() {
        let mut acc = FrameAccumulator::default();
        let total: u32 = (0..100).map(|_| acc.take(2.0, 2.5)).sum();
        assert_eq!(total, 500);
    }

    #[test]
    fn at_least_one_borrows_from_future_frames() {
        let mut acc = FrameAccumulator::default();
        // 0.25 * 2.5 = 0.625 per frame; the first frame borrows.
        assert_eq!(acc.take_at_least_one(0.25, 2.5), 1);
        assert!((acc.value() + 0.375).abs() < 1e-12);
        assert_eq!(acc.take_at_least_one(0.25, 2.5), 1);
        assert!((acc.value() + 0.75).abs() < 1e-12);
    }
}

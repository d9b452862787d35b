// Tunable numeric parameters for the planners.
//
// Every field is independently adjustable at runtime. Changing ForceParams
// never requires resetting agent state; it only invalidates cached
// potential rasters.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

// ============================================================================
// FORCE PARAMS
// ============================================================================

/// Potential-field gains, thresholds and integration constants.
///
/// Deserializes from a partial JSON object: missing keys keep their
/// [`Default`] value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ForceParams {
    /// Linear attraction gain toward the goal.
    pub k_att: f64,
    /// Repulsion gain used for motion.
    pub k_rep: f64,
    /// Repulsion gain used by the scalar potential (visualization only).
    pub k_rep_potential: f64,
    /// Surface distance beyond which obstacles exert no repulsion.
    pub rep_range: f64,
    /// Floor of the scale applied to goal-opposing repulsion.
    pub backward_scale_min: f64,
    /// Exponent shaping how fast backward damping relaxes near a surface.
    pub backward_scale_near_power: f64,
    /// Minimum forward force with no obstacle nearby.
    pub min_forward_base: f64,
    /// Extra minimum forward force at full obstacle proximity.
    pub min_forward_gain: f64,
    /// Surface distance below which forward bias is suppressed.
    pub collision_zone: f64,
    /// Tangential escape force at stuck factor 1.
    pub tangential_gain: f64,
    /// Maximum resultant force magnitude.
    pub force_cap: f64,
    /// Per-step velocity retention.
    pub damping: f64,
    /// Velocity to position scale.
    pub step_scale: f64,
    /// Force to velocity scale.
    pub force_step: f64,
    pub base_noise: f64,
    pub stuck_noise_gain: f64,
    /// Speed below which an agent counts as stalled.
    pub stuck_vel_threshold: f64,
    /// Distance decrease that counts as progress.
    pub progress_eps: f64,
    /// Steps before stall detection engages.
    pub stuck_warmup_steps: u32,
}

impl Default for ForceParams {
    fn default() -> Self {
        Self {
            k_att: 2.5,
            k_rep: 0.0042,
            k_rep_potential: 0.0032,
            rep_range: 0.13,
            backward_scale_min: 0.05,
            backward_scale_near_power: 3.0,
            min_forward_base: 0.12,
            min_forward_gain: 0.24,
            collision_zone: 0.018,
            tangential_gain: 3.5,
            force_cap: 0.8,
            damping: 0.7,
            step_scale: 0.012,
            force_step: 0.012,
            base_noise: 0.002,
            stuck_noise_gain: 0.012,
            stuck_vel_threshold: 0.003,
            progress_eps: 0.0005,
            stuck_warmup_steps: 50,
        }
    }
}

impl ForceParams {
    /// Check the invariants the force model relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let non_negative = [
            ("kAtt", self.k_att),
            ("kRep", self.k_rep),
            ("kRepPotential", self.k_rep_potential),
            ("backwardScaleMin", self.backward_scale_min),
            ("backwardScaleNearPower", self.backward_scale_near_power),
            ("minForwardBase", self.min_forward_base),
            ("minForwardGain", self.min_forward_gain),
            ("collisionZone", self.collision_zone),
            ("tangentialGain", self.tangential_gain),
            ("stepScale", self.step_scale),
            ("forceStep", self.force_step),
            ("baseNoise", self.base_noise),
            ("stuckNoiseGain", self.stuck_noise_gain),
            ("stuckVelThreshold", self.stuck_vel_threshold),
            ("progressEps", self.progress_eps),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Negative { name, value });
            }
        }
        for (name, value) in [("repRange", self.rep_range), ("forceCap", self.force_cap)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::NotPositive { name, value });
            }
        }
        let unit = [
            ("damping", self.damping),
            ("backwardScaleMin", self.backward_scale_min),
        ];
        for (name, value) in unit {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::OutOfRange {
                    name,
                    value,
                    min: 0.0,
                    max: 1.0,
                });
            }
        }
        Ok(())
    }
}

// ============================================================================
// RRT PARAMS
// ============================================================================

/// Tree growth constants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RrtParams {
    /// Maximum edge length per extension.
    pub step_size: f64,
    /// Probability of sampling the goal instead of a uniform point.
    pub goal_bias: f64,
    /// A node this close to the goal terminates the search.
    pub goal_radius: f64,
    /// Clearance added to every obstacle radius during edge checks.
    pub margin: f64,
    /// Growth stops once the tree holds this many nodes.
    pub max_nodes: usize,
}

impl Default for RrtParams {
    fn default() -> Self {
        Self {
            step_size: 0.04,
            goal_bias: 0.08,
            goal_radius: 0.035,
            margin: 0.008,
            max_nodes: 4000,
        }
    }
}

impl RrtParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("stepSize", self.step_size),
            ("goalRadius", self.goal_radius),
            ("maxNodes", self.max_nodes as f64),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::NotPositive { name, value });
            }
        }
        if !self.margin.is_finite() || self.margin < 0.0 {
            return Err(ConfigError::Negative {
                name: "margin",
                value: self.margin,
            });
        }
        if !(0.0..=1.0).contains(&self.goal_bias) {
            return Err(ConfigError::OutOfRange {
                name: "goalBias",
                value: self.goal_bias,
                min: 0.0,
                max: 1.0,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert_eq!(ForceParams::default().validate(), Ok(()));
        assert_eq!(RrtParams::default().validate(), Ok(()));
    }

    #[test]
    fn goal_bias_above_one_rejected() {
        let params = RrtParams {
            goal_bias: 1.5,
            ..RrtParams::default()
        };
        assert!(matches!(
            params.validate(),
            Err(ConfigError::OutOfRange { name: "goalBias", .. })
        ));
    }

    #[test]
    fn empty_node_budget_rejected() {
        let params = RrtParams {
            max_nodes: 0,
            ..RrtParams::default()
        };
        assert!(matches!(
            params.validate(),
            Err(ConfigError::NotPositive { name: "maxNodes", .. })
        ));
    }

    #[test]
    fn negative_gain_rejected() {
        let params = ForceParams {
            k_rep: -0.1,
            ..ForceParams::default()
        };
        assert!(matches!(
            params.validate(),
            Err(ConfigError::Negative { name: "kRep", .. })
        ));
    }

    #[test]
    fn zero_rep_range_rejected() {
        let params = ForceParams {
            rep_range: 0.0,
            ..ForceParams::default()
        };
        assert!(matches!(
            params.validate(),
            Err(ConfigError::NotPositive { name: "repRange", .. })
        ));
    }

    #[test]
    fn damping_above_one_rejected() {
        let params = ForceParams {
            damping: 1.5,
            ..ForceParams::default()
        };
        assert!(matches!(
            params.validate(),
            Err(ConfigError::OutOfRange { name: "damping", .. })
        ));
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let params: ForceParams =
            serde_json::from_str(r#"{ "kAtt": 3.0, "stuckWarmupSteps": 10 }"#).unwrap();
        assert_eq!(params.k_att, 3.0);
        assert_eq!(params.stuck_warmup_steps, 10);
        assert_eq!(params.force_cap, ForceParams::default().force_cap);
    }

    #[test]
    fn rrt_defaults_match_reference() {
        let p = RrtParams::default();
        assert_eq!(p.step_size, 0.04);
        assert_eq!(p.goal_bias, 0.08);
        assert_eq!(p.goal_radius, 0.035);
        assert_eq!(p.margin, 0.008);
        assert_eq!(p.max_nodes, 4000);
    }
}

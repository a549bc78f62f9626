pub mod parser;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use log::debug;
use thiserror::Error;

/// Number of elements in a [`JointState`] feature vector.
pub const STATE_DIM: usize = 14;

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("at least 2 samples are needed to infer the sampling interval")]
    TooFewSamples,
    #[error("step duration {step_duration} is shorter than the sampling interval {time_diff}")]
    StepDurationTooShort { step_duration: f64, time_diff: f64 },
    #[error("heading is undefined at step {idx}: no horizontal displacement and no horizontal velocity")]
    DegenerateHeading { idx: usize },
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
/// Kinematic state of the acting agent concatenated with the observed state
/// of the other agent. The acting agent carries its goal, preferred speed and
/// heading; only position, velocity and radius are observable on the other.
pub struct JointState {
    pub px: f32,
    pub py: f32,
    pub vx: f32,
    pub vy: f32,
    pub r: f32,
    pub pgx: f32,
    pub pgy: f32,
    pub v_pref: f32,
    pub theta: f32,
    pub px1: f32,
    pub py1: f32,
    pub vx1: f32,
    pub vy1: f32,
    pub r1: f32,
}

impl JointState {
    /// Flattens the state into the fixed network input layout.
    pub fn to_array(self) -> [f32; STATE_DIM] {
        [
            self.px,
            self.py,
            self.vx,
            self.vy,
            self.r,
            self.pgx,
            self.pgy,
            self.v_pref,
            self.theta,
            self.px1,
            self.py1,
            self.vx1,
            self.vy1,
            self.r1,
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
/// A training sample: a joint state and its discounted time-to-arrival value.
pub struct StateValuePair {
    pub state: JointState,
    pub value: f32,
}

/// One agent's recorded path through a two-agent episode, together with the
/// scene parameters of that agent.
#[derive(Debug, Clone)]
pub struct Trajectory {
    /// Discount factor converting remaining travel time into a target value.
    pub gamma: f64,
    pub goal_x: f64,
    pub goal_y: f64,
    pub radius: f64,
    pub v_pref: f64,
    /// Timestamps as recorded, assumed uniformly spaced.
    pub times: Vec<f64>,
    /// Indexed as `[time step][agent][xy]`; agent 0 is the acting agent.
    pub positions: Vec<[[f64; 2]; 2]>,
    /// Real-time interval between consecutive retained samples.
    pub step_duration: f64,
}

impl Trajectory {
    /// Reduces the trajectory to one sample per `step_duration` and emits a
    /// state-value pair for every interior retained step. The first and last
    /// retained steps carry no finite-difference velocity and are skipped, so
    /// a trajectory with fewer than 3 retained steps yields no pairs.
    pub fn state_value_pairs(&self) -> Result<Vec<StateValuePair>, ExtractError> {
        if self.times.len() < 2 {
            return Err(ExtractError::TooFewSamples);
        }

        let time_diff = self.times[1] - self.times[0];
        let stride = (self.step_duration / time_diff) as usize;

        if stride == 0 {
            return Err(ExtractError::StepDurationTooShort {
                step_duration: self.step_duration,
                time_diff,
            });
        }

        let positions = self
            .positions
            .iter()
            .copied()
            .step_by(stride)
            .collect::<Vec<_>>();
        let steps = positions.len();

        debug!("reduced number of steps: {}", steps);

        let mut pairs = Vec::new();

        for idx in 1..steps.saturating_sub(1) {
            let pos = positions[idx][0];
            let prev_pos = positions[idx - 1][0];
            let next_pos = positions[idx + 1][0];
            let vx = (pos[0] - prev_pos[0]) / self.step_duration;
            let vy = (pos[1] - prev_pos[1]) / self.step_duration;
            let theta = legacy_heading(vx, next_pos[0] - pos[0], next_pos[1] - pos[1])
                .ok_or(ExtractError::DegenerateHeading { idx })?;

            let pos1 = positions[idx][1];
            let prev_pos1 = positions[idx - 1][1];
            let vx1 = (pos1[0] - prev_pos1[0]) / self.step_duration;
            let vy1 = (pos1[1] - prev_pos1[1]) / self.step_duration;

            // NOTE: idx counts retained steps but indexes the raw timestamps
            // here. Kept for parity with previously trained weights.
            let remaining = (self.times[self.times.len() - 1] - self.times[idx]) * self.v_pref;

            pairs.push(StateValuePair {
                state: JointState {
                    px: pos[0] as f32,
                    py: pos[1] as f32,
                    vx: vx as f32,
                    vy: vy as f32,
                    r: self.radius as f32,
                    pgx: self.goal_x as f32,
                    pgy: self.goal_y as f32,
                    v_pref: self.v_pref as f32,
                    theta: theta as f32,
                    px1: pos1[0] as f32,
                    py1: pos1[1] as f32,
                    vx1: vx1 as f32,
                    vy1: vy1 as f32,
                    r1: self.radius as f32,
                },
                value: self.gamma.powf(remaining) as f32,
            });
        }

        Ok(pairs)
    }
}

/// One-quadrant heading of the upcoming displacement `(dx, dy)`.
///
/// Kept as `atan` rather than `atan2` for parity with previously trained
/// weights; leftward headings fold into the right half-plane. With no
/// horizontal displacement the sign of `vx` decides between `0` and `-pi`,
/// and `None` is returned when that is ambiguous too.
fn legacy_heading(vx: f64, dx: f64, dy: f64) -> Option<f64> {
    if dx == 0.0 {
        if vx > 0.0 {
            Some(0.0)
        } else if vx < 0.0 {
            Some(-std::f64::consts::PI)
        } else {
            None
        }
    } else {
        Some((dy / dx).atan())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trajectory(positions: Vec<[[f64; 2]; 2]>, step_duration: f64) -> Trajectory {
        let times = (0..positions.len()).map(|t| t as f64).collect();

        Trajectory {
            gamma: 0.9,
            goal_x: 0.0,
            goal_y: 0.0,
            radius: 0.3,
            v_pref: 1.0,
            times,
            positions,
            step_duration,
        }
    }

    /// Agent 0 walks along x at unit speed, agent 1 stands at (5, 5).
    fn unit_speed_positions(steps: usize) -> Vec<[[f64; 2]; 2]> {
        (0..steps)
            .map(|t| [[t as f64, 0.0], [5.0, 5.0]])
            .collect()
    }

    #[test]
    fn test_interior_steps_emit_pairs() {
        let traj = trajectory(unit_speed_positions(5), 1.0);
        let pairs = traj.state_value_pairs().unwrap();

        assert_eq!(pairs.len(), 3);
    }

    #[test]
    fn test_unit_speed_scenario() {
        let traj = trajectory(unit_speed_positions(5), 1.0);
        let pairs = traj.state_value_pairs().unwrap();

        for (offset, pair) in pairs.iter().enumerate() {
            let t = (offset + 1) as f64;

            assert!((pair.state.px - t as f32).abs() < 1e-6);
            assert!((pair.state.vx - 1.0).abs() < 1e-6);
            assert!(pair.state.vy.abs() < 1e-6);
            assert!(pair.state.theta.abs() < 1e-6);
            assert!((pair.state.r - 0.3).abs() < 1e-6);
            assert!((pair.state.v_pref - 1.0).abs() < 1e-6);
            assert!((pair.state.px1 - 5.0).abs() < 1e-6);
            assert!((pair.state.py1 - 5.0).abs() < 1e-6);
            assert!(pair.state.vx1.abs() < 1e-6);
            assert!(pair.state.vy1.abs() < 1e-6);

            let expected = 0.9f64.powf(4.0 - t) as f32;
            assert!((pair.value - expected).abs() < 1e-6);
        }
    }

    #[test]
    fn test_values_stay_in_unit_interval() {
        let traj = trajectory(unit_speed_positions(12), 1.0);

        for pair in traj.state_value_pairs().unwrap() {
            assert!(0.0 < pair.value && pair.value <= 1.0);
        }
    }

    #[test]
    fn test_longer_step_duration_reduces_pairs() {
        let positions = unit_speed_positions(5);

        let dense = trajectory(positions.clone(), 1.0);
        assert_eq!(dense.state_value_pairs().unwrap().len(), 3);

        // Stride 2 keeps samples 0, 2 and 4, leaving a single interior step.
        let sparse = trajectory(positions, 2.0);
        let pairs = sparse.state_value_pairs().unwrap();
        assert_eq!(pairs.len(), 1);
        assert!((pairs[0].state.px - 2.0).abs() < 1e-6);
        assert!((pairs[0].state.vx - 1.0).abs() < 1e-6);

        // The target is discounted by the raw timestamp at the retained
        // index, not by the retained sample's own timestamp.
        let expected = 0.9f64.powf(4.0 - 1.0) as f32;
        assert!((pairs[0].value - expected).abs() < 1e-6);
    }

    #[test]
    fn test_short_trajectory_yields_no_pairs() {
        let traj = trajectory(unit_speed_positions(2), 1.0);

        assert!(traj.state_value_pairs().unwrap().is_empty());
    }

    #[test]
    fn test_single_sample_is_rejected() {
        let traj = trajectory(unit_speed_positions(1), 1.0);

        assert!(matches!(
            traj.state_value_pairs(),
            Err(ExtractError::TooFewSamples)
        ));
    }

    #[test]
    fn test_step_duration_below_sampling_interval_is_rejected() {
        let traj = trajectory(unit_speed_positions(5), 0.5);

        assert!(matches!(
            traj.state_value_pairs(),
            Err(ExtractError::StepDurationTooShort { .. })
        ));
    }

    #[test]
    fn test_stationary_agent_has_no_heading() {
        let positions = (0..5).map(|_| [[1.0, 1.0], [5.0, 5.0]]).collect();
        let traj = trajectory(positions, 1.0);

        assert!(matches!(
            traj.state_value_pairs(),
            Err(ExtractError::DegenerateHeading { idx: 1 })
        ));
    }

    #[test]
    fn test_heading_with_zero_horizontal_displacement() {
        // x advances, then freezes while y keeps moving: the heading falls
        // back to the sign of vx.
        let positions = vec![
            [[0.0, 0.0], [5.0, 5.0]],
            [[1.0, 0.0], [5.0, 5.0]],
            [[1.0, 1.0], [5.0, 5.0]],
        ];
        let traj = trajectory(positions, 1.0);
        let pairs = traj.state_value_pairs().unwrap();

        assert_eq!(pairs.len(), 1);
        assert!(pairs[0].state.theta.abs() < 1e-6);

        let positions = vec![
            [[1.0, 0.0], [5.0, 5.0]],
            [[0.0, 0.0], [5.0, 5.0]],
            [[0.0, 1.0], [5.0, 5.0]],
        ];
        let traj = trajectory(positions, 1.0);
        let pairs = traj.state_value_pairs().unwrap();

        assert!((pairs[0].state.theta + std::f32::consts::PI).abs() < 1e-6);
    }

    #[test]
    fn test_leftward_heading_folds_onto_zero() {
        // One-quadrant arctangent: a pure leftward displacement reads as
        // heading 0, not pi.
        let positions = (0..5).map(|t| [[-(t as f64), 0.0], [5.0, 5.0]]).collect();
        let traj = trajectory(positions, 1.0);

        for pair in traj.state_value_pairs().unwrap() {
            assert!(pair.state.theta.abs() < 1e-6);
            assert!((pair.state.vx + 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_to_array_layout() {
        let state = JointState {
            px: 1.0,
            py: 2.0,
            vx: 3.0,
            vy: 4.0,
            r: 5.0,
            pgx: 6.0,
            pgy: 7.0,
            v_pref: 8.0,
            theta: 9.0,
            px1: 10.0,
            py1: 11.0,
            vx1: 12.0,
            vy1: 13.0,
            r1: 14.0,
        };

        assert_eq!(
            state.to_array(),
            [
                1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0, 11.0, 12.0, 13.0, 14.0,
            ]
        );
    }
}

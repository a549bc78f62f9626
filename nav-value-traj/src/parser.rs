use crate::Trajectory;
use std::{fs, path::Path};
use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("a trajectory log needs 2 header lines and at least 1 data line")]
    TooShort,
    #[error("line {line}: expected {expected} tokens, found {found}")]
    TokenCount {
        line: usize,
        expected: usize,
        found: usize,
    },
    #[error("line {line}: {token:?} is not a number")]
    InvalidNumber { line: usize, token: String },
    #[error("line {line}: {token:?} is not an (x,y) coordinate")]
    InvalidCoordinate { line: usize, token: String },
    #[error("failed to read trajectory log: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
/// Scene parameters of one agent, as given by one header line of the log.
pub struct AgentParams {
    pub goal_x: f64,
    pub goal_y: f64,
    pub radius: f64,
    pub v_pref: f64,
}

/// A parsed two-agent trajectory log: both agents' scene parameters plus the
/// time/position history they share.
#[derive(Debug, Clone)]
pub struct TrajectoryLog {
    pub agents: [AgentParams; 2],
    pub times: Vec<f64>,
    /// Indexed as `[time step][agent][xy]`.
    pub positions: Vec<[[f64; 2]; 2]>,
}

impl TrajectoryLog {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ParseError> {
        Self::parse(&fs::read_to_string(path)?)
    }

    /// Parses a log of the form:
    ///
    /// ```text
    /// goal_x goal_y radius v_pref      <- agent 0
    /// goal_x goal_y radius v_pref      <- agent 1
    /// time (x0,y0) (x1,y1)             <- one line per time step
    /// ```
    pub fn parse(source: &str) -> Result<Self, ParseError> {
        let mut lines = source.lines().enumerate();

        let agent0 = parse_header(lines.next().ok_or(ParseError::TooShort)?)?;
        let agent1 = parse_header(lines.next().ok_or(ParseError::TooShort)?)?;

        let mut times = Vec::new();
        let mut positions = Vec::new();

        for (index, line) in lines {
            let (time, position) = parse_step(index, line)?;
            times.push(time);
            positions.push(position);
        }

        if times.is_empty() {
            return Err(ParseError::TooShort);
        }

        Ok(Self {
            agents: [agent0, agent1],
            times,
            positions,
        })
    }

    /// Builds both training perspectives of the episode. The first acts as
    /// agent 0; the second swaps the agent order so that agent 1 becomes the
    /// acting agent, observing agent 0 as the other one.
    pub fn trajectories(&self, gamma: f64, step_duration: f64) -> (Trajectory, Trajectory) {
        (
            self.trajectory(0, gamma, step_duration),
            self.trajectory(1, gamma, step_duration),
        )
    }

    fn trajectory(&self, agent: usize, gamma: f64, step_duration: f64) -> Trajectory {
        let params = self.agents[agent];
        let positions = if agent == 0 {
            self.positions.clone()
        } else {
            self.positions.iter().map(|&[p0, p1]| [p1, p0]).collect()
        };

        Trajectory {
            gamma,
            goal_x: params.goal_x,
            goal_y: params.goal_y,
            radius: params.radius,
            v_pref: params.v_pref,
            times: self.times.clone(),
            positions,
            step_duration,
        }
    }
}

fn parse_header((index, line): (usize, &str)) -> Result<AgentParams, ParseError> {
    let tokens = line.split_whitespace().collect::<Vec<_>>();

    if tokens.len() != 4 {
        return Err(ParseError::TokenCount {
            line: index + 1,
            expected: 4,
            found: tokens.len(),
        });
    }

    Ok(AgentParams {
        goal_x: parse_number(index, tokens[0])?,
        goal_y: parse_number(index, tokens[1])?,
        radius: parse_number(index, tokens[2])?,
        v_pref: parse_number(index, tokens[3])?,
    })
}

fn parse_step(index: usize, line: &str) -> Result<(f64, [[f64; 2]; 2]), ParseError> {
    let tokens = line.split_whitespace().collect::<Vec<_>>();

    if tokens.len() != 3 {
        return Err(ParseError::TokenCount {
            line: index + 1,
            expected: 3,
            found: tokens.len(),
        });
    }

    Ok((
        parse_number(index, tokens[0])?,
        [
            parse_coordinate(index, tokens[1])?,
            parse_coordinate(index, tokens[2])?,
        ],
    ))
}

fn parse_coordinate(index: usize, token: &str) -> Result<[f64; 2], ParseError> {
    let stripped = token
        .chars()
        .filter(|&c| c != '(' && c != ')')
        .collect::<String>();
    let mut parts = stripped.split(',');

    match (parts.next(), parts.next(), parts.next()) {
        (Some(x), Some(y), None) => Ok([parse_number(index, x)?, parse_number(index, y)?]),
        _ => Err(ParseError::InvalidCoordinate {
            line: index + 1,
            token: token.to_string(),
        }),
    }
}

fn parse_number(index: usize, token: &str) -> Result<f64, ParseError> {
    token.parse().map_err(|_| ParseError::InvalidNumber {
        line: index + 1,
        token: token.to_string(),
    })
}

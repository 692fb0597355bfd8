//! Parameter space — per-parameter axes expanded into a discrete grid.
//!
//! Each axis is either an explicit list of values or an inclusive
//! `{start, end, step}` range. The expanded grid is sorted and deduplicated
//! per axis, so grid points are stable indices that heuristic search can
//! step between.

use rand::Rng;
use serde::{Deserialize, Serialize};
use trendsim_core::StrategyParams;

use crate::config::ConfigError;

/// Tolerance for float range end points.
const RANGE_EPSILON: f64 = 1e-9;

/// One parameter's candidate values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Axis<T> {
    Values(Vec<T>),
    Range { start: T, end: T, step: T },
}

impl Axis<usize> {
    pub fn expand(&self, name: &str) -> Result<Vec<usize>, ConfigError> {
        let mut values = match self {
            Axis::Values(v) => v.clone(),
            Axis::Range { start, end, step } => {
                if *step == 0 || start > end {
                    return Err(ConfigError::InvalidSpace(format!(
                        "{name}: range needs step > 0 and start <= end"
                    )));
                }
                (*start..=*end).step_by(*step).collect()
            }
        };
        values.sort_unstable();
        values.dedup();
        if values.is_empty() {
            return Err(ConfigError::InvalidSpace(format!("{name}: no values")));
        }
        Ok(values)
    }
}

impl Axis<f64> {
    pub fn expand(&self, name: &str) -> Result<Vec<f64>, ConfigError> {
        let mut values = match self {
            Axis::Values(v) => v.clone(),
            Axis::Range { start, end, step } => {
                let ok = start.is_finite() && end.is_finite() && step.is_finite();
                if !ok || *step <= 0.0 || start > end {
                    return Err(ConfigError::InvalidSpace(format!(
                        "{name}: range needs finite bounds, step > 0 and start <= end"
                    )));
                }
                let n = ((end - start) / step + RANGE_EPSILON).floor() as usize;
                (0..=n).map(|i| start + step * i as f64).collect()
            }
        };
        if values.iter().any(|v| !v.is_finite()) {
            return Err(ConfigError::InvalidSpace(format!("{name}: non-finite value")));
        }
        values.sort_by(f64::total_cmp);
        values.dedup();
        if values.is_empty() {
            return Err(ConfigError::InvalidSpace(format!("{name}: no values")));
        }
        Ok(values)
    }
}

/// Candidate values for every strategy parameter. Missing axes take the
/// default space's values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParamSpace {
    pub short_length: Axis<usize>,
    pub long_length: Axis<usize>,
    pub signal_length: Axis<usize>,
    pub entry_threshold: Axis<f64>,
    pub exit_threshold: Axis<f64>,
    pub channel_length: Axis<usize>,
}

impl ParamSpace {
    /// A space holding exactly one combination.
    pub fn single(params: &StrategyParams) -> Self {
        Self {
            short_length: Axis::Values(vec![params.short_length]),
            long_length: Axis::Values(vec![params.long_length]),
            signal_length: Axis::Values(vec![params.signal_length]),
            entry_threshold: Axis::Values(vec![params.entry_threshold]),
            exit_threshold: Axis::Values(vec![params.exit_threshold]),
            channel_length: Axis::Values(vec![params.channel_length]),
        }
    }

    pub fn grid(&self) -> Result<ParamGrid, ConfigError> {
        Ok(ParamGrid {
            short_length: self.short_length.expand("short_length")?,
            long_length: self.long_length.expand("long_length")?,
            signal_length: self.signal_length.expand("signal_length")?,
            entry_threshold: self.entry_threshold.expand("entry_threshold")?,
            exit_threshold: self.exit_threshold.expand("exit_threshold")?,
            channel_length: self.channel_length.expand("channel_length")?,
        })
    }
}

impl Default for ParamSpace {
    fn default() -> Self {
        Self {
            short_length: Axis::Range {
                start: 5,
                end: 20,
                step: 5,
            },
            long_length: Axis::Range {
                start: 20,
                end: 60,
                step: 10,
            },
            signal_length: Axis::Values(vec![9]),
            entry_threshold: Axis::Values(vec![0.0]),
            exit_threshold: Axis::Values(vec![0.0]),
            channel_length: Axis::Values(vec![10, 20, 40]),
        }
    }
}

/// Index of one combination: position along each of the six axes.
pub type GridPoint = [usize; 6];

/// Expanded, sorted axes.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamGrid {
    pub short_length: Vec<usize>,
    pub long_length: Vec<usize>,
    pub signal_length: Vec<usize>,
    pub entry_threshold: Vec<f64>,
    pub exit_threshold: Vec<f64>,
    pub channel_length: Vec<usize>,
}

impl ParamGrid {
    fn dims(&self) -> GridPoint {
        [
            self.short_length.len(),
            self.long_length.len(),
            self.signal_length.len(),
            self.entry_threshold.len(),
            self.exit_threshold.len(),
            self.channel_length.len(),
        ]
    }

    /// Number of raw combinations, including ones with `short >= long`.
    pub fn size(&self) -> usize {
        self.dims().iter().product()
    }

    pub fn params_at(&self, point: GridPoint) -> StrategyParams {
        StrategyParams {
            short_length: self.short_length[point[0]],
            long_length: self.long_length[point[1]],
            signal_length: self.signal_length[point[2]],
            entry_threshold: self.entry_threshold[point[3]],
            exit_threshold: self.exit_threshold[point[4]],
            channel_length: self.channel_length[point[5]],
        }
    }

    /// Every combination with `short_length < long_length`, in axis order.
    pub fn combinations(&self) -> Vec<StrategyParams> {
        let mut out = Vec::new();
        for &short in &self.short_length {
            for &long in &self.long_length {
                // Skip invalid combinations (short >= long)
                if short >= long {
                    continue;
                }
                for &signal in &self.signal_length {
                    for &entry in &self.entry_threshold {
                        for &exit in &self.exit_threshold {
                            for &channel in &self.channel_length {
                                out.push(StrategyParams {
                                    short_length: short,
                                    long_length: long,
                                    signal_length: signal,
                                    entry_threshold: entry,
                                    exit_threshold: exit,
                                    channel_length: channel,
                                });
                            }
                        }
                    }
                }
            }
        }
        out
    }

    /// Points one grid step away along a single axis.
    pub fn neighbours(&self, point: GridPoint) -> Vec<GridPoint> {
        let dims = self.dims();
        let mut out = Vec::with_capacity(12);
        for axis in 0..6 {
            if point[axis] > 0 {
                let mut p = point;
                p[axis] -= 1;
                out.push(p);
            }
            if point[axis] + 1 < dims[axis] {
                let mut p = point;
                p[axis] += 1;
                out.push(p);
            }
        }
        out
    }

    pub fn random_point<R: Rng + ?Sized>(&self, rng: &mut R) -> GridPoint {
        let dims = self.dims();
        let mut p = [0; 6];
        for axis in 0..6 {
            p[axis] = rng.gen_range(0..dims[axis]);
        }
        p
    }

    /// First point, in axis order, whose params pass validation.
    pub fn first_valid_point(&self) -> Option<GridPoint> {
        let dims = self.dims();
        (0..self.size())
            .map(|mut index| {
                let mut p = [0; 6];
                for axis in (0..6).rev() {
                    p[axis] = index % dims[axis];
                    index /= dims[axis];
                }
                p
            })
            .find(|&p| self.params_at(p).validate().is_ok())
    }
}

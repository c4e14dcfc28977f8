use serde::Serialize;

use super::error::{CoreError, ensure_finite};

pub const SAFETY_CAP_YEARS: u32 = 120;

pub const WITHDRAWAL_EPSILON: f64 = 0.01;

// f64::MAX halves below one cent in ~1030 steps.
pub const MAX_BISECTION_ITERATIONS: u32 = 2048;

#[derive(Copy, Clone, Debug, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct Rate(f64);

impl Rate {
    pub const ZERO: Rate = Rate(0.0);

    /// Normalizes a user-entered rate: values of 1 or more are percentages and are divided by
    /// 100, anything below 1 is already a fraction. An input of exactly 1 therefore means 1%.
    pub fn from_input(value: f64) -> Result<Self, CoreError> {
        let value = ensure_finite("rate", value)?;
        if value >= 1.0 {
            Self::from_fraction(value / 100.0)
        } else {
            Self::from_fraction(value)
        }
    }

    pub fn from_fraction(value: f64) -> Result<Self, CoreError> {
        let value = ensure_finite("rate", value)?;
        if value < -1.0 {
            return Err(CoreError::RateBelowTotalLoss(value));
        }
        Ok(Self(value))
    }

    pub fn as_fraction(self) -> f64 {
        self.0
    }

    pub fn growth_factor(self) -> f64 {
        1.0 + self.0
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RateSchedule(Vec<Rate>);

impl RateSchedule {
    pub fn new(rates: Vec<Rate>) -> Self {
        Self(rates)
    }

    pub fn from_inputs(values: &[f64]) -> Result<Self, CoreError> {
        values
            .iter()
            .map(|&v| Rate::from_input(v))
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }

    pub fn rates(&self) -> &[Rate] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", rename_all_fields = "camelCase", tag = "kind")]
pub enum DepletionOutcome {
    Depleted { years: u32 },
    NeverDepletes { cap_years: u32 },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationResult {
    pub years_lasted: u32,
    pub cap_years: u32,
    pub trajectory: Vec<f64>,
}

impl SimulationResult {
    pub fn never_depletes(&self) -> bool {
        self.years_lasted >= self.cap_years
    }

    pub fn outcome(&self) -> DepletionOutcome {
        if self.never_depletes() {
            DepletionOutcome::NeverDepletes {
                cap_years: self.cap_years,
            }
        } else {
            DepletionOutcome::Depleted {
                years: self.years_lasted,
            }
        }
    }

    pub fn final_balance(&self) -> f64 {
        self.trajectory.last().copied().unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct WithdrawalSolveConfig {
    pub target_years: u32,
    pub safety_cap_years: u32,
    pub tolerance: f64,
    pub max_iterations: u32,
}

impl WithdrawalSolveConfig {
    pub fn new(target_years: u32) -> Self {
        Self {
            target_years,
            safety_cap_years: SAFETY_CAP_YEARS,
            tolerance: WITHDRAWAL_EPSILON,
            max_iterations: MAX_BISECTION_ITERATIONS,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawalSolveIteration {
    pub iteration: u32,
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub candidate: f64,
    pub years_lasted: u32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawalSolveResult {
    pub target_years: u32,
    pub safety_cap_years: u32,
    pub tolerance: f64,
    pub withdrawal: f64,
    pub years_lasted: u32,
    pub outcome: DepletionOutcome,
    pub trajectory: Vec<f64>,
    pub iterations: Vec<WithdrawalSolveIteration>,
    pub converged: bool,
    pub message: String,
}

impl WithdrawalSolveResult {
    pub fn never_depletes(&self) -> bool {
        matches!(self.outcome, DepletionOutcome::NeverDepletes { .. })
    }
}

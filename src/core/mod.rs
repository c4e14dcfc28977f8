mod engine;
mod error;
mod solver;
mod types;

pub use engine::{
    deplete, fixed_growth, fixed_growth_trajectory, variable_growth, variable_growth_trajectory,
};
pub use error::CoreError;
pub use solver::{optimize_withdrawal, solve_withdrawal};
pub use types::{
    DepletionOutcome, MAX_BISECTION_ITERATIONS, Rate, RateSchedule, SAFETY_CAP_YEARS,
    SimulationResult, WITHDRAWAL_EPSILON, WithdrawalSolveConfig, WithdrawalSolveIteration,
    WithdrawalSolveResult,
};

use log::{debug, warn};

use super::engine::run_depletion;
use super::error::{CoreError, ensure_amount, ensure_periods};
use super::types::{
    Rate, WithdrawalSolveConfig, WithdrawalSolveIteration, WithdrawalSolveResult,
};

pub fn optimize_withdrawal(balance: f64, rate: Rate, target_years: u32) -> Result<f64, CoreError> {
    solve_withdrawal(balance, rate, WithdrawalSolveConfig::new(target_years))
        .map(|result| result.withdrawal)
}

/// Bisects the withdrawal between zero and the full balance and returns the lower bound.
/// Candidates are simulated against `safety_cap_years`, not the target.
pub fn solve_withdrawal(
    balance: f64,
    rate: Rate,
    config: WithdrawalSolveConfig,
) -> Result<WithdrawalSolveResult, CoreError> {
    let balance = ensure_amount("balance", balance)?;
    validate_config(config)?;

    let mut iterations = Vec::new();
    let mut lo = 0.0;
    let mut hi = balance;
    let mut converged = true;
    let mut it = 0;

    while hi - lo > config.tolerance {
        if it >= config.max_iterations {
            converged = false;
            warn!(
                "withdrawal search hit {} iterations with bracket [{lo:.4}, {hi:.4}]",
                config.max_iterations
            );
            break;
        }
        let mid = (lo + hi) * 0.5;
        if mid <= lo || mid >= hi {
            converged = false;
            warn!("withdrawal search stalled at [{lo}, {hi}]; bracket below float resolution");
            break;
        }
        it += 1;

        let years_lasted = run_depletion(balance, mid, rate, config.safety_cap_years)?.years_lasted;
        iterations.push(WithdrawalSolveIteration {
            iteration: it,
            lower_bound: lo,
            upper_bound: hi,
            candidate: mid,
            years_lasted,
        });
        debug!("bisection step {it}: withdrawal {mid:.4} lasts {years_lasted} years");

        if years_lasted < config.target_years {
            hi = mid;
        } else {
            lo = mid;
        }
    }

    let plan = run_depletion(balance, lo, rate, config.safety_cap_years)?;
    let message = if plan.never_depletes() {
        format!(
            "A withdrawal of {lo:.2} never depletes the balance within {} years.",
            config.safety_cap_years
        )
    } else if converged {
        format!(
            "Solved maximum withdrawal of {lo:.2} lasting {} years.",
            plan.years_lasted
        )
    } else {
        "Search stopped before tolerance was met; returning best estimate.".to_string()
    };

    Ok(WithdrawalSolveResult {
        target_years: config.target_years,
        safety_cap_years: config.safety_cap_years,
        tolerance: config.tolerance,
        withdrawal: lo,
        years_lasted: plan.years_lasted,
        outcome: plan.outcome(),
        trajectory: plan.trajectory,
        iterations,
        converged,
        message,
    })
}

fn validate_config(config: WithdrawalSolveConfig) -> Result<(), CoreError> {
    ensure_periods("target_years", config.target_years)?;
    ensure_periods("safety_cap_years", config.safety_cap_years)?;
    ensure_periods("max_iterations", config.max_iterations)?;
    if !config.tolerance.is_finite() || config.tolerance <= 0.0 {
        return Err(CoreError::InvalidTolerance(config.tolerance));
    }
    Ok(())
}

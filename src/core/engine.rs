use log::debug;

use super::error::{CoreError, ensure_amount, ensure_bounded, ensure_periods};
use super::types::{Rate, RateSchedule, SimulationResult};

pub fn fixed_growth(principal: f64, rate: Rate, years: u32) -> Result<f64, CoreError> {
    let mut balance = ensure_amount("principal", principal)?;
    for period in 1..=years {
        balance = ensure_bounded(period, balance * rate.growth_factor())?;
    }
    Ok(balance)
}

pub fn fixed_growth_trajectory(
    principal: f64,
    rate: Rate,
    years: u32,
) -> Result<Vec<f64>, CoreError> {
    let mut balance = ensure_amount("principal", principal)?;
    let mut trajectory = Vec::with_capacity(years as usize + 1);
    trajectory.push(balance);
    for period in 1..=years {
        balance = ensure_bounded(period, balance * rate.growth_factor())?;
        trajectory.push(balance);
    }
    Ok(trajectory)
}

pub fn variable_growth(principal: f64, schedule: &RateSchedule) -> Result<f64, CoreError> {
    let principal = ensure_amount("principal", principal)?;
    schedule
        .rates()
        .iter()
        .zip(1..)
        .try_fold(principal, |balance, (rate, period)| {
            ensure_bounded(period, balance * rate.growth_factor())
        })
}

pub fn variable_growth_trajectory(
    principal: f64,
    schedule: &RateSchedule,
) -> Result<Vec<f64>, CoreError> {
    let mut balance = ensure_amount("principal", principal)?;
    let mut trajectory = Vec::with_capacity(schedule.len() + 1);
    trajectory.push(balance);
    for (rate, period) in schedule.rates().iter().zip(1..) {
        balance = ensure_bounded(period, balance * rate.growth_factor())?;
        trajectory.push(balance);
    }
    Ok(trajectory)
}

/// Withdraws `annual_expense` at the start of each period and grows whatever is left.
///
/// Runs until the balance hits zero or `cap_years` periods have elapsed. A result whose
/// `years_lasted` equals `cap_years` means the funds outlived the inspected horizon.
pub fn deplete(
    balance: f64,
    annual_expense: f64,
    rate: Rate,
    cap_years: u32,
) -> Result<SimulationResult, CoreError> {
    let balance = ensure_amount("balance", balance)?;
    let annual_expense = ensure_amount("annual_expense", annual_expense)?;
    let cap_years = ensure_periods("cap_years", cap_years)?;
    run_depletion(balance, annual_expense, rate, cap_years)
}

pub(crate) fn run_depletion(
    mut balance: f64,
    annual_expense: f64,
    rate: Rate,
    cap_years: u32,
) -> Result<SimulationResult, CoreError> {
    let mut trajectory = Vec::with_capacity(16);
    trajectory.push(balance);

    let mut years = 0;
    while balance > 0.0 && years < cap_years {
        years += 1;
        balance = ensure_bounded(years, withdraw_then_grow(balance, annual_expense, rate))?;
        trajectory.push(balance);
    }

    let result = SimulationResult {
        years_lasted: years,
        cap_years,
        trajectory,
    };
    debug!(
        "depletion with expense {annual_expense:.2} at rate {:.4}: {:?}",
        rate.as_fraction(),
        result.outcome()
    );
    Ok(result)
}

fn withdraw_then_grow(balance: f64, annual_expense: f64, rate: Rate) -> f64 {
    let remaining = balance - annual_expense;
    if remaining > 0.0 {
        remaining + remaining * rate.as_fraction()
    } else {
        0.0
    }
}

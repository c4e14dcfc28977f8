use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum CoreError {
    #[error("{field} must be a finite number, got {value}")]
    NonFinite { field: &'static str, value: f64 },
    #[error("{field} must be >= 0, got {value}")]
    Negative { field: &'static str, value: f64 },
    #[error("rate must not fall below -100%, got {0}")]
    RateBelowTotalLoss(f64),
    #[error("{field} must be > 0")]
    ZeroPeriods { field: &'static str },
    #[error("tolerance must be a positive finite number, got {0}")]
    InvalidTolerance(f64),
    #[error("balance overflowed in period {period}")]
    Overflow { period: u32 },
}

pub(crate) fn ensure_finite(field: &'static str, value: f64) -> Result<f64, CoreError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(CoreError::NonFinite { field, value })
    }
}

pub(crate) fn ensure_amount(field: &'static str, value: f64) -> Result<f64, CoreError> {
    let value = ensure_finite(field, value)?;
    if value < 0.0 {
        return Err(CoreError::Negative { field, value });
    }
    Ok(value)
}

pub(crate) fn ensure_periods(field: &'static str, periods: u32) -> Result<u32, CoreError> {
    if periods == 0 {
        return Err(CoreError::ZeroPeriods { field });
    }
    Ok(periods)
}

pub(crate) fn ensure_bounded(period: u32, balance: f64) -> Result<f64, CoreError> {
    if balance.is_finite() {
        Ok(balance)
    } else {
        Err(CoreError::Overflow { period })
    }
}

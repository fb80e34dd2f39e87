//! Swap amount policy.
//!
//! Exactly one of the four modes in [`AmountConfig`] must be switched on.
//! The chosen amount never exceeds the wallet balance.

use crate::error::BridgeError;
use rand::Rng;
use serde::Deserialize;

/// Decimal places a swap amount is fixed to before it is sent anywhere.
pub const AMOUNT_DECIMALS: i32 = 6;

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct AmountConfig {
    /// `[min, max]` in ETH
    pub amount_range: [f64; 2],
    /// `[min, max]` percent of the current balance
    pub percent_range: [f64; 2],
    pub use_amount_range: bool,
    pub use_percent: bool,
    pub use_min_amount: bool,
    pub use_max_amount: bool,
}

impl Default for AmountConfig {
    fn default() -> Self {
        Self {
            amount_range: [0.01, 0.02],
            percent_range: [50.0, 65.0],
            use_amount_range: true,
            use_percent: false,
            use_min_amount: false,
            use_max_amount: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AmountMode {
    AbsoluteRange { min: f64, max: f64 },
    PercentOfBalance { min: f64, max: f64 },
    FixedMinimum(f64),
    FixedMaximum(f64),
}

impl AmountConfig {
    /// Resolve the single active mode, validating its range.
    pub fn mode(&self) -> Result<AmountMode, BridgeError> {
        let active = [
            self.use_amount_range,
            self.use_percent,
            self.use_min_amount,
            self.use_max_amount,
        ]
        .iter()
        .filter(|on| **on)
        .count();

        match active {
            0 => {
                return Err(BridgeError::InvalidConfig {
                    reason: "No swap amount configuration is set to true".to_string(),
                })
            }
            1 => {}
            n => {
                return Err(BridgeError::InvalidConfig {
                    reason: format!("{} swap amount modes are enabled, expected exactly one", n),
                })
            }
        }

        if self.use_percent {
            let [min, max] = self.percent_range;
            check_range("percent_range", min, max)?;
            if max > 100.0 {
                return Err(BridgeError::InvalidConfig {
                    reason: format!("percent_range upper bound {} exceeds 100", max),
                });
            }
            return Ok(AmountMode::PercentOfBalance { min, max });
        }

        let [min, max] = self.amount_range;
        check_range("amount_range", min, max)?;

        Ok(if self.use_amount_range {
            AmountMode::AbsoluteRange { min, max }
        } else if self.use_min_amount {
            AmountMode::FixedMinimum(min)
        } else {
            AmountMode::FixedMaximum(max)
        })
    }
}

fn check_range(field: &str, min: f64, max: f64) -> Result<(), BridgeError> {
    if !(min.is_finite() && max.is_finite()) || min < 0.0 || min > max {
        return Err(BridgeError::InvalidConfig {
            reason: format!("{} [{}, {}] must be a non-negative, ordered range", field, min, max),
        });
    }
    Ok(())
}

impl AmountMode {
    /// Draw an amount in ETH for a wallet holding `balance` ETH.
    pub fn draw<R: Rng + ?Sized>(&self, balance: f64, rng: &mut R) -> f64 {
        match *self {
            AmountMode::AbsoluteRange { min, max } => uniform(rng, min, max),
            AmountMode::PercentOfBalance { min, max } => balance * uniform(rng, min, max) / 100.0,
            AmountMode::FixedMinimum(amount) | AmountMode::FixedMaximum(amount) => amount,
        }
    }
}

fn uniform<R: Rng + ?Sized>(rng: &mut R, min: f64, max: f64) -> f64 {
    if max <= min {
        min
    } else {
        rng.gen_range(min..=max)
    }
}

/// Round to [`AMOUNT_DECIMALS`] so the value formats as the same decimal
/// for the provider request and the on-chain transfer.
pub fn round_amount(amount: f64) -> f64 {
    let scale = 10f64.powi(AMOUNT_DECIMALS);
    (amount * scale).round() / scale
}

/// Amount to bridge for `balance` ETH, or why the wallet cannot swap.
pub fn compute_amount<R: Rng + ?Sized>(
    balance: f64,
    config: &AmountConfig,
    rng: &mut R,
) -> Result<f64, BridgeError> {
    let mode = config.mode()?;
    compute_with_mode(balance, &mode, rng)
}

pub fn compute_with_mode<R: Rng + ?Sized>(
    balance: f64,
    mode: &AmountMode,
    rng: &mut R,
) -> Result<f64, BridgeError> {
    let amount = round_amount(mode.draw(balance, rng));
    if amount > balance {
        return Err(BridgeError::InsufficientBalance {
            required: amount,
            available: balance,
        });
    }
    Ok(amount)
}

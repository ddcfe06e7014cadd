use serde::{Deserialize, Serialize};

use stockres_core::{DomainError, DomainResult, ValueObject};

use crate::stock::{Quantity, StockKeys, StockLevels};

/// A validated request to move `amount` from available into reserved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationRequest {
    pub keys: StockKeys,
    pub amount: Quantity,
}

impl ReservationRequest {
    pub fn new(keys: StockKeys, amount: Quantity) -> Self {
        Self { keys, amount }
    }

    /// Validate raw caller input.
    ///
    /// Rejects empty or identical keys and non-positive amounts.
    pub fn parse(
        available_key: impl Into<String>,
        reserved_key: impl Into<String>,
        required_amount: i64,
    ) -> DomainResult<Self> {
        Ok(Self {
            keys: StockKeys::parse(available_key, reserved_key)?,
            amount: Quantity::new(required_amount)?,
        })
    }
}

impl ValueObject for ReservationRequest {}

/// Wire code of an outcome, as returned by the store-side script.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ReservationResultCode {
    KeyNotExist = 1,
    EnoughAmount = 2,
    NotEnoughAmount = 3,
}

impl ReservationResultCode {
    pub fn as_i64(self) -> i64 {
        self as i64
    }
}

impl TryFrom<i64> for ReservationResultCode {
    type Error = DomainError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::KeyNotExist),
            2 => Ok(Self::EnoughAmount),
            3 => Ok(Self::NotEnoughAmount),
            other => Err(DomainError::validation(format!(
                "unknown reservation result code {other}"
            ))),
        }
    }
}

/// Outcome of one reservation attempt.
///
/// These are business results, never errors.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReservationOutcome {
    /// One or both counters are missing. Nothing was read or written.
    KeyNotExist,
    /// The reservation was applied; `remaining` is available after the decrement.
    EnoughAmount { remaining: i64 },
    /// Insufficient stock; `available` is the unchanged available quantity.
    NotEnoughAmount { available: i64 },
}

impl ReservationOutcome {
    pub fn code(&self) -> ReservationResultCode {
        match self {
            Self::KeyNotExist => ReservationResultCode::KeyNotExist,
            Self::EnoughAmount { .. } => ReservationResultCode::EnoughAmount,
            Self::NotEnoughAmount { .. } => ReservationResultCode::NotEnoughAmount,
        }
    }

    /// The current-amount field: post-decrement on success, unchanged on
    /// insufficiency, absent when a key is missing.
    pub fn current_amount(&self) -> Option<i64> {
        match self {
            Self::KeyNotExist => None,
            Self::EnoughAmount { remaining } => Some(*remaining),
            Self::NotEnoughAmount { available } => Some(*available),
        }
    }

    pub fn is_reserved(&self) -> bool {
        matches!(self, Self::EnoughAmount { .. })
    }

    /// Rebuild an outcome from its wire form `(code, current_amount)`.
    pub fn from_wire(code: i64, current_amount: Option<i64>) -> DomainResult<Self> {
        match (ReservationResultCode::try_from(code)?, current_amount) {
            (ReservationResultCode::KeyNotExist, None) => Ok(Self::KeyNotExist),
            (ReservationResultCode::EnoughAmount, Some(remaining)) => {
                Ok(Self::EnoughAmount { remaining })
            }
            (ReservationResultCode::NotEnoughAmount, Some(available)) => {
                Ok(Self::NotEnoughAmount { available })
            }
            (code, amount) => Err(DomainError::validation(format!(
                "result code {code:?} inconsistent with current amount {amount:?}"
            ))),
        }
    }
}

/// Result of evaluating a reservation against a snapshot.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Transition {
    pub outcome: ReservationOutcome,
    /// Levels to write back; `None` means no mutation.
    pub next: Option<StockLevels>,
}

/// The check-and-transfer decision, evaluated against a snapshot.
///
/// `levels` is `None` when either counter is missing. Stores must run this
/// (or an equivalent server-side script) as one indivisible unit.
pub fn decide(levels: Option<StockLevels>, amount: Quantity) -> DomainResult<Transition> {
    let Some(levels) = levels else {
        return Ok(Transition {
            outcome: ReservationOutcome::KeyNotExist,
            next: None,
        });
    };

    let required = amount.get();
    if levels.available < required {
        return Ok(Transition {
            outcome: ReservationOutcome::NotEnoughAmount {
                available: levels.available,
            },
            next: None,
        });
    }

    let reserved = levels
        .reserved
        .checked_add(required)
        .ok_or_else(|| DomainError::invariant("reserved counter would overflow"))?;
    let remaining = levels.available - required;

    Ok(Transition {
        outcome: ReservationOutcome::EnoughAmount { remaining },
        next: Some(StockLevels::new(remaining, reserved)),
    })
}

//! Reservation engine (application-level entry point).
//!
//! The engine is what callers (an order service, an HTTP handler) talk to.
//! It validates raw input, hands the whole check-and-transfer to the store
//! as one atomic unit, and reports the outcome:
//!
//! ```text
//! (available_key, reserved_key, required_amount)
//!   ↓
//! 1. Validate (positive amount, well-formed distinct keys)
//!   ↓
//! 2. Store executes check-and-transfer atomically
//!   ↓
//! 3. ReservationOutcome (KeyNotExist / EnoughAmount / NotEnoughAmount)
//! ```
//!
//! The engine holds no locks and performs no retries. Store failures are
//! returned unchanged; retry policy belongs to the caller.

use thiserror::Error;
use tracing::{debug, instrument, warn};

use stockres_core::{DomainError, ProductId};
use stockres_inventory::{
    Quantity, ReservationOutcome, ReservationRequest, StockKeys, StockLevels,
};

use crate::stock_store::{AsyncStockStore, StockStore, StockStoreError};

/// Reservation failure. Business outcomes are never reported here.
#[derive(Debug, Error)]
pub enum ReservationError {
    /// The caller broke the contract (non-positive amount, malformed keys).
    /// The store was not contacted.
    #[error("rejected before reaching the store: {0}")]
    Contract(#[from] DomainError),

    /// The store failed; see [`StockStoreError::is_retryable`].
    #[error(transparent)]
    Store(#[from] StockStoreError),
}

impl ReservationError {
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Contract(_) => false,
            Self::Store(e) => e.is_retryable(),
        }
    }
}

/// Atomic stock reservation over any [`StockStore`].
#[derive(Debug, Clone)]
pub struct ReservationEngine<S> {
    store: S,
}

impl<S> ReservationEngine<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_inner(self) -> S {
        self.store
    }

    fn validate(
        available_key: &str,
        reserved_key: &str,
        required_amount: i64,
    ) -> Result<ReservationRequest, ReservationError> {
        ReservationRequest::parse(available_key, reserved_key, required_amount).map_err(|e| {
            warn!(error = %e, "reservation rejected");
            ReservationError::Contract(e)
        })
    }

    fn product_request(
        product_id: ProductId,
        required_amount: i64,
    ) -> Result<ReservationRequest, ReservationError> {
        let amount = Quantity::new(required_amount).map_err(|e| {
            warn!(%product_id, error = %e, "reservation rejected");
            ReservationError::Contract(e)
        })?;
        Ok(ReservationRequest::new(StockKeys::for_product(product_id), amount))
    }
}

impl<S: StockStore> ReservationEngine<S> {
    /// Move `required_amount` from the available counter into the reserved one.
    #[instrument(skip(self), err)]
    pub fn reserve(
        &self,
        available_key: &str,
        reserved_key: &str,
        required_amount: i64,
    ) -> Result<ReservationOutcome, ReservationError> {
        let request = Self::validate(available_key, reserved_key, required_amount)?;
        self.reserve_request(&request)
    }

    /// Reserve against the conventional key pair of `product_id`.
    #[instrument(skip(self), err)]
    pub fn reserve_product(
        &self,
        product_id: ProductId,
        required_amount: i64,
    ) -> Result<ReservationOutcome, ReservationError> {
        let request = Self::product_request(product_id, required_amount)?;
        self.reserve_request(&request)
    }

    pub fn reserve_request(
        &self,
        request: &ReservationRequest,
    ) -> Result<ReservationOutcome, ReservationError> {
        let outcome = self.store.reserve(request)?;
        debug!(
            available_key = %request.keys.available(),
            code = ?outcome.code(),
            current_amount = ?outcome.current_amount(),
            "reservation attempted"
        );
        Ok(outcome)
    }

    /// Consistent read of both counters; `None` if either is missing.
    pub fn levels(&self, keys: &StockKeys) -> Result<Option<StockLevels>, ReservationError> {
        Ok(self.store.levels(keys)?)
    }
}

impl<S: AsyncStockStore> ReservationEngine<S> {
    /// Future-based [`ReservationEngine::reserve`].
    #[instrument(skip(self), err)]
    pub async fn reserve_async(
        &self,
        available_key: &str,
        reserved_key: &str,
        required_amount: i64,
    ) -> Result<ReservationOutcome, ReservationError> {
        let request = Self::validate(available_key, reserved_key, required_amount)?;
        self.reserve_request_async(&request).await
    }

    #[instrument(skip(self), err)]
    pub async fn reserve_product_async(
        &self,
        product_id: ProductId,
        required_amount: i64,
    ) -> Result<ReservationOutcome, ReservationError> {
        let request = Self::product_request(product_id, required_amount)?;
        self.reserve_request_async(&request).await
    }

    pub async fn reserve_request_async(
        &self,
        request: &ReservationRequest,
    ) -> Result<ReservationOutcome, ReservationError> {
        let outcome = self.store.reserve_async(request).await?;
        debug!(
            available_key = %request.keys.available(),
            code = ?outcome.code(),
            current_amount = ?outcome.current_amount(),
            "reservation attempted"
        );
        Ok(outcome)
    }

    pub async fn levels_async(
        &self,
        keys: &StockKeys,
    ) -> Result<Option<StockLevels>, ReservationError> {
        Ok(self.store.levels_async(keys).await?)
    }
}

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use stockres_inventory::{ReservationOutcome, ReservationRequest, StockKeys, StockLevels};

/// Stock store failure.
///
/// These are **infrastructure errors**. They are never folded into a
/// [`ReservationOutcome`]: a caller may sensibly retry a dropped connection
/// but never a missing key.
#[derive(Debug, Error)]
pub enum StockStoreError {
    /// The store could not be reached or the connection dropped.
    #[error("store connection error: {0}")]
    Connection(String),

    /// The store did not answer in time. The reservation may or may not
    /// have been applied.
    #[error("store timed out, outcome unknown: {0}")]
    Timeout(String),

    /// The store rejected or failed the command (e.g. a non-integer counter).
    #[error("store command failed: {0}")]
    Command(String),

    /// The store answered with something that is not a reservation reply.
    #[error("malformed store response: {0}")]
    MalformedResponse(String),

    /// In-process state was poisoned by a panicking writer.
    #[error("store lock poisoned")]
    Poisoned,
}

impl StockStoreError {
    /// Whether a caller-side retry is reasonable.
    ///
    /// Timeouts are included, but a retried timeout may double-reserve if
    /// the first attempt was applied.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Connection(_) | Self::Timeout(_))
    }

    /// Whether the outcome of the failed call is unknown.
    pub fn is_outcome_unknown(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}

/// Blocking counter store.
///
/// Implementations must:
/// - run `reserve` as one indivisible unit, serialized against every other
///   `reserve` on the same keys
/// - never create a missing counter
/// - mutate only on [`ReservationOutcome::EnoughAmount`]
/// - answer `levels` from a single consistent snapshot of both counters
pub trait StockStore: Send + Sync {
    /// Attempt the check-and-transfer described by `request`.
    fn reserve(&self, request: &ReservationRequest) -> Result<ReservationOutcome, StockStoreError>;

    /// Read both counters at once. `None` if either is missing.
    fn levels(&self, keys: &StockKeys) -> Result<Option<StockLevels>, StockStoreError>;
}

impl<S> StockStore for Arc<S>
where
    S: StockStore + ?Sized,
{
    fn reserve(&self, request: &ReservationRequest) -> Result<ReservationOutcome, StockStoreError> {
        (**self).reserve(request)
    }

    fn levels(&self, keys: &StockKeys) -> Result<Option<StockLevels>, StockStoreError> {
        (**self).levels(keys)
    }
}

/// Future-based counterpart of [`StockStore`], with the same atomicity contract.
#[async_trait]
pub trait AsyncStockStore: Send + Sync {
    async fn reserve_async(
        &self,
        request: &ReservationRequest,
    ) -> Result<ReservationOutcome, StockStoreError>;

    async fn levels_async(&self, keys: &StockKeys) -> Result<Option<StockLevels>, StockStoreError>;
}

#[async_trait]
impl<S> AsyncStockStore for Arc<S>
where
    S: AsyncStockStore + ?Sized,
{
    async fn reserve_async(
        &self,
        request: &ReservationRequest,
    ) -> Result<ReservationOutcome, StockStoreError> {
        (**self).reserve_async(request).await
    }

    async fn levels_async(&self, keys: &StockKeys) -> Result<Option<StockLevels>, StockStoreError> {
        (**self).levels_async(keys).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_errors() {
        assert!(StockStoreError::Connection("refused".into()).is_retryable());
        assert!(StockStoreError::Timeout("read".into()).is_retryable());
        assert!(!StockStoreError::Command("WRONGTYPE".into()).is_retryable());
        assert!(!StockStoreError::MalformedResponse("x".into()).is_retryable());
        assert!(!StockStoreError::Poisoned.is_retryable());
    }

    #[test]
    fn only_timeouts_leave_the_outcome_unknown() {
        assert!(StockStoreError::Timeout("read".into()).is_outcome_unknown());
        assert!(!StockStoreError::Connection("refused".into()).is_outcome_unknown());
    }

    #[test]
    fn timeout_display_warns_about_unknown_outcome() {
        let err = StockStoreError::Timeout("read timed out".into());
        assert!(err.to_string().contains("outcome unknown"));
    }
}

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use stockres_inventory::{ReservationOutcome, ReservationRequest, StockKeys, StockLevels, decide};

use super::r#trait::{AsyncStockStore, StockStore, StockStoreError};

/// In-memory counter store.
///
/// Intended for tests/dev. The write lock is the atomic unit: every
/// `reserve` holds it for the whole read-check-mutate sequence.
#[derive(Debug, Default)]
pub struct InMemoryStockStore {
    counters: RwLock<HashMap<String, i64>>,
}

impl InMemoryStockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Provision (or overwrite) a counter. Stands in for the external
    /// inventory process that owns counter lifecycle.
    pub fn set_counter(&self, key: impl Into<String>, value: i64) -> Result<(), StockStoreError> {
        let mut counters = self.counters.write().map_err(|_| StockStoreError::Poisoned)?;
        counters.insert(key.into(), value);
        Ok(())
    }

    /// Provision both counters of a pair.
    pub fn seed(&self, keys: &StockKeys, levels: StockLevels) -> Result<(), StockStoreError> {
        let mut counters = self.counters.write().map_err(|_| StockStoreError::Poisoned)?;
        counters.insert(keys.available().as_str().to_owned(), levels.available);
        counters.insert(keys.reserved().as_str().to_owned(), levels.reserved);
        Ok(())
    }

    pub fn counter(&self, key: &str) -> Result<Option<i64>, StockStoreError> {
        let counters = self.counters.read().map_err(|_| StockStoreError::Poisoned)?;
        Ok(counters.get(key).copied())
    }

    pub fn remove_counter(&self, key: &str) -> Result<Option<i64>, StockStoreError> {
        let mut counters = self.counters.write().map_err(|_| StockStoreError::Poisoned)?;
        Ok(counters.remove(key))
    }

    fn snapshot(counters: &HashMap<String, i64>, keys: &StockKeys) -> Option<StockLevels> {
        let available = counters.get(keys.available().as_str())?;
        let reserved = counters.get(keys.reserved().as_str())?;
        Some(StockLevels::new(*available, *reserved))
    }
}

impl StockStore for InMemoryStockStore {
    fn reserve(&self, request: &ReservationRequest) -> Result<ReservationOutcome, StockStoreError> {
        let mut counters = self.counters.write().map_err(|_| StockStoreError::Poisoned)?;

        let levels = Self::snapshot(&counters, &request.keys);
        let transition = decide(levels, request.amount)
            .map_err(|e| StockStoreError::Command(e.to_string()))?;

        if let Some(next) = transition.next {
            counters.insert(request.keys.available().as_str().to_owned(), next.available);
            counters.insert(request.keys.reserved().as_str().to_owned(), next.reserved);
        }

        Ok(transition.outcome)
    }

    fn levels(&self, keys: &StockKeys) -> Result<Option<StockLevels>, StockStoreError> {
        let counters = self.counters.read().map_err(|_| StockStoreError::Poisoned)?;
        Ok(Self::snapshot(&counters, keys))
    }
}

#[async_trait]
impl AsyncStockStore for InMemoryStockStore {
    async fn reserve_async(
        &self,
        request: &ReservationRequest,
    ) -> Result<ReservationOutcome, StockStoreError> {
        self.reserve(request)
    }

    async fn levels_async(&self, keys: &StockKeys) -> Result<Option<StockLevels>, StockStoreError> {
        self.levels(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use stockres_inventory::Quantity;

    fn keys() -> StockKeys {
        StockKeys::parse("test:product:1:available", "test:product:1:reserved").unwrap()
    }

    fn request(amount: i64) -> ReservationRequest {
        ReservationRequest::new(keys(), Quantity::new(amount).unwrap())
    }

    #[test]
    fn missing_reserved_counter_leaves_available_untouched() {
        let store = InMemoryStockStore::new();
        store.set_counter("test:product:1:available", 10).unwrap();

        let outcome = store.reserve(&request(5)).unwrap();

        assert_eq!(outcome, ReservationOutcome::KeyNotExist);
        assert_eq!(store.counter("test:product:1:available").unwrap(), Some(10));
        assert_eq!(store.counter("test:product:1:reserved").unwrap(), None);
    }

    #[test]
    fn missing_available_counter_is_not_created() {
        let store = InMemoryStockStore::new();
        store.set_counter("test:product:1:reserved", 0).unwrap();

        assert_eq!(store.reserve(&request(5)).unwrap(), ReservationOutcome::KeyNotExist);
        assert_eq!(store.counter("test:product:1:available").unwrap(), None);
        assert_eq!(store.counter("test:product:1:reserved").unwrap(), Some(0));
    }

    #[test]
    fn successful_reservation_updates_both_counters() {
        let store = InMemoryStockStore::new();
        store.seed(&keys(), StockLevels::new(10, 0)).unwrap();

        let outcome = store.reserve(&request(5)).unwrap();

        assert_eq!(outcome, ReservationOutcome::EnoughAmount { remaining: 5 });
        assert_eq!(store.levels(&keys()).unwrap(), Some(StockLevels::new(5, 5)));
    }

    #[test]
    fn removed_counter_rejects_reservation() {
        let store = InMemoryStockStore::new();
        store.seed(&keys(), StockLevels::new(10, 0)).unwrap();
        assert_eq!(store.remove_counter("test:product:1:reserved").unwrap(), Some(0));

        assert_eq!(store.reserve(&request(1)).unwrap(), ReservationOutcome::KeyNotExist);
        assert_eq!(store.levels(&keys()).unwrap(), None);
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 128,
            ..ProptestConfig::default()
        })]

        /// Property: any sequence of reservations conserves available + reserved
        /// and never drives available below zero.
        #[test]
        fn sequences_conserve_stock(
            initial_available in 0i64..500,
            initial_reserved in 0i64..500,
            amounts in prop::collection::vec(1i64..50, 1..40),
        ) {
            let store = InMemoryStockStore::new();
            let initial = StockLevels::new(initial_available, initial_reserved);
            store.seed(&keys(), initial).unwrap();

            let mut reserved_total = 0;
            for amount in amounts {
                let before = store.levels(&keys()).unwrap().unwrap();
                let outcome = store.reserve(&request(amount)).unwrap();
                let after = store.levels(&keys()).unwrap().unwrap();

                prop_assert_eq!(after.total(), initial.total());
                prop_assert!(after.available >= 0);
                match outcome {
                    ReservationOutcome::EnoughAmount { remaining } => {
                        prop_assert_eq!(remaining, before.available - amount);
                        reserved_total += amount;
                    }
                    ReservationOutcome::NotEnoughAmount { available } => {
                        prop_assert_eq!(available, before.available);
                        prop_assert_eq!(after, before);
                    }
                    ReservationOutcome::KeyNotExist => prop_assert!(false, "keys were seeded"),
                }
            }

            let last = store.levels(&keys()).unwrap().unwrap();
            prop_assert_eq!(last.reserved, initial_reserved + reserved_total);
        }
    }
}

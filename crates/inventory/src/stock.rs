use serde::{Deserialize, Serialize};

use stockres_core::{DomainError, DomainResult, ProductId, ValueObject};

/// Maximum counter key length in bytes.
pub const MAX_KEY_LENGTH: usize = 1024;

/// Prefix used by [`StockKeys::for_product`].
const PRODUCT_KEY_PREFIX: &str = "stock:product";

/// A strictly positive amount of stock.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Quantity(i64);

impl Quantity {
    pub fn new(amount: i64) -> DomainResult<Self> {
        if amount <= 0 {
            return Err(DomainError::validation(format!(
                "required amount must be positive, got {amount}"
            )));
        }
        Ok(Self(amount))
    }

    pub fn get(&self) -> i64 {
        self.0
    }
}

impl ValueObject for Quantity {}

impl TryFrom<i64> for Quantity {
    type Error = DomainError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Quantity> for i64 {
    fn from(value: Quantity) -> Self {
        value.0
    }
}

impl core::fmt::Display for Quantity {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Opaque identifier of one counter in the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CounterKey(String);

impl CounterKey {
    pub fn new(key: impl Into<String>) -> DomainResult<Self> {
        let key = key.into();
        if key.is_empty() {
            return Err(DomainError::validation("counter key cannot be empty"));
        }
        if key.len() > MAX_KEY_LENGTH {
            return Err(DomainError::validation(format!(
                "counter key exceeds maximum length of {MAX_KEY_LENGTH} bytes"
            )));
        }
        Ok(Self(key))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl ValueObject for CounterKey {}

impl TryFrom<String> for CounterKey {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<CounterKey> for String {
    fn from(value: CounterKey) -> Self {
        value.0
    }
}

impl AsRef<str> for CounterKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for CounterKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The available/reserved counter pair of one product.
///
/// Pairing is the caller's responsibility: the two keys are only checked to
/// be distinct, never to belong to the same product.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawStockKeys")]
pub struct StockKeys {
    available: CounterKey,
    reserved: CounterKey,
}

impl StockKeys {
    pub fn new(available: CounterKey, reserved: CounterKey) -> DomainResult<Self> {
        if available == reserved {
            return Err(DomainError::validation(format!(
                "available and reserved keys must differ (both are '{available}')"
            )));
        }
        Ok(Self {
            available,
            reserved,
        })
    }

    /// Parse both keys from raw strings.
    pub fn parse(available: impl Into<String>, reserved: impl Into<String>) -> DomainResult<Self> {
        Self::new(CounterKey::new(available)?, CounterKey::new(reserved)?)
    }

    /// Conventional key pair: `stock:product:{id}:available` / `stock:product:{id}:reserved`.
    pub fn for_product(product_id: ProductId) -> Self {
        Self {
            available: CounterKey(format!("{PRODUCT_KEY_PREFIX}:{product_id}:available")),
            reserved: CounterKey(format!("{PRODUCT_KEY_PREFIX}:{product_id}:reserved")),
        }
    }

    pub fn available(&self) -> &CounterKey {
        &self.available
    }

    pub fn reserved(&self) -> &CounterKey {
        &self.reserved
    }
}

impl ValueObject for StockKeys {}

#[derive(Deserialize)]
struct RawStockKeys {
    available: CounterKey,
    reserved: CounterKey,
}

impl TryFrom<RawStockKeys> for StockKeys {
    type Error = DomainError;

    fn try_from(raw: RawStockKeys) -> Result<Self, Self::Error> {
        Self::new(raw.available, raw.reserved)
    }
}

/// A consistent snapshot of both counters of one product.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockLevels {
    pub available: i64,
    pub reserved: i64,
}

impl StockLevels {
    pub fn new(available: i64, reserved: i64) -> Self {
        Self {
            available,
            reserved,
        }
    }

    /// `available + reserved`; conserved by every reservation.
    pub fn total(&self) -> i128 {
        self.available as i128 + self.reserved as i128
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantity_rejects_zero_and_negative() {
        assert!(matches!(Quantity::new(0), Err(DomainError::Validation(_))));
        assert!(matches!(Quantity::new(-3), Err(DomainError::Validation(_))));
        assert_eq!(Quantity::new(7).unwrap().get(), 7);
    }

    #[test]
    fn quantity_deserialization_validates() {
        let q: Quantity = serde_json::from_str("5").unwrap();
        assert_eq!(q.get(), 5);
        assert!(serde_json::from_str::<Quantity>("0").is_err());
    }

    #[test]
    fn counter_key_validation() {
        assert!(CounterKey::new("").is_err());
        assert!(CounterKey::new("a".repeat(MAX_KEY_LENGTH + 1)).is_err());
        assert!(CounterKey::new("a".repeat(MAX_KEY_LENGTH)).is_ok());
        assert_eq!(CounterKey::new("p:1:available").unwrap().as_str(), "p:1:available");
    }

    #[test]
    fn stock_keys_must_differ() {
        let err = StockKeys::parse("same", "same").unwrap_err();
        assert!(matches!(err, DomainError::Validation(msg) if msg.contains("must differ")));
    }

    #[test]
    fn deserialization_rejects_identical_keys() {
        let json = r#"{"available":"k","reserved":"k"}"#;
        assert!(serde_json::from_str::<StockKeys>(json).is_err());

        let json = r#"{"available":"a","reserved":"r"}"#;
        let keys: StockKeys = serde_json::from_str(json).unwrap();
        assert_eq!(keys.reserved().as_str(), "r");
    }

    #[test]
    fn product_convention() {
        let id: ProductId = "0190a1b2-0000-7000-8000-000000000001".parse().unwrap();
        let keys = StockKeys::for_product(id);
        assert_eq!(
            keys.available().as_str(),
            "stock:product:0190a1b2-0000-7000-8000-000000000001:available"
        );
        assert_eq!(
            keys.reserved().as_str(),
            "stock:product:0190a1b2-0000-7000-8000-000000000001:reserved"
        );
    }

    #[test]
    fn levels_total_does_not_overflow() {
        let levels = StockLevels::new(i64::MAX, i64::MAX);
        assert_eq!(levels.total(), 2 * i64::MAX as i128);
    }
}

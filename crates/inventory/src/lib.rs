//! Stock reservation domain.
//!
//! This crate contains the vocabulary of a reservation (quantities, counter
//! keys, outcomes) and the pure check-and-transfer decision, implemented as
//! deterministic domain logic (no IO, no storage). Stores execute the same
//! decision atomically against their own state.

pub mod reservation;
pub mod stock;

pub use reservation::{
    ReservationOutcome, ReservationRequest, ReservationResultCode, Transition, decide,
};
pub use stock::{CounterKey, MAX_KEY_LENGTH, Quantity, StockKeys, StockLevels};

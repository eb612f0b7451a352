//! Repository layer over the storage actor.
//!
//! # Responsibility
//! - Translate notecard use-cases into storage actor requests.
//! - Decode result rows into domain records.
//!
//! # Invariants
//! - Repository APIs return semantic errors (`NotFound`, `DuplicateId`,
//!   `InsufficientData`) in addition to storage transport errors.
//! - No SQL leaves this layer.

pub mod notecard_repo;

//! Notecard domain model.
//!
//! # Responsibility
//! - Define the records exchanged between the repository and its callers.
//! - Validate drafts coming from editing surfaces.
//!
//! # Invariants
//! - A `NotecardId` is unique among live notecards.
//! - Storage itself enforces nothing on `front`/`back` content; drafts do.

pub mod notecard;

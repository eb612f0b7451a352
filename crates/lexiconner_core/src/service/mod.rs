//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into editor and menu level APIs.
//! - Keep UI layers decoupled from storage details.

pub mod notecard_service;
pub mod quiz_timer;

//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate validation, engine calls and store persistence.
//! - Keep CLI and other hosts decoupled from storage details.

pub mod timer_service;
pub mod views;

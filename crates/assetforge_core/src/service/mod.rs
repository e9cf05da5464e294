//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Keep presentation and import callers decoupled from storage details.

pub mod import_service;
pub mod item_service;

//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate store calls into use-case level APIs.
//! - Keep CLI/HTTP layers decoupled from storage details.

pub mod catalog_service;

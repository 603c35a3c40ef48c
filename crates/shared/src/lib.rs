//! Shared types, errors, and configuration for Safe Harbor.
//!
//! This crate provides common types used across all other crates:
//! - Typed IDs for run correlation and company references
//! - Run lifecycle types (run kind, run state, legacy status strings)
//! - Application-wide error types
//! - Configuration management

pub mod config;
pub mod error;
pub mod types;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

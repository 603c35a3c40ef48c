//! Core fiscal valuation logic for Safe Harbor.
//!
//! This crate contains pure business logic with ZERO web or database
//! dependencies. All domain types, classification rules, and the
//! regulation-sensitive indexation arithmetic live here.
//!
//! # Modules
//!
//! - `indexation` - INPC month selection and restatement factor math
//! - `staging` - Source row classification and extraction filtering
//! - `progress` - Process-wide run progress registry

pub mod indexation;
pub mod progress;
pub mod staging;

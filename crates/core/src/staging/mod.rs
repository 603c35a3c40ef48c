//! Source row classification and extraction filtering.
//!
//! The costing path of each source ledger row is a closed variant
//! resolved by one pure function, tested independently of the
//! batch-insert loop that consumes it.

pub mod classify;
pub mod types;

pub use classify::{CostBasis, ResolvedCost, classify_cost_basis, is_candidate, resolve_cost};
pub use types::{AssetStatus, SourceAssetRow, StagedAsset};

//! INPC month selection and indexation arithmetic.
//!
//! Two pure stages: `month` resolves which calendar month's index value
//! pairs with the acquisition-month index; `calculator` derives the
//! restated balances and the 10%-of-MOI floor test from the two index
//! values. Both are deterministic and covered by exact-value tests.

pub mod calculator;
pub mod month;

pub use calculator::{IndexationError, IndexationInput, IndexationResult, restate};
pub use month::{MonthSelectionError, MonthTables, select_index_month};

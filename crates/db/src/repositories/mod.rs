//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the
//! application.

pub mod calculation;
pub mod company;
pub mod exchange_rate;
pub mod month_map;
pub mod price_index;
pub mod run_log;
pub mod staging;

pub use calculation::{CalculationError, CalculationRepository, NewCalculationResult, RunTotals};
pub use company::{CompanyError, CompanyRepository, CreateCompanyInput, UpdateCompanyInput};
pub use exchange_rate::{ExchangeRateError, ExchangeRateRepository};
pub use month_map::{MonthMapError, MonthMapRepository};
pub use price_index::{NewPriceIndex, PriceIndexError, PriceIndexRepository, PriceIndexStats};
pub use run_log::{RunLogError, RunLogRepository, StartRunInput};
pub use staging::{PurgeCounts, StagingError, StagingRepository};

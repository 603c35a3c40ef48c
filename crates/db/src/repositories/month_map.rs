//! Month-mapping table loader.
//!
//! Loads the disposal and fiscal month maps into the in-memory tables
//! consumed by the month-selection engine. Loaded once per run; the
//! maps are tiny (at most 12 rows each).

use sea_orm::{DatabaseConnection, DbErr, EntityTrait};

use safeharbor_core::indexation::MonthTables;

use crate::entities::{inpc_disposal_months, inpc_fiscal_months};

/// Error types for month-map loading.
#[derive(Debug, thiserror::Error)]
pub enum MonthMapError {
    /// A stored mapping row holds a month outside 1-12.
    #[error("month-map entry out of range: {0} -> {1}")]
    EntryOutOfRange(i32, i32),

    /// Database error.
    #[error("database error: {0}")]
    Database(#[from] DbErr),
}

fn to_pair(month: i32, index_month: i32) -> Result<(u32, u32), MonthMapError> {
    match (u32::try_from(month), u32::try_from(index_month)) {
        (Ok(m @ 1..=12), Ok(i @ 1..=12)) => Ok((m, i)),
        _ => Err(MonthMapError::EntryOutOfRange(month, index_month)),
    }
}

/// Month-map repository.
#[derive(Debug, Clone)]
pub struct MonthMapRepository {
    db: DatabaseConnection,
}

impl MonthMapRepository {
    /// Creates a new month-map repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Loads both mapping tables.
    ///
    /// # Errors
    ///
    /// Returns an error when a stored entry is out of the 1-12 range.
    pub async fn load_tables(&self) -> Result<MonthTables, MonthMapError> {
        let disposal = inpc_disposal_months::Entity::find()
            .all(&self.db)
            .await?
            .into_iter()
            .map(|row| to_pair(row.month, row.index_month))
            .collect::<Result<Vec<_>, _>>()?;

        let fiscal = inpc_fiscal_months::Entity::find()
            .all(&self.db)
            .await?
            .into_iter()
            .map(|row| to_pair(row.month, row.index_month))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(MonthTables::from_rows(disposal, fiscal))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_pair() {
        assert_eq!(to_pair(12, 6).unwrap(), (12, 6));
    }

    #[test]
    fn test_out_of_range_pair_rejected() {
        assert!(to_pair(0, 6).is_err());
        assert!(to_pair(13, 6).is_err());
        assert!(to_pair(3, -1).is_err());
    }
}

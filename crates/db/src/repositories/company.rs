//! Company configuration repository.
//!
//! Per-company staging configuration: source connection, optional
//! custom extraction query, active flag.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set,
};

use crate::entities::company_configs;

/// Error types for company configuration operations.
#[derive(Debug, thiserror::Error)]
pub enum CompanyError {
    /// Company not configured.
    #[error("company {0} is not configured")]
    NotFound(i32),

    /// Company exists but is deactivated.
    #[error("company {0} is configured but inactive")]
    Inactive(i32),

    /// Company id already configured.
    #[error("company {0} is already configured")]
    AlreadyExists(i32),

    /// Database error.
    #[error("database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for creating a company configuration.
#[derive(Debug, Clone)]
pub struct CreateCompanyInput {
    /// Company identifier in the source ledger.
    pub company_id: i32,
    /// Display name.
    pub name: String,
    /// Source ledger connection URL.
    pub source_url: String,
    /// Optional custom extraction query overriding the default.
    pub custom_query: Option<String>,
    /// Whether runs may be started for this company.
    pub active: bool,
}

/// Input for updating a company configuration. `None` fields are left
/// unchanged.
#[derive(Debug, Clone, Default)]
pub struct UpdateCompanyInput {
    /// New display name.
    pub name: Option<String>,
    /// New source ledger connection URL.
    pub source_url: Option<String>,
    /// New custom extraction query; `Some(None)` clears it.
    pub custom_query: Option<Option<String>>,
    /// New active flag.
    pub active: Option<bool>,
}

/// Company configuration repository.
#[derive(Debug, Clone)]
pub struct CompanyRepository {
    db: DatabaseConnection,
}

impl CompanyRepository {
    /// Creates a new company repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a company configuration.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyExists` when the company id is taken.
    pub async fn create(
        &self,
        input: CreateCompanyInput,
    ) -> Result<company_configs::Model, CompanyError> {
        let existing = company_configs::Entity::find_by_id(input.company_id)
            .one(&self.db)
            .await?;
        if existing.is_some() {
            return Err(CompanyError::AlreadyExists(input.company_id));
        }

        let now = chrono::Utc::now().into();
        let config = company_configs::ActiveModel {
            company_id: Set(input.company_id),
            name: Set(input.name),
            source_url: Set(input.source_url),
            custom_query: Set(input.custom_query),
            active: Set(input.active),
            created_at: Set(now),
            updated_at: Set(now),
        };

        Ok(config.insert(&self.db).await?)
    }

    /// Updates a company configuration.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the company is not configured.
    pub async fn update(
        &self,
        company_id: i32,
        input: UpdateCompanyInput,
    ) -> Result<company_configs::Model, CompanyError> {
        let existing = company_configs::Entity::find_by_id(company_id)
            .one(&self.db)
            .await?
            .ok_or(CompanyError::NotFound(company_id))?;

        let mut active: company_configs::ActiveModel = existing.into();
        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(source_url) = input.source_url {
            active.source_url = Set(source_url);
        }
        if let Some(custom_query) = input.custom_query {
            active.custom_query = Set(custom_query);
        }
        if let Some(flag) = input.active {
            active.active = Set(flag);
        }
        active.updated_at = Set(chrono::Utc::now().into());

        Ok(active.update(&self.db).await?)
    }

    /// Finds a company configuration by id.
    pub async fn find(
        &self,
        company_id: i32,
    ) -> Result<Option<company_configs::Model>, CompanyError> {
        Ok(company_configs::Entity::find_by_id(company_id)
            .one(&self.db)
            .await?)
    }

    /// Loads the configuration of a company that must be active.
    ///
    /// Used at run start: a missing or inactive company is a fatal
    /// configuration error for the run.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` or `Inactive` accordingly.
    pub async fn require_active(
        &self,
        company_id: i32,
    ) -> Result<company_configs::Model, CompanyError> {
        let config = self
            .find(company_id)
            .await?
            .ok_or(CompanyError::NotFound(company_id))?;
        if !config.active {
            return Err(CompanyError::Inactive(company_id));
        }
        Ok(config)
    }

    /// Lists all company configurations.
    pub async fn list(&self) -> Result<Vec<company_configs::Model>, CompanyError> {
        Ok(company_configs::Entity::find()
            .order_by_asc(company_configs::Column::CompanyId)
            .all(&self.db)
            .await?)
    }

    /// Deletes a company configuration.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the company is not configured.
    pub async fn delete(&self, company_id: i32) -> Result<(), CompanyError> {
        let result = company_configs::Entity::delete_many()
            .filter(company_configs::Column::CompanyId.eq(company_id))
            .exec(&self.db)
            .await?;
        if result.rows_affected == 0 {
            return Err(CompanyError::NotFound(company_id));
        }
        Ok(())
    }
}

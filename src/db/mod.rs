pub mod memory;
pub mod postgres;

use std::sync::Arc;

use async_trait::async_trait;
use log::info;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use crate::config::{Config, StoreBackend};
use crate::errors::AppError;
use crate::models::employee::{Employee, EmployeeFilter, EmployeeUpdate, NewEmployee};

pub use memory::MemoryEmployeeStore;
pub use postgres::PgEmployeeStore;

pub const NOT_FOUND_MESSAGE: &str = "Employee not found";

/// Persistence operations over the employee collection.
///
/// Lookups by identifier take the raw path segment: a value that is not a
/// valid identifier fails with [`AppError::Store`], a valid one with no
/// matching record fails with [`AppError::NotFound`].
#[async_trait]
pub trait EmployeeStore: Send + Sync {
    async fn create(&self, employee: NewEmployee) -> Result<Employee, AppError>;

    async fn list_all(&self) -> Result<Vec<Employee>, AppError>;

    async fn list_by_filter(&self, filter: &EmployeeFilter) -> Result<Vec<Employee>, AppError>;

    async fn get_by_id(&self, id: &str) -> Result<Employee, AppError>;

    async fn update_by_id(&self, id: &str, update: EmployeeUpdate) -> Result<Employee, AppError>;

    /// Returns the record as it was before removal.
    async fn delete_by_id(&self, id: &str) -> Result<Employee, AppError>;
}

pub fn parse_id(id: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(id)
        .map_err(|err| AppError::Store(format!("invalid employee id \"{}\": {}", id, err)))
}

pub fn not_found() -> AppError {
    AppError::NotFound(NOT_FOUND_MESSAGE.to_string())
}

pub async fn connect(config: &Config) -> Result<Arc<dyn EmployeeStore>, AppError> {
    match config.backend {
        StoreBackend::Memory => {
            info!("Using in-memory employee store");
            Ok(Arc::new(MemoryEmployeeStore::new()))
        }
        StoreBackend::Postgres => {
            let database_url = config.database_url.as_deref().ok_or_else(|| {
                AppError::Store("DATABASE_URL must be set".to_string())
            })?;
            let pool = PgPoolOptions::new()
                .max_connections(config.max_connections)
                .connect(database_url)
                .await?;
            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .map_err(|err| AppError::Store(err.to_string()))?;
            info!("Connected to PostgreSQL employee store");
            Ok(Arc::new(PgEmployeeStore::new(pool)))
        }
    }
}

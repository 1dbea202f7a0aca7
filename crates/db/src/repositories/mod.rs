use async_trait::async_trait;
use thiserror::Error;

use ordertrack_core::domain::order::Order;
use ordertrack_core::errors::StoreError;

pub mod memory;
pub mod order;

pub use memory::InMemoryOrderStore;
pub use order::SqlOrderStore;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

impl From<RepositoryError> for StoreError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::Database(error) => StoreError::Unavailable(error.to_string()),
            RepositoryError::Decode(message) => StoreError::Decode(message),
        }
    }
}

/// Write side of an order store. Reads go through
/// [`ordertrack_core::store::OrderStore`].
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Inserts or replaces the order, including its line items.
    async fn save(&self, order: Order) -> Result<(), RepositoryError>;
}

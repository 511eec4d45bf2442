//! Storage errors

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Constraint violated: {0}")]
    Conflict(String),
}

impl StoreError {
    /// Maps unique-constraint failures to [`StoreError::Conflict`], everything
    /// else to [`StoreError::Database`].
    pub fn from_write(error: sqlx::Error) -> StoreError {
        match &error {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                StoreError::Conflict(db.message().to_owned())
            }
            _ => StoreError::Database(error),
        }
    }
}

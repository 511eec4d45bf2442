pub mod admin_chat;
pub mod database;
pub mod entities;
pub mod error;
pub mod repositories;
pub mod traits;

pub use error::StoreError;

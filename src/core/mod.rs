pub mod engine;
pub mod error;
pub mod gateway;
pub mod links;
pub mod services;
pub mod session;
pub mod traits;

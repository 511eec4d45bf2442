//! Valentine proposal bot - Library exports for testing
//!
//! (c) Softlandia 2025

pub mod api;
pub mod config;
pub mod core;
pub mod infrastructure;
pub mod telegram;

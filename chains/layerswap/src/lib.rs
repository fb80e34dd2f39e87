pub mod amount;
pub mod campaign;
pub mod chain;
pub mod config;
pub mod error;
pub mod provider;
pub mod swap;

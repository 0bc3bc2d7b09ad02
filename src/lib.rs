//! Cosmos Disburse Library
//!
//! Recurring balance disbursement for Cosmos SDK chains.

pub mod chain;
pub mod cli;
pub mod config;
pub mod disburse;
pub mod error;
pub mod wallet;

// Re-export commonly used types
pub use config::Config;
pub use error::{Error, Result};

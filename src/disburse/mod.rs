//! Disbursement policy and scheduling
//!
//! ```text
//! DisbursementLoop → ChainGateway::query_balance
//!        ↓
//!    Strategy (gate + amount)
//!        ↓
//! TransferExecutor → ChainGateway::broadcast_transfer
//! ```

pub mod engine;
pub mod strategy;

pub use engine::{CycleReport, DisbursementLoop};
pub use strategy::{Decision, Strategy, StrategyKind};

//! Two-sided parimutuel leveraged position engine.
//!
//! Positions are opened SHORT or LONG against a shared pool per side. Winners are
//! paid out of the other side's losses, fees and funding, tracked in a per-side
//! ledger (`state::SideInfo`) that is only ever moved by deltas.

pub mod custody;
pub mod error;
pub mod events;
pub mod executor;
pub mod math;
pub mod oracle;
pub mod risk;
pub mod services;
pub mod state;
pub mod sync;
pub mod types;

pub use custody::{Custody, InMemoryCustody, Transfer};
pub use error::{CustodyError, EngineError, Result};
pub use events::EngineEvent;
pub use executor::{Executor, FundingReceipt, OpenReceipt, OpenRequest};
pub use oracle::Oracle;
pub use risk::EngineCfg;
pub use services::{BasicServicesBundle, CloseOutcome, CloseSettlement};
pub use sync::SharedExecutor;
pub use types::{AccountId, PriceReading, Side, PRECISION};

#[cfg(test)]
mod executor_tests;

//! Tick dispatcher for a spreadsheet-backed video generation queue.
//!
//! Each tick reconciles in-flight jobs against the generation provider and
//! admits queued jobs up to a concurrency cap. The store is the system of
//! record; the dispatcher keeps no state of its own between ticks.

pub mod cli;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod provider;
pub mod queue;
pub mod runner;
pub mod store;

pub use config::DispatchConfig;
pub use dispatcher::TickDispatcher;
pub use error::DispatchError;
pub use queue::{TickReport, TickResponse};

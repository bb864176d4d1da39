//! jobdeck: client-side core for the Korean tech job board aggregator.
//!
//! The crate covers the data-access layer end to end: bearer-token
//! dispatch with single-flight refresh, the per-company listing cache,
//! the conjunctive filter engine, and the board facade that ties them
//! to a company selection. The CLI in `cli` is a thin shell over it.

pub mod auth;
pub mod cli;
pub mod company;
pub mod config;
pub mod error;
pub mod jobs;
pub mod session;
pub mod settings;
pub mod telemetry;

pub use company::Company;
pub use error::{ApiError, Result};

//! Confidential job matching: encrypted profiles and job thresholds are compared by a
//! confidential-compute coprocessor, and contact details are disclosed to a company only
//! for applicants whose encrypted eligibility is true.

pub mod auth;
pub mod cli;
pub mod core;
pub mod environment;
pub mod fhe;
pub mod ledger;
pub mod types;
pub mod utils;
pub mod web;

pub use ledger::{Ledger, LedgerError, LedgerPolicy};
pub use web::start_web_server;

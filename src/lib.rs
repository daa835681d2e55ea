//! Daily substitution plan checker.
//!
//! Fetches the school's published plan PDF, extracts its text, asks a
//! language model to summarise the changes for the target class,
//! resolves the weekday the plan refers to and delivers the summary by
//! email. The orchestration lives in [`check::check`]; each pipeline
//! stage has exactly one module.

pub mod analyze;
pub mod check;
pub mod cli;
pub mod config;
pub mod contract;
pub mod day;
pub mod download;
pub mod error;
pub mod extract;
pub mod notify;

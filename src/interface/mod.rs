//! Interface layer - External interfaces
//!
//! This layer handles:
//! - Command-line parsing
//! - Printing run summaries

pub mod cli;

//! `line-flux` library crate.
//!
//! The binary (`lineflux`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - the flux estimator can be called directly from other tools

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod math;
pub mod models;
pub mod photometry;
pub mod report;

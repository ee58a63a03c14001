//! Storage infrastructure: configuration file persistence.
//!
//! The `config` sub-module reads the TOML mission configuration, writes a
//! default one on request, and validates values before a mission starts.

pub mod config;

//! # Radon Library
//!
//! The binary's modules, exposed so integration tests can build the
//! router and drive commands without spawning a process.

pub mod api;
pub mod cli;
pub mod config;

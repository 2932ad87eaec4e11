//! serverdeck CLI: Command-line front end for serverdeck
//!
//! Manages server profiles in the encrypted profile store and drives
//! the connection lifecycle against live servers.

pub mod commands;
pub mod context;
pub mod output;

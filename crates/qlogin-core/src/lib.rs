//! Core login negotiation for the automated chat client.
//!
//! This crate is intentionally transport-agnostic. The chat protocol client, the
//! operator console and the transient image files live behind ports (traits)
//! implemented in adapter crates or by the hosting process.

pub mod config;
pub mod connectivity;
pub mod domain;
pub mod errors;
pub mod logging;
pub mod login;
pub mod ports;
pub mod utils;

pub use errors::{Error, Result, Termination};

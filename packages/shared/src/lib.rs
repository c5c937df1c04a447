//! Shared utilities for the Parley relay and its CLI client.

pub mod logger;
pub mod time;

//! Shared model of the `ignite` entrypoint: configuration, timestamp patterns,
//! the worker fan-out model and the startup error type.

pub mod config;
pub mod error;
pub mod pattern;
pub mod worker;

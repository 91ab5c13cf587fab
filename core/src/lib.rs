//! # ignite core
//!
//! Process entrypoint runtime: install timestamped logging once, then hand the
//! rest of the process over to an application.
//!
//! * **[`logging`]**: the [`logging::LogContext`] handle, its event formatter and stamped writers.
//! * **[`app`]**: the [`app::Application`] boundary and the external-program adapter.
//! * **[`bootstrap`]**: the fixed startup sequence.
//! * **[`cluster`]**: worker fan-out for multi-core use without an external process manager.
//! * **[`signal`]**: shutdown signal handling.

pub mod app;
pub mod bootstrap;
pub mod cluster;
pub mod logging;
pub mod signal;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

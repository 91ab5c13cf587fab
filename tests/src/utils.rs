use ignite_common::config::{ColorMode, Config, LogSettings};
use ignite_core::logging::LogContext;

pub use ignite_core::test_support::{MemorySink, starts_with_iso_utc};

pub fn config() -> Config {
    Config {
        log: LogSettings {
            color: ColorMode::Never,
            ..LogSettings::default()
        },
        ..Config::default()
    }
}

pub fn capture_log(sink: &MemorySink) -> LogContext {
    let sink = sink.clone();
    LogContext::builder(config().log)
        .honor_env(false)
        .writer(move || sink.clone())
        .build()
        .unwrap()
}

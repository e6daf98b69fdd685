use std::sync::Once;

/// Logger setup for the host binary.
///
/// `env_filter` uses `env_logger` filter syntax, e.g. `"info"` or
/// `"slate_renderer=debug,slate_perf=info"`.
#[derive(Debug, Clone, Default)]
pub struct LoggingConfig {
    pub env_filter: Option<String>,
}

static INIT: Once = Once::new();

/// Install the global logger. Later calls are ignored.
///
/// Falls back to `RUST_LOG`, then to `info`.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let mut builder = env_logger::Builder::new();
        if let Some(filter) = config.env_filter {
            builder.parse_filters(&filter);
        } else if let Ok(filter) = std::env::var("RUST_LOG") {
            builder.parse_filters(&filter);
        } else {
            builder.filter_level(log::LevelFilter::Info);
        }
        builder.init();
        log::debug!("logging initialized");
    });
}

use clap::ValueEnum;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Overrides `--log-level` with a full filter, e.g. `multitalk_bridge=trace`.
pub const LOG_FILTER_ENV: &str = "MULTITALK_LOG";

/// Crates whose events follow `--log-level`. Dependencies log warnings only.
const CRATES: [&str; 6] = [
    "multitalk",
    "multitalk_llap",
    "multitalk_tash",
    "multitalk_ethertalk",
    "multitalk_transport",
    "multitalk_bridge",
];

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_filter(self) -> LevelFilter {
        match self {
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }

    /// Per-frame discards and relays are only worth a target at this level.
    fn is_verbose(self) -> bool {
        matches!(self, LogLevel::Debug | LogLevel::Trace)
    }
}

/// Directives applying `level` to this workspace's crates.
fn directives(level: LogLevel) -> String {
    let level = level.as_filter();
    let mut out = String::from("warn");
    for krate in CRATES {
        out.push_str(&format!(",{krate}={level}"));
    }
    out
}

fn env_filter(level: LogLevel) -> EnvFilter {
    EnvFilter::try_from_env(LOG_FILTER_ENV)
        .or_else(|_| EnvFilter::try_new(directives(level)))
        .unwrap_or_else(|_| EnvFilter::new("warn"))
}

/// Install the stderr subscriber. Packet output owns stdout.
///
/// Bridge workers run on named threads (`capture-eth0`, `llap-send-/dev/ttyUSB0`),
/// so the thread name identifies the interface an event came from.
pub fn init_logging(format: LogFormat, level: LogLevel) {
    let builder = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(env_filter(level))
        .with_ansi(false)
        .with_target(level.is_verbose())
        .with_thread_names(true);

    match format {
        LogFormat::Text => {
            let _ = builder.try_init();
        }
        LogFormat::Json => {
            let _ = builder.json().try_init();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_applies_to_workspace_crates_only() {
        let directives = directives(LogLevel::Debug);
        assert!(directives.starts_with("warn,"));
        assert!(directives.contains("multitalk_bridge=debug"));
        assert!(directives.contains("multitalk_tash=debug"));
        assert_eq!(directives.matches("=debug").count(), CRATES.len());
        assert!(EnvFilter::try_new(directives).is_ok());
    }

    #[test]
    fn targets_only_when_verbose() {
        assert!(!LogLevel::Info.is_verbose());
        assert!(LogLevel::Trace.is_verbose());
    }
}

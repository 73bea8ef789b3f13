/// Errors that can occur while setting up a bridge.
///
/// Once an interface is running, failures end that interface and are logged;
/// they never surface here.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// TashTalk codec error.
    #[error("localtalk error: {0}")]
    Tash(#[from] multitalk_tash::TashError),

    /// A worker thread could not be started.
    #[error("failed to start worker for {name}: {source}")]
    Spawn {
        name: String,
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, BridgeError>;

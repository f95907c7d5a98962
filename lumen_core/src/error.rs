use thiserror::Error;

/// Errors shared by every LUMEN crate.
///
/// Construction variants (`InvalidParameter`, `Config`, `DeviceNotFound`,
/// `MapLoad`) are raised before the first tick. `Controller` and `Sink` are
/// raised from inside a tick and stop the scheduler.
#[derive(Debug, Error)]
pub enum LumenError {
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("no input device at index {index} (found {found})")]
    DeviceNotFound { index: usize, found: usize },

    #[error("input device initialization failed: {0}")]
    DeviceInit(String),

    #[error("failed to load map: {0}")]
    MapLoad(String),

    #[error("controller failure: {0}")]
    Controller(String),

    #[error("frame sink failure: {0}")]
    Sink(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl LumenError {
    /// True for errors that can only happen during startup.
    pub fn is_construction_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidParameter(_)
                | Self::Config(_)
                | Self::DeviceNotFound { .. }
                | Self::DeviceInit(_)
                | Self::MapLoad(_)
        )
    }
}

pub type LumenResult<T> = Result<T, LumenError>;

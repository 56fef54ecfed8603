use thiserror::Error;

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("command error: {0}")]
    Command(String),

    #[error(transparent)]
    Store(#[from] chapel_core::StoreError),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Command(_) => 2,
            Self::Serialization(_) => 4,
            Self::Store(chapel_core::StoreError::Serialization(_)) => 4,
            Self::Store(_) | Self::Io(_) => 10,
        }
    }
}

use thiserror::Error;

/// Convenient result type for `scalink-lib`.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Serial(#[from] serialport::Error),

    #[error("hex decode error: {0}")]
    Hex(#[from] hex::FromHexError),

    #[error("float parse error: {0}")]
    ParseFloat(#[from] std::num::ParseFloatError),

    #[error("malformed waveform block: {0}")]
    Frame(String),

    #[error("can't write to the target while disconnected, connect to it first")]
    NotConnected,

    #[error("target communication failed, it may have been disconnected: {0}")]
    TargetCommunication(String),

    #[error("unknown challenge `{0}`")]
    UnknownChallenge(String),

    #[error("template error: {0}")]
    Template(String),

    #[error("cipher reference error: {0}")]
    Cipher(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("timeout while {0}")]
    Timeout(String),

    #[error("cancelled while {0}")]
    Cancelled(String),

    #[error("setting rejected: {0}")]
    Rejected(String),
}

impl Error {
    pub fn frame(msg: impl Into<String>) -> Self {
        Self::Frame(msg.into())
    }

    pub fn template(msg: impl Into<String>) -> Self {
        Self::Template(msg.into())
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    pub fn cancelled(msg: impl Into<String>) -> Self {
        Self::Cancelled(msg.into())
    }

    pub fn rejected(msg: impl Into<String>) -> Self {
        Self::Rejected(msg.into())
    }
}

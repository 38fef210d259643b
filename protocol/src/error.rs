use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("frame of {0} bytes exceeds the 10 MiB maximum")]
    FrameTooLarge(u32),

    #[error("unsupported protocol version: {0}")]
    UnknownVersion(u8),

    #[error("malformed frame body: {0}")]
    Decode(#[from] rmp_serde::decode::Error),

    #[error("failed to encode response body: {0}")]
    Encode(#[from] rmp_serde::encode::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

use thiserror::Error;

/// Result type used throughout the crate
pub type Result<T> = core::result::Result<T, Error>;

/// Describes an error encountered while decoding or encoding a GIF.
#[derive(Debug, Error)]
pub enum Error {
    /// The input is not a GIF, or is cut off before the header is complete. The string describes how.
    #[error("malformed GIF: {0}")]
    Format(&'static str),
    /// The encoder was given something it cannot turn into a GIF.
    #[error("cannot encode GIF: {0}")]
    Encoding(&'static str),
    /// The base64 transport payload could not be decoded
    #[error("invalid base64 payload: {0}")]
    Transport(#[from] base64::DecodeError),
    /// There was an error reading or writing the image
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

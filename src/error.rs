use thiserror::Error;

/// Minimum byte length of a serial: version byte plus big-endian seed.
pub const MIN_SERIAL_LEN: usize = 5;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SerialError {
    #[error("serial too short: {0} bytes, need at least {MIN_SERIAL_LEN}")]
    InvalidLength(usize),

    #[error("unsupported serial version: {0:#04x}")]
    UnsupportedVersion(u8),

    #[error("checksum mismatch: embedded {embedded:#06x}, computed {computed:#06x}")]
    ChecksumMismatch { embedded: u16, computed: u16 },

    #[error("malformed payload: marker byte is {0}, expected 128")]
    MalformedPayload(u64),

    #[error("no part category known for {0:?}")]
    UnknownCategory(String),

    #[error("asset not found in {category}: {identifier}")]
    UnknownAsset {
        category: String,
        identifier: String,
    },

    #[error("bit stream exhausted: requested {requested} bits, {available} available")]
    OutOfData { requested: usize, available: usize },

    #[error("value {value} does not fit in {width} bits")]
    ValueTooWide { value: u64, width: usize },
}

pub type Result<T> = std::result::Result<T, SerialError>;

//! Errors for the `stele-preimage` crate.

use thiserror::Error;

/// The type byte of a storage key did not name a known key type.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("invalid preimage key type")]
pub struct InvalidPreimageKeyType;

/// Failure to parse a textual hint.
///
/// The payload length is not validated here; that is the dispatcher's job,
/// since the expected length depends on the hint type.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HintParsingError {
    /// The hint did not contain exactly one space separator.
    #[error("malformed hint: {0}")]
    Malformed(String),
    /// The hint type is not one of the recognised type strings.
    #[error("unknown hint type: {0}")]
    UnknownType(String),
    /// The payload was not a `0x`-prefixed hex string.
    #[error("invalid hint payload bytes: {0}")]
    InvalidPayload(String),
}

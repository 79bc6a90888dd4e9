//! Contains the [PreimageKey] type, which addresses every value the oracle
//! can serve.

use crate::errors::InvalidPreimageKeyType;
use alloy_primitives::{B256, U256};

/// The local-key index under which the host publishes the committed L1 head
/// block hash.
pub const L1_HEAD_LOCAL_INDEX: u64 = 1;

/// The derivation scheme behind a storage key, encoded in its first byte.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Hash)]
#[repr(u8)]
pub enum PreimageKeyType {
    /// Local key types are host-supplied constants, addressed by a 31-byte
    /// big-endian index rather than a digest.
    Local = 1,
    /// Keccak256 key types map the low-order 31 bytes of the preimage's
    /// `keccak256` digest to the preimage itself.
    #[default]
    Keccak256 = 2,
    /// Sha256 key types map the low-order 31 bytes of the preimage's `sha256`
    /// digest to the preimage. Used for KZG blob commitments, which are
    /// committed to by their versioned hash.
    Sha256 = 3,
    /// Blob key types address one 32-byte field element of a blob. The digest
    /// is `keccak256(commitment ++ zeros(24) ++ u64_be(index))` with the
    /// first byte replaced by the tag.
    Blob = 4,
    /// KZG point-evaluation key types address the 1-byte outcome of running
    /// the EIP-4844 point-evaluation precompile over an input. The digest is
    /// `keccak256(input)` with the first byte replaced by the tag.
    KZGPointEvaluation = 6,
}

impl TryFrom<u8> for PreimageKeyType {
    type Error = InvalidPreimageKeyType;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        let key_type = match value {
            1 => Self::Local,
            2 => Self::Keccak256,
            3 => Self::Sha256,
            4 => Self::Blob,
            6 => Self::KZGPointEvaluation,
            _ => return Err(InvalidPreimageKeyType),
        };
        Ok(key_type)
    }
}

/// A preimage key is a 32-byte value that identifies a preimage that may be
/// fetched from the oracle.
///
/// **Layout**:
/// |  Bits   | Description |
/// |---------|-------------|
/// | [0, 1)  | Type byte   |
/// | [1, 32) | Data        |
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Hash)]
pub struct PreimageKey {
    data: [u8; 31],
    key_type: PreimageKeyType,
}

impl PreimageKey {
    /// Creates a new [PreimageKey] from a 32-byte digest and a
    /// [PreimageKeyType]. The digest is truncated to its low-order 31 bytes.
    pub fn new(key: [u8; 32], key_type: PreimageKeyType) -> Self {
        let mut data = [0u8; 31];
        data.copy_from_slice(&key[1..]);
        Self { data, key_type }
    }

    /// Creates a new keccak256 [PreimageKey] from a 32-byte digest.
    pub fn new_keccak256(key: [u8; 32]) -> Self {
        Self::new(key, PreimageKeyType::Keccak256)
    }

    /// Creates a new local [PreimageKey] from a 64-bit local index. The index
    /// is written into the low-order 8 bytes of the big-endian 31-byte data
    /// field.
    pub fn new_local(local_index: u64) -> Self {
        let mut data = [0u8; 31];
        data[23..].copy_from_slice(&local_index.to_be_bytes());
        Self { data, key_type: PreimageKeyType::Local }
    }

    /// Returns the [PreimageKeyType] for the [PreimageKey].
    pub const fn key_type(&self) -> PreimageKeyType {
        self.key_type
    }

    /// Returns the 31-byte data field as a [U256].
    pub fn key_value(&self) -> U256 {
        U256::from_be_slice(self.data.as_slice())
    }
}

impl From<PreimageKey> for [u8; 32] {
    fn from(key: PreimageKey) -> Self {
        let mut rendered_key = [0u8; 32];
        rendered_key[0] = key.key_type as u8;
        rendered_key[1..].copy_from_slice(&key.data);
        rendered_key
    }
}

impl From<PreimageKey> for B256 {
    fn from(key: PreimageKey) -> Self {
        let raw: [u8; 32] = key.into();
        Self::from(raw)
    }
}

impl TryFrom<[u8; 32]> for PreimageKey {
    type Error = InvalidPreimageKeyType;

    fn try_from(value: [u8; 32]) -> Result<Self, Self::Error> {
        let key_type = PreimageKeyType::try_from(value[0])?;
        Ok(Self::new(value, key_type))
    }
}

impl core::fmt::Display for PreimageKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let raw: [u8; 32] = (*self).into();
        write!(f, "{}", B256::from(raw))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_preimage_key_round_trips() {
        let types = [
            PreimageKeyType::Local,
            PreimageKeyType::Keccak256,
            PreimageKeyType::Sha256,
            PreimageKeyType::Blob,
            PreimageKeyType::KZGPointEvaluation,
        ];

        for key_type in types {
            let key = PreimageKey::new([0xFFu8; 32], key_type);
            assert_eq!(key.key_type(), key_type);

            let mut rendered_key = [0xFFu8; 32];
            rendered_key[0] = key_type as u8;
            let raw: [u8; 32] = key.into();
            assert_eq!(raw, rendered_key);

            assert_eq!(PreimageKey::try_from(raw), Ok(key));
        }
    }

    #[test]
    fn test_unassigned_type_bytes_rejected() {
        for tag in [0u8, 5, 7, 0xFF] {
            let mut raw = [0u8; 32];
            raw[0] = tag;
            assert_eq!(PreimageKey::try_from(raw), Err(InvalidPreimageKeyType));
        }
    }

    #[test]
    fn test_local_key_layout() {
        let key = PreimageKey::new_local(L1_HEAD_LOCAL_INDEX);
        assert_eq!(key.key_type(), PreimageKeyType::Local);
        assert_eq!(key.key_value(), U256::from(L1_HEAD_LOCAL_INDEX));

        let raw: [u8; 32] = key.into();
        assert_eq!(raw[0], 1);
        assert_eq!(&raw[1..31], &[0u8; 30]);
        assert_eq!(raw[31], 1);
    }
}

//! Contains the [Hint] and [HintType] types, the textual protocol the client
//! uses to announce upcoming preimage reads.

use crate::errors::HintParsingError;
use alloy_primitives::{hex, Bytes};
use core::{fmt::Display, str::FromStr};

/// The [HintType] enum encodes the closed set of fetches the host knows how
/// to perform. The client and host must agree on this set; unrecognised
/// types are rejected at parse time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HintType {
    /// The RLP-encoded header of an L1 block, by block hash.
    L1BlockHeader,
    /// The transaction trie of an L1 block, by block hash.
    L1Transactions,
    /// The receipt trie of an L1 block, by block hash.
    L1Receipts,
    /// One blob confirmed on the L1 beacon chain, by
    /// versioned hash, index and block timestamp.
    L1Blob,
    /// The outcome of the EIP-4844 point-evaluation precompile over a raw
    /// input.
    L1KZGPointEvaluation,
}

impl HintType {
    /// Encodes this hint type and a payload into the wire form
    /// `"<type> 0x<hex>"`.
    pub fn encode_with(&self, data: &[&[u8]]) -> String {
        let concatenated = data.iter().copied().flatten().copied().collect::<Vec<_>>();
        format!("{} 0x{}", self, hex::encode(concatenated))
    }

    /// The exact payload length this hint type requires, or [None] for
    /// variable-length payloads. KZG point-evaluation inputs are validated
    /// by the precompile itself.
    pub const fn payload_len(&self) -> Option<usize> {
        match self {
            Self::L1BlockHeader | Self::L1Transactions | Self::L1Receipts => Some(32),
            Self::L1Blob => Some(48),
            Self::L1KZGPointEvaluation => None,
        }
    }
}

impl FromStr for HintType {
    type Err = HintParsingError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "l1-block-header" => Ok(Self::L1BlockHeader),
            "l1-transactions" => Ok(Self::L1Transactions),
            "l1-receipts" => Ok(Self::L1Receipts),
            "l1-blob" => Ok(Self::L1Blob),
            "l1-kzg-point-evaluation" => Ok(Self::L1KZGPointEvaluation),
            _ => Err(HintParsingError::UnknownType(value.to_string())),
        }
    }
}

impl From<HintType> for &str {
    fn from(value: HintType) -> Self {
        match value {
            HintType::L1BlockHeader => "l1-block-header",
            HintType::L1Transactions => "l1-transactions",
            HintType::L1Receipts => "l1-receipts",
            HintType::L1Blob => "l1-blob",
            HintType::L1KZGPointEvaluation => "l1-kzg-point-evaluation",
        }
    }
}

impl Display for HintType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let s: &str = (*self).into();
        write!(f, "{}", s)
    }
}

/// A parsed hint: a recognised [HintType] plus its raw payload bytes.
///
/// Payload lengths are validated by the dispatcher, not here, since the
/// expected length depends on the type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hint {
    /// The type of the hint.
    pub hint_type: HintType,
    /// The payload bytes of the hint.
    pub hint_data: Bytes,
}

impl FromStr for Hint {
    type Err = HintParsingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (hint_type, payload) = s
            .split_once(' ')
            .ok_or_else(|| HintParsingError::Malformed(s.to_string()))?;
        if payload.contains(' ') {
            return Err(HintParsingError::Malformed(s.to_string()));
        }

        let hint_type = hint_type.parse::<HintType>()?;
        let payload = payload
            .strip_prefix("0x")
            .ok_or_else(|| HintParsingError::InvalidPayload(payload.to_string()))?;
        let hint_data = hex::decode(payload)
            .map_err(|_| HintParsingError::InvalidPayload(payload.to_string()))?
            .into();

        Ok(Self { hint_type, hint_data })
    }
}

impl Display for Hint {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{} 0x{}", self.hint_type, hex::encode(&self.hint_data))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use alloy_primitives::b256;

    #[test]
    fn test_hint_round_trip() {
        let hash = b256!("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa");
        let encoded = HintType::L1BlockHeader.encode_with(&[hash.as_slice()]);
        let hint = encoded.parse::<Hint>().unwrap();

        assert_eq!(hint.hint_type, HintType::L1BlockHeader);
        assert_eq!(hint.hint_data.as_ref(), hash.as_slice());
        assert_eq!(hint.to_string(), encoded);
    }

    #[test]
    fn test_all_types_parse() {
        for (s, ty) in [
            ("l1-block-header", HintType::L1BlockHeader),
            ("l1-transactions", HintType::L1Transactions),
            ("l1-receipts", HintType::L1Receipts),
            ("l1-blob", HintType::L1Blob),
            ("l1-kzg-point-evaluation", HintType::L1KZGPointEvaluation),
        ] {
            assert_eq!(s.parse::<HintType>().unwrap(), ty);
            assert_eq!(<&str>::from(ty), s);
        }
    }

    #[test]
    fn test_unknown_type_rejected() {
        let err = "unknown 0xdead".parse::<Hint>().unwrap_err();
        assert_eq!(err, HintParsingError::UnknownType("unknown".to_string()));
    }

    #[test]
    fn test_missing_separator_rejected() {
        let err = "l1-block-header".parse::<Hint>().unwrap_err();
        assert!(matches!(err, HintParsingError::Malformed(_)));
    }

    #[test]
    fn test_malformed_payload_rejected() {
        assert!(matches!(
            "l1-block-header 0xzz".parse::<Hint>(),
            Err(HintParsingError::InvalidPayload(_))
        ));
        // A bare payload without the 0x prefix is not wire format.
        assert!(matches!(
            "l1-block-header dead".parse::<Hint>(),
            Err(HintParsingError::InvalidPayload(_))
        ));
    }

    #[test]
    fn test_payload_lengths() {
        assert_eq!(HintType::L1BlockHeader.payload_len(), Some(32));
        assert_eq!(HintType::L1Transactions.payload_len(), Some(32));
        assert_eq!(HintType::L1Receipts.payload_len(), Some(32));
        assert_eq!(HintType::L1Blob.payload_len(), Some(48));
        assert_eq!(HintType::L1KZGPointEvaluation.payload_len(), None);
    }

    #[test]
    fn test_empty_payload_allowed() {
        let hint = "l1-kzg-point-evaluation 0x".parse::<Hint>().unwrap();
        assert!(hint.hint_data.is_empty());
    }
}

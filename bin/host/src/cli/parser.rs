//! Parser functions for CLI arguments.

use alloy_primitives::B256;
use std::str::FromStr;

/// Parse a string slice into [B256].
pub(crate) fn parse_b256(s: &str) -> Result<B256, String> {
    B256::from_str(s).map_err(|_| format!("Invalid B256 value: {}", s))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_b256() {
        assert_eq!(
            parse_b256("0x0000000000000000000000000000000000000000000000000000000000000001")
                .unwrap(),
            B256::with_last_byte(1)
        );
        assert!(parse_b256("0xnope").is_err());
        assert!(parse_b256("0x01").is_err());
    }
}

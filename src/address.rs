//! Account identities.
//!
//! Addresses are 20-byte identities rendered as `0x`-prefixed hex. Two
//! addresses are reserved: the zero address, which no operation may target,
//! and the burn address, which destroys whatever is sent to it.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

/// Length of an address in bytes
pub const ADDRESS_LEN: usize = 20;

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Address([u8; ADDRESS_LEN]);

/// The null identity.
pub const ZERO_ADDRESS: Address = Address([0u8; ADDRESS_LEN]);

/// `0x000000000000000000000000000000000000dEaD`
pub const BURN_ADDRESS: Address = Address([
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0xde, 0xad,
]);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressError {
    #[error("invalid hex address: {0}")]
    InvalidHex(String),
    #[error("address must be {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
    #[error("empty address label")]
    EmptyLabel,
}

impl Address {
    pub const fn new(bytes: [u8; ADDRESS_LEN]) -> Self {
        Self(bytes)
    }

    /// Deterministic address for a human-readable label.
    ///
    /// Used by the CLI and tests so accounts can be named ("alice",
    /// "controller") instead of spelled out in hex.
    pub fn from_label(label: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(b"wbtcv:address:");
        hasher.update(label.as_bytes());
        let digest = hasher.finalize();
        let mut bytes = [0u8; ADDRESS_LEN];
        bytes.copy_from_slice(&digest[..ADDRESS_LEN]);
        Self(bytes)
    }

    /// Parse `0x`-prefixed hex, or derive from a label otherwise.
    pub fn parse_or_label(input: &str) -> Result<Self, AddressError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(AddressError::EmptyLabel);
        }
        if input.starts_with("0x") || input.starts_with("0X") {
            input.parse()
        } else {
            Ok(Self::from_label(input))
        }
    }

    pub fn is_zero(&self) -> bool {
        *self == ZERO_ADDRESS
    }

    pub fn is_burn(&self) -> bool {
        *self == BURN_ADDRESS
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let stripped = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);
        let raw = hex::decode(stripped).map_err(|_| AddressError::InvalidHex(s.to_string()))?;
        if raw.len() != ADDRESS_LEN {
            return Err(AddressError::InvalidLength {
                expected: ADDRESS_LEN,
                actual: raw.len(),
            });
        }
        let mut bytes = [0u8; ADDRESS_LEN];
        bytes.copy_from_slice(&raw);
        Ok(Self(bytes))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_round_trip() {
        let addr = Address::from_label("alice");
        let parsed: Address = addr.to_string().parse().unwrap();
        assert_eq!(addr, parsed);
    }

    #[test]
    fn test_reserved_addresses() {
        assert!(ZERO_ADDRESS.is_zero());
        assert!(BURN_ADDRESS.is_burn());
        assert_eq!(
            BURN_ADDRESS.to_string(),
            "0x000000000000000000000000000000000000dead"
        );
    }

    #[test]
    fn test_labels_are_distinct() {
        assert_ne!(Address::from_label("alice"), Address::from_label("bob"));
        assert_eq!(
            Address::parse_or_label("alice").unwrap(),
            Address::from_label("alice")
        );
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(matches!(
            "0x1234".parse::<Address>(),
            Err(AddressError::InvalidLength { actual: 2, .. })
        ));
        assert!(matches!(
            "0xzz".parse::<Address>(),
            Err(AddressError::InvalidHex(_))
        ));
        assert_eq!(Address::parse_or_label("  "), Err(AddressError::EmptyLabel));
    }
}

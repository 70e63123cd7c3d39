//! Voter / contract address type (20-byte EVM address).

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::TypesError;

/// A 20-byte account address as used by the voting and token contracts.
///
/// Rendered as lowercase `0x`-prefixed hex. Parsing accepts either case, so
/// checksummed input normalises to one canonical form and a voter is never
/// counted twice under two spellings.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address([u8; 20]);

impl Address {
    pub const ZERO: Self = Self([0u8; 20]);

    pub const fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }
}

impl FromStr for Address {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);
        if digits.len() != 40 {
            return Err(TypesError::InvalidAddress(s.to_string()));
        }
        let mut out = [0u8; 20];
        for (i, pair) in digits.as_bytes().chunks(2).enumerate() {
            let hi = hex_val(pair[0]).ok_or_else(|| TypesError::InvalidAddress(s.to_string()))?;
            let lo = hex_val(pair[1]).ok_or_else(|| TypesError::InvalidAddress(s.to_string()))?;
            out[i] = (hi << 4) | lo;
        }
        Ok(Self(out))
    }
}

fn hex_val(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x")?;
        for b in &self.0 {
            write!(f, "{:02x}", b)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_checksummed_and_lowercase_to_same_address() {
        let a: Address = "0x2868d708e442A6a940670d26100036d426F1e16b".parse().unwrap();
        let b: Address = "0x2868d708e442a6a940670d26100036d426f1e16b".parse().unwrap();
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "0x2868d708e442a6a940670d26100036d426f1e16b");
    }

    #[test]
    fn rejects_wrong_length() {
        assert!("0x1234".parse::<Address>().is_err());
    }

    #[test]
    fn rejects_non_hex() {
        let s = "0xzz68d708e442a6a940670d26100036d426f1e16b";
        assert_eq!(
            s.parse::<Address>(),
            Err(TypesError::InvalidAddress(s.to_string()))
        );
    }

    #[test]
    fn serializes_as_hex_string() {
        let a = Address::new([0xab; 20]);
        let json = serde_json::to_string(&a).unwrap();
        assert_eq!(json, format!("\"0x{}\"", "ab".repeat(20)));
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(back, a);
    }
}

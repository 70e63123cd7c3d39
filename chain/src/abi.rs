//! Minimal Solidity ABI encoding for the handful of view calls the indexer
//! makes.
//!
//! Only static head words, `address`, `uint256` and a single level of
//! dynamic `string` are supported. Integers wider than the requested Rust
//! type are rejected rather than truncated.

use sha3::{Digest, Keccak256};
use tally_types::Address;

use crate::ChainError;

pub const WORD_LEN: usize = 32;

pub type Word = [u8; WORD_LEN];

/// First four bytes of keccak-256 over the canonical signature.
pub fn selector(signature: &str) -> [u8; 4] {
    let digest = Keccak256::digest(signature.as_bytes());
    let mut out = [0u8; 4];
    out.copy_from_slice(&digest[..4]);
    out
}

pub fn uint_word(value: u128) -> Word {
    let mut word = [0u8; WORD_LEN];
    word[16..].copy_from_slice(&value.to_be_bytes());
    word
}

pub fn address_word(address: &Address) -> Word {
    let mut word = [0u8; WORD_LEN];
    word[12..].copy_from_slice(address.as_bytes());
    word
}

/// `0x`-prefixed calldata for `signature` applied to static `args`.
pub fn encode_call(signature: &str, args: &[Word]) -> String {
    let mut data = Vec::with_capacity(4 + args.len() * WORD_LEN);
    data.extend_from_slice(&selector(signature));
    for arg in args {
        data.extend_from_slice(arg);
    }
    format!("0x{}", hex::encode(data))
}

/// Parse a `0x`-prefixed hex quantity or data string.
pub fn decode_hex(raw: &str) -> Result<Vec<u8>, ChainError> {
    let s = raw.strip_prefix("0x").unwrap_or(raw);
    hex::decode(s).map_err(|e| ChainError::Abi(format!("invalid hex return data: {e}")))
}

/// Parse a JSON-RPC quantity (`0x1a`) into a u64.
pub fn decode_quantity(raw: &str) -> Result<u64, ChainError> {
    let s = raw.strip_prefix("0x").unwrap_or(raw);
    if s.is_empty() {
        return Err(ChainError::Abi("empty quantity".to_string()));
    }
    u64::from_str_radix(s, 16).map_err(|e| ChainError::Abi(format!("invalid quantity {raw}: {e}")))
}

/// Reader over the return data of one call.
pub struct AbiDecoder<'a> {
    data: &'a [u8],
}

impl<'a> AbiDecoder<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    fn word_at(&self, offset: usize) -> Result<&'a [u8], ChainError> {
        let end = offset
            .checked_add(WORD_LEN)
            .ok_or_else(|| ChainError::Abi("offset overflow".to_string()))?;
        self.data.get(offset..end).ok_or_else(|| {
            ChainError::Abi(format!(
                "return data too short: need {end} bytes, have {}",
                self.data.len()
            ))
        })
    }

    fn word(&self, slot: usize) -> Result<&'a [u8], ChainError> {
        self.word_at(slot * WORD_LEN)
    }

    pub fn uint_u128(&self, slot: usize) -> Result<u128, ChainError> {
        word_to_u128(self.word(slot)?)
    }

    pub fn uint_u64(&self, slot: usize) -> Result<u64, ChainError> {
        let value = self.uint_u128(slot)?;
        u64::try_from(value)
            .map_err(|_| ChainError::Abi(format!("uint at slot {slot} does not fit in u64")))
    }

    pub fn address(&self, slot: usize) -> Result<Address, ChainError> {
        let word = self.word(slot)?;
        if word[..12].iter().any(|b| *b != 0) {
            return Err(ChainError::Abi(format!("dirty address word at slot {slot}")));
        }
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&word[12..]);
        Ok(Address::new(bytes))
    }

    /// A dynamic `string` whose head word sits at `slot`.
    pub fn string(&self, slot: usize) -> Result<String, ChainError> {
        let offset = to_usize(self.uint_u128(slot)?)?;
        let len = to_usize(word_to_u128(self.word_at(offset)?)?)?;
        let start = offset + WORD_LEN;
        let bytes = start
            .checked_add(len)
            .and_then(|end| self.data.get(start..end))
            .ok_or_else(|| ChainError::Abi(format!("string at slot {slot} runs past end")))?;
        String::from_utf8(bytes.to_vec())
            .map_err(|e| ChainError::Abi(format!("string at slot {slot} is not utf-8: {e}")))
    }
}

fn word_to_u128(word: &[u8]) -> Result<u128, ChainError> {
    if word[..16].iter().any(|b| *b != 0) {
        return Err(ChainError::Abi("uint256 value exceeds 128 bits".to_string()));
    }
    let mut low = [0u8; 16];
    low.copy_from_slice(&word[16..]);
    Ok(u128::from_be_bytes(low))
}

fn to_usize(value: u128) -> Result<usize, ChainError> {
    usize::try_from(value).map_err(|_| ChainError::Abi(format!("offset {value} out of range")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_selectors() {
        assert_eq!(hex::encode(selector("balanceOf(address)")), "70a08231");
        assert_eq!(hex::encode(selector("transfer(address,uint256)")), "a9059cbb");
    }

    #[test]
    fn encodes_call_data() {
        let data = encode_call("balanceOf(address)", &[address_word(&Address::new([0x11; 20]))]);
        assert!(data.starts_with("0x70a08231"));
        assert_eq!(data.len(), 2 + 8 + 64);
        assert!(data.ends_with(&"11".repeat(20)));
    }

    #[test]
    fn decodes_head_and_string() {
        // (string "hi", uint 7)
        let mut data = Vec::new();
        data.extend_from_slice(&uint_word(64));
        data.extend_from_slice(&uint_word(7));
        data.extend_from_slice(&uint_word(2));
        let mut tail = [0u8; 32];
        tail[..2].copy_from_slice(b"hi");
        data.extend_from_slice(&tail);

        let dec = AbiDecoder::new(&data);
        assert_eq!(dec.string(0).unwrap(), "hi");
        assert_eq!(dec.uint_u64(1).unwrap(), 7);
    }

    #[test]
    fn wide_integers_are_rejected() {
        let mut word = [0u8; 32];
        word[0] = 1;
        assert!(matches!(AbiDecoder::new(&word).uint_u128(0), Err(ChainError::Abi(_))));

        let data = uint_word(u64::MAX as u128 + 1);
        assert!(AbiDecoder::new(&data).uint_u64(0).is_err());
    }

    #[test]
    fn short_data_is_an_error() {
        assert!(AbiDecoder::new(&[0u8; 31]).uint_u128(0).is_err());
    }

    #[test]
    fn quantities() {
        assert_eq!(decode_quantity("0x1a").unwrap(), 26);
        assert!(decode_quantity("0x").is_err());
    }
}

//! Stored vote payload encodings.

use serde_json::Value;
use tally_types::{Address, DecodedVote, TypesError};

use crate::DecodeError;

/// The shapes a stored vote payload can take.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VotePayload {
    /// The payload is itself a JSON list of `[option, percent]` pairs.
    Inline(Vec<(u64, u64)>),
    /// The payload names off-chain content whose body is that list.
    ContentRef(String),
}

impl VotePayload {
    /// A leading `[` marks an inline list. Any other non-empty payload that
    /// is not a JSON object is an opaque content reference; whether it
    /// resolves is up to the resolver.
    pub fn parse(raw: &str) -> Result<Self, DecodeError> {
        let trimmed = raw.trim();
        if trimmed.starts_with('[') {
            return parse_pairs(trimmed).map(VotePayload::Inline);
        }
        if trimmed.is_empty() || trimmed.starts_with('{') {
            let preview: String = trimmed.chars().take(32).collect();
            return Err(DecodeError::UnknownEncoding(preview));
        }
        Ok(VotePayload::ContentRef(trimmed.to_string()))
    }
}

/// Parse a JSON list of `[option, percent]` pairs. Members may be JSON
/// numbers or decimal strings.
pub fn parse_pairs(body: &str) -> Result<Vec<(u64, u64)>, DecodeError> {
    let value: Value =
        serde_json::from_str(body).map_err(|e| DecodeError::Malformed(e.to_string()))?;
    let entries = value
        .as_array()
        .ok_or_else(|| DecodeError::Malformed("vote list is not an array".to_string()))?;

    entries
        .iter()
        .map(|entry| match entry.as_array().map(Vec::as_slice) {
            Some([option, percent]) => Ok((int_member(option)?, int_member(percent)?)),
            _ => Err(DecodeError::Malformed(format!(
                "vote entry is not an [option, percent] pair: {entry}"
            ))),
        })
        .collect()
}

fn int_member(value: &Value) -> Result<u64, DecodeError> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .ok_or_else(|| DecodeError::Malformed(format!("not a non-negative integer: {n}"))),
        Value::String(s) => s
            .trim()
            .parse::<u64>()
            .map_err(|_| DecodeError::Malformed(format!("not a decimal integer: {s:?}"))),
        other => Err(DecodeError::Malformed(format!("unexpected vote member: {other}"))),
    }
}

/// Attach `voter` to parsed pairs, validating option ids and percentages.
pub fn to_decoded(voter: Address, pairs: &[(u64, u64)]) -> Result<Vec<DecodedVote>, DecodeError> {
    pairs
        .iter()
        .map(|&(option, percent)| {
            let option_id = u32::try_from(option)
                .map_err(|_| DecodeError::Malformed(format!("option id {option} out of range")))?;
            DecodedVote::new(voter, option_id, percent).map_err(|e| match e {
                TypesError::InvalidPercentage(p) => DecodeError::InvalidPercentage(p),
                other => DecodeError::Malformed(other.to_string()),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inline_numbers_and_strings() {
        let payload = VotePayload::parse(r#"[[0, 60], ["1", "40"]]"#).unwrap();
        assert_eq!(payload, VotePayload::Inline(vec![(0, 60), (1, 40)]));
    }

    #[test]
    fn content_reference() {
        let payload = VotePayload::parse("bafkreigh2akiscaild").unwrap();
        assert_eq!(payload, VotePayload::ContentRef("bafkreigh2akiscaild".to_string()));
    }

    #[test]
    fn content_reference_is_opaque() {
        for raw in ["bafy-y", "ipfs/bafkrei/votes.json", " Qm_x.y:z "] {
            assert_eq!(
                VotePayload::parse(raw).unwrap(),
                VotePayload::ContentRef(raw.trim().to_string()),
                "{raw}"
            );
        }
    }

    #[test]
    fn unknown_shape() {
        assert!(matches!(
            VotePayload::parse("{\"x\":1}"),
            Err(DecodeError::UnknownEncoding(_))
        ));
        assert!(matches!(VotePayload::parse("  "), Err(DecodeError::UnknownEncoding(_))));
    }

    #[test]
    fn bad_pair_is_malformed() {
        assert!(matches!(parse_pairs("[[1]]"), Err(DecodeError::Malformed(_))));
        assert!(matches!(parse_pairs("[[1, -3]]"), Err(DecodeError::Malformed(_))));
        assert!(matches!(parse_pairs("[[1, true]]"), Err(DecodeError::Malformed(_))));
    }

    #[test]
    fn percent_over_hundred_is_rejected() {
        let err = to_decoded(Address::ZERO, &[(0, 101)]).unwrap_err();
        assert!(matches!(err, DecodeError::InvalidPercentage(101)));
    }

    #[test]
    fn split_vote_decodes_into_entries() {
        let voter = Address::new([5; 20]);
        let decoded = to_decoded(voter, &[(0, 70), (2, 30)]).unwrap();
        assert_eq!(decoded.len(), 2);
        assert_eq!(decoded[1].option_id, 2);
        assert_eq!(decoded[1].percent, 30);
        assert_eq!(decoded[1].voter, voter);
    }
}

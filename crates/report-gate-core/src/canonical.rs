//! Canonical CBOR encoding of audit records.
//!
//! Follows RFC 8949 Core Deterministic Encoding:
//! - Map keys sorted by encoded byte comparison
//! - Integers use smallest valid encoding
//! - Definite lengths only
//! - No floats (timestamps are i64 milliseconds)
//!
//! The same record must always produce the same bytes, otherwise the hash
//! chain over the audit log could not be re-verified later.

use ciborium::value::Value;

use crate::decision::AccessDecision;
use crate::hash::EntryHash;

/// Record field keys (integer keys for compact encoding).
mod keys {
    pub const VIEWER_ID: u64 = 0;
    pub const VIEWER_USERNAME: u64 = 1;
    pub const SUBJECT_USERNAME: u64 = 2;
    pub const DOCUMENT_ID: u64 = 3;
    pub const SEQUENCES: u64 = 4;
    pub const GRANTED: u64 = 5;
    pub const REASON: u64 = 6;
    pub const TIMESTAMP: u64 = 7;
    pub const CLIENT_IP: u64 = 8;
    pub const CLIENT_AGENT: u64 = 9;
}

/// Encode an audit record to canonical CBOR bytes.
pub fn canonical_decision_bytes(decision: &AccessDecision) -> Vec<u8> {
    let value = decision_to_cbor_value(decision);
    let mut buf = Vec::new();
    encode_value_to(&mut buf, &value);
    buf
}

/// Hash linking an entry to its predecessor.
///
/// `blake3(prev || canonical_decision_bytes(decision))`
pub fn chain_hash(prev: &EntryHash, decision: &AccessDecision) -> EntryHash {
    let mut hasher = blake3::Hasher::new();
    hasher.update(b"report-gate-audit-v1:");
    hasher.update(prev.as_bytes());
    hasher.update(&canonical_decision_bytes(decision));
    EntryHash(*hasher.finalize().as_bytes())
}

fn opt_text(value: &Option<String>) -> Value {
    match value {
        Some(s) => Value::Text(s.clone()),
        None => Value::Null,
    }
}

/// Convert a record to a CBOR map with integer keys.
fn decision_to_cbor_value(d: &AccessDecision) -> Value {
    let document_id = match d.document.single_id() {
        Some(id) => Value::Integer(id.get().into()),
        None => Value::Null,
    };
    let sequences = match d.document.sequences() {
        Some(s) => Value::Text(s),
        None => Value::Null,
    };

    Value::Map(vec![
        (
            Value::Integer(keys::VIEWER_ID.into()),
            Value::Integer(d.viewer_id.get().into()),
        ),
        (
            Value::Integer(keys::VIEWER_USERNAME.into()),
            Value::Text(d.viewer_username.clone()),
        ),
        (
            Value::Integer(keys::SUBJECT_USERNAME.into()),
            Value::Text(d.subject_username.clone()),
        ),
        (Value::Integer(keys::DOCUMENT_ID.into()), document_id),
        (Value::Integer(keys::SEQUENCES.into()), sequences),
        (Value::Integer(keys::GRANTED.into()), Value::Bool(d.granted)),
        (
            Value::Integer(keys::REASON.into()),
            Value::Text(d.reason.as_str().to_string()),
        ),
        (
            Value::Integer(keys::TIMESTAMP.into()),
            Value::Integer(d.timestamp.into()),
        ),
        (Value::Integer(keys::CLIENT_IP.into()), opt_text(&d.client_ip)),
        (
            Value::Integer(keys::CLIENT_AGENT.into()),
            opt_text(&d.client_agent),
        ),
    ])
}

/// Recursively encode a CBOR value.
///
/// Only the variants produced by `decision_to_cbor_value` are supported.
fn encode_value_to(buf: &mut Vec<u8>, value: &Value) {
    match value {
        Value::Integer(i) => encode_integer(buf, *i),
        Value::Text(s) => {
            encode_uint(buf, 3, s.len() as u64);
            buf.extend_from_slice(s.as_bytes());
        }
        Value::Map(entries) => encode_map_canonical(buf, entries),
        Value::Bool(b) => buf.push(if *b { 0xf5 } else { 0xf4 }),
        Value::Null => buf.push(0xf6),
        _ => panic!("unsupported CBOR value type in audit record"),
    }
}

/// Encode a CBOR integer (major types 0 and 1).
fn encode_integer(buf: &mut Vec<u8>, i: ciborium::value::Integer) {
    let n: i128 = i.into();

    if n >= 0 {
        encode_uint(buf, 0, n as u64);
    } else {
        // CBOR encodes -1 as 0, -2 as 1, etc.
        encode_uint(buf, 1, (-1 - n) as u64);
    }
}

/// Encode an unsigned integer with the given major type.
fn encode_uint(buf: &mut Vec<u8>, major: u8, n: u64) {
    let mt = major << 5;
    if n < 24 {
        buf.push(mt | (n as u8));
    } else if n <= 0xff {
        buf.push(mt | 24);
        buf.push(n as u8);
    } else if n <= 0xffff {
        buf.push(mt | 25);
        buf.extend_from_slice(&(n as u16).to_be_bytes());
    } else if n <= 0xffff_ffff {
        buf.push(mt | 26);
        buf.extend_from_slice(&(n as u32).to_be_bytes());
    } else {
        buf.push(mt | 27);
        buf.extend_from_slice(&n.to_be_bytes());
    }
}

/// Encode a map canonically (major type 5).
fn encode_map_canonical(buf: &mut Vec<u8>, entries: &[(Value, Value)]) {
    let mut pairs: Vec<(Vec<u8>, &Value)> = entries
        .iter()
        .map(|(k, v)| {
            let mut key_buf = Vec::new();
            encode_value_to(&mut key_buf, k);
            (key_buf, v)
        })
        .collect();

    pairs.sort_by(|a, b| a.0.cmp(&b.0));

    encode_uint(buf, 5, pairs.len() as u64);
    for (key_bytes, value) in pairs {
        buf.extend_from_slice(&key_bytes);
        encode_value_to(buf, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decision::Reason;
    use crate::document::DocumentRef;
    use crate::types::{DocumentId, UserId};

    fn sample() -> AccessDecision {
        AccessDecision {
            viewer_id: UserId(3),
            viewer_username: "parent1".into(),
            subject_username: "student2".into(),
            document: DocumentRef::Single(DocumentId(900)),
            granted: false,
            reason: Reason::InsufficientPermissions,
            timestamp: 1736870400000,
            client_ip: Some("192.168.1.5".into()),
            client_agent: None,
        }
    }

    #[test]
    fn test_encoding_deterministic() {
        let d = sample();
        assert_eq!(canonical_decision_bytes(&d), canonical_decision_bytes(&d));
    }

    #[test]
    fn test_encoding_decodes_as_cbor_map() {
        let bytes = canonical_decision_bytes(&sample());
        let value: Value = ciborium::from_reader(&bytes[..]).unwrap();
        match value {
            Value::Map(entries) => assert_eq!(entries.len(), 10),
            other => panic!("expected map, got {:?}", other),
        }
    }

    #[test]
    fn test_any_field_change_changes_hash() {
        let base = sample();
        let h = chain_hash(&EntryHash::ZERO, &base);

        let mut flipped = base.clone();
        flipped.granted = true;
        assert_ne!(chain_hash(&EntryHash::ZERO, &flipped), h);

        let mut other_reason = base.clone();
        other_reason.reason = Reason::MentorAccess;
        assert_ne!(chain_hash(&EntryHash::ZERO, &other_reason), h);

        assert_ne!(chain_hash(&EntryHash::hash(b"x"), &base), h);
    }

    #[test]
    fn test_integer_encoding() {
        let mut buf = Vec::new();
        encode_uint(&mut buf, 0, 23);
        assert_eq!(buf, vec![0x17]);

        buf.clear();
        encode_uint(&mut buf, 0, 24);
        assert_eq!(buf, vec![0x18, 24]);

        buf.clear();
        encode_integer(&mut buf, (-1i64).into());
        assert_eq!(buf, vec![0x20]);
    }
}

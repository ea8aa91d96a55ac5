//! Magnet and metainfo parsing.
//!
//! # Design
//! - Identifiers are derived without the engine: magnets carry the info-hash in `xt`, metainfo
//!   payloads are hashed (SHA-1 over the canonical bencoding of `info`).
//! - Bencode decoding is delegated to `serde_bencode`; only the fields the coordinator needs
//!   are inspected.
//! - All failures surface as [`TransferError::MalformedDescriptor`] before any state change.

use std::collections::HashMap;

use serde::Deserialize;
use serde_bencode::value::Value;
use sha1::{Digest, Sha1};
use url::Url;

use crate::error::{TransferError, TransferResult};
use crate::model::{TransferId, TransferSource};

const BTIH_PREFIX: &str = "urn:btih:";
const PIECE_HASH_LEN: usize = 20;

/// Parsed descriptor ready for registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferDescriptor {
    /// Content-derived identifier.
    pub id: TransferId,
    /// Raw input kept for the engine.
    pub source: TransferSource,
    /// Name from `dn` (magnets) or `info.name` (metainfo).
    pub name: Option<String>,
    /// Tracker URLs from `tr` or `announce`.
    pub trackers: Vec<String>,
    /// Total payload size, known for metainfo only.
    pub total_size: Option<u64>,
}

/// Parse a `magnet:` URI.
///
/// # Errors
///
/// Returns [`TransferError::MalformedDescriptor`] when the input is not a magnet URI or has no
/// valid `urn:btih:` exact topic.
pub fn parse_magnet(input: &str) -> TransferResult<TransferDescriptor> {
    let trimmed = input.trim();
    let url = Url::parse(trimmed).map_err(|_| TransferError::malformed_magnet("not a URI"))?;
    if url.scheme() != "magnet" {
        return Err(TransferError::malformed_magnet("scheme must be magnet"));
    }

    let mut id = None;
    let mut name = None;
    let mut trackers = Vec::new();
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "xt" if id.is_none() => {
                if let Some(hash) = strip_prefix_ignore_case(&value, BTIH_PREFIX) {
                    id = Some(decode_info_hash(hash)?);
                }
            }
            "dn" if !value.trim().is_empty() => name = Some(value.trim().to_string()),
            "tr" if !value.is_empty() => trackers.push(value.into_owned()),
            _ => {}
        }
    }

    let id = id.ok_or_else(|| TransferError::malformed_magnet("missing urn:btih exact topic"))?;
    Ok(TransferDescriptor {
        id,
        source: TransferSource::Magnet {
            uri: trimmed.to_string(),
        },
        name,
        trackers,
        total_size: None,
    })
}

/// Parse a bencoded metainfo document.
///
/// # Errors
///
/// Returns [`TransferError::MalformedDescriptor`] when the payload is not bencode, lacks an
/// `info` dictionary, or the dictionary misses `name`, `piece length` or `pieces`.
pub fn parse_metainfo(bytes: &[u8]) -> TransferResult<TransferDescriptor> {
    if bytes.is_empty() {
        return Err(TransferError::malformed_metainfo("payload is empty"));
    }
    let document: MetainfoDocument = serde_bencode::from_bytes(bytes).map_err(|_| {
        TransferError::malformed_metainfo("payload is not a bencoded dictionary with info")
    })?;

    let Value::Dict(info) = &document.info else {
        return Err(TransferError::malformed_metainfo("info must be a dictionary"));
    };

    let name = match info.get(b"name".as_slice()) {
        Some(Value::Bytes(raw)) if !raw.is_empty() => String::from_utf8_lossy(raw).into_owned(),
        _ => return Err(TransferError::malformed_metainfo("info.name is missing")),
    };
    match info.get(b"piece length".as_slice()) {
        Some(Value::Int(length)) if *length > 0 => {}
        _ => {
            return Err(TransferError::malformed_metainfo(
                "info.piece length is missing",
            ));
        }
    }
    match info.get(b"pieces".as_slice()) {
        Some(Value::Bytes(pieces)) if !pieces.is_empty() && pieces.len() % PIECE_HASH_LEN == 0 => {}
        _ => return Err(TransferError::malformed_metainfo("info.pieces is invalid")),
    }

    let canonical = serde_bencode::to_bytes(&document.info)
        .map_err(|_| TransferError::malformed_metainfo("info could not be re-encoded"))?;
    let digest: [u8; 20] = Sha1::digest(&canonical).into();

    Ok(TransferDescriptor {
        id: TransferId::from_bytes(digest),
        source: TransferSource::Metainfo {
            bytes: bytes.to_vec(),
        },
        name: Some(name),
        trackers: document.announce.into_iter().collect(),
        total_size: total_size(info),
    })
}

#[derive(Deserialize)]
struct MetainfoDocument {
    info: Value,
    #[serde(default)]
    announce: Option<String>,
}

fn total_size(info: &HashMap<Vec<u8>, Value>) -> Option<u64> {
    if let Some(Value::Int(length)) = info.get(b"length".as_slice()) {
        return u64::try_from(*length).ok();
    }
    let Some(Value::List(files)) = info.get(b"files".as_slice()) else {
        return None;
    };
    files.iter().try_fold(0_u64, |sum, file| match file {
        Value::Dict(entry) => match entry.get(b"length".as_slice()) {
            Some(Value::Int(length)) => u64::try_from(*length).ok().map(|len| sum + len),
            _ => None,
        },
        _ => None,
    })
}

fn strip_prefix_ignore_case<'a>(value: &'a str, prefix: &str) -> Option<&'a str> {
    let head = value.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix)
        .then(|| &value[prefix.len()..])
}

fn decode_info_hash(hash: &str) -> TransferResult<TransferId> {
    let hash = hash.trim();
    match hash.len() {
        40 => hash
            .parse()
            .map_err(|_| TransferError::malformed_magnet("info-hash is not valid hex")),
        32 => {
            let decoded = data_encoding::BASE32
                .decode(hash.to_ascii_uppercase().as_bytes())
                .map_err(|_| TransferError::malformed_magnet("info-hash is not valid base32"))?;
            let bytes: [u8; 20] = decoded
                .try_into()
                .map_err(|_| TransferError::malformed_magnet("info-hash has the wrong length"))?;
            Ok(TransferId::from_bytes(bytes))
        }
        _ => Err(TransferError::malformed_magnet(
            "info-hash must be 40 hex or 32 base32 characters",
        )),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Minimal single-file metainfo document, keys in canonical order.
    pub(crate) fn sample_metainfo(name: &str) -> Vec<u8> {
        let mut info = Vec::new();
        info.extend_from_slice(b"d6:lengthi1024e4:name");
        info.extend_from_slice(format!("{}:{name}", name.len()).as_bytes());
        info.extend_from_slice(b"12:piece lengthi16384e6:pieces20:");
        info.extend_from_slice(&[0x11; 20]);
        info.push(b'e');

        let mut document = Vec::new();
        document.extend_from_slice(b"d8:announce23:http://tracker/announce4:info");
        document.extend_from_slice(&info);
        document.push(b'e');
        document
    }

    fn info_slice(document: &[u8]) -> &[u8] {
        let start = document
            .windows(6)
            .position(|window| window == b"4:info")
            .expect("info key")
            + 6;
        &document[start..document.len() - 1]
    }

    #[test]
    fn magnet_hex_hash_is_lowercased() {
        let upper = "A".repeat(40);
        let parsed = parse_magnet(&format!("magnet:?xt=urn:btih:{upper}")).expect("parse");
        assert_eq!(parsed.id.to_string(), "a".repeat(40));
        assert_eq!(parsed.source.kind(), "magnet");
        assert!(parsed.name.is_none());
    }

    #[test]
    fn magnet_base32_hash_decodes() {
        let base32 = "A".repeat(32);
        let parsed = parse_magnet(&format!("magnet:?xt=urn:btih:{base32}&dn=Some+Name"))
            .expect("parse");
        assert_eq!(parsed.id, TransferId::from_bytes([0; 20]));
        assert_eq!(parsed.name.as_deref(), Some("Some Name"));
    }

    #[test]
    fn magnet_collects_trackers_and_skips_other_topics() {
        let hash = "0123456789abcdef0123456789abcdef01234567";
        let uri = format!(
            "magnet:?xt=urn:btmh:1220aa&xt=urn:btih:{hash}&tr=udp%3A%2F%2Ft1&tr=udp%3A%2F%2Ft2"
        );
        let parsed = parse_magnet(&uri).expect("parse");
        assert_eq!(parsed.id.to_string(), hash);
        assert_eq!(parsed.trackers, vec!["udp://t1", "udp://t2"]);
    }

    #[test]
    fn malformed_magnets_are_rejected() {
        for input in [
            "",
            "not a uri",
            "http://example.com/?xt=urn:btih:aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa",
            "magnet:?dn=nothing",
            "magnet:?xt=urn:btih:1234",
            "magnet:?xt=urn:btih:zzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzz",
        ] {
            let err = parse_magnet(input).expect_err(input);
            assert!(
                matches!(err, TransferError::MalformedDescriptor { input: "magnet", .. }),
                "{input}: {err:?}"
            );
        }
    }

    #[test]
    fn metainfo_identifier_is_sha1_of_info() {
        let document = sample_metainfo("ubuntu.iso");
        let parsed = parse_metainfo(&document).expect("parse");
        let expected: [u8; 20] = Sha1::digest(info_slice(&document)).into();
        assert_eq!(parsed.id, TransferId::from_bytes(expected));
        assert_eq!(parsed.name.as_deref(), Some("ubuntu.iso"));
        assert_eq!(parsed.total_size, Some(1024));
        assert_eq!(parsed.trackers, vec!["http://tracker/announce"]);
    }

    #[test]
    fn metainfo_identifier_is_stable_across_parses() {
        let document = sample_metainfo("payload");
        let first = parse_metainfo(&document).expect("parse");
        let second = parse_metainfo(&document).expect("parse");
        assert_eq!(first.id, second.id);
        assert_ne!(
            first.id,
            parse_metainfo(&sample_metainfo("other")).expect("parse").id
        );
    }

    #[test]
    fn multi_file_sizes_are_summed() {
        let mut info = Vec::new();
        info.extend_from_slice(b"d5:filesld6:lengthi10e4:pathl1:aeed6:lengthi32e4:pathl1:beee");
        info.extend_from_slice(b"4:name3:dir12:piece lengthi16384e6:pieces20:");
        info.extend_from_slice(&[0x22; 20]);
        info.push(b'e');
        let mut document = b"d4:info".to_vec();
        document.extend_from_slice(&info);
        document.push(b'e');

        let parsed = parse_metainfo(&document).expect("parse");
        assert_eq!(parsed.total_size, Some(42));
        assert!(parsed.trackers.is_empty());
    }

    #[test]
    fn malformed_metainfo_is_rejected() {
        let missing_pieces = b"d4:infod4:name1:a12:piece lengthi1eee".to_vec();
        for payload in [
            Vec::new(),
            b"garbage".to_vec(),
            b"d3:fooi1ee".to_vec(),
            b"d4:infoi1ee".to_vec(),
            missing_pieces,
        ] {
            let err = parse_metainfo(&payload).expect_err("must fail");
            assert!(matches!(
                err,
                TransferError::MalformedDescriptor {
                    input: "metainfo",
                    ..
                }
            ));
        }
    }
}

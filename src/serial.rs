//! Binary serialization and deserialization of popup catalogs.
//!
//! This module provides a stable binary format for caching a parsed
//! [`Catalog`](crate::Catalog) so hosts can skip re-parsing catalog text on
//! every process start. The format consists of a 32-byte fixed header
//! followed by a bincode-encoded payload.
//!
//! ## Wire Format
//!
//! ```text
//! Offset  Size  Field
//! 0       4     Magic bytes: b"POPV"
//! 4       2     Format version (u16, little-endian)
//! 6       2     Engine version (u16, little-endian)
//! 8       4     Flags (u32, reserved)
//! 12      4     Payload length in bytes (u32, little-endian)
//! 16      16    BLAKE3 hash of the payload (truncated to 16 bytes)
//! 32..    var   Bincode-encoded payload
//! ```
//!
//! ## Versioning
//!
//! The format version in the header must match exactly. If it does not,
//! deserialization fails immediately with [`DeserializeError::IncompatibleVersion`].
//! The engine version is informational only.
//!
//! Parameters are stored as they were saved, never in their prepared form, so
//! a cache stays valid when handler validation rules change.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{Catalog, MatchMode, Param, PopupId, PopupRuleConfig};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

const MAGIC: &[u8; 4] = b"POPV";
const FORMAT_VERSION: u16 = 1;
const ENGINE_VERSION: u16 = 1;
const HEADER_SIZE: usize = 32;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur when serializing a [`Catalog`](crate::Catalog) to bytes.
#[derive(Debug, Error)]
pub enum SerializeError {
    #[error("failed to encode catalog: {0}")]
    Encode(#[from] bincode::error::EncodeError),

    #[error("catalog payload of {0} bytes exceeds the 4 GiB format limit")]
    TooLarge(usize),

    #[error("I/O error during serialization: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that can occur when deserializing a [`Catalog`](crate::Catalog) from bytes.
#[derive(Debug, Error)]
pub enum DeserializeError {
    #[error("not a popover catalog cache: invalid magic bytes")]
    BadMagic,

    #[error("incompatible format version: blob is v{blob}, engine supports v{supported}")]
    IncompatibleVersion { blob: u16, supported: u16 },

    #[error("integrity check failed: BLAKE3 checksum mismatch")]
    ChecksumMismatch,

    #[error("payload length mismatch: expected {expected} bytes, got {actual}")]
    LengthMismatch { expected: u32, actual: usize },

    #[error("failed to decode payload: {0}")]
    Decode(#[from] bincode::error::DecodeError),

    #[error("duplicate popup id {0} in cached catalog")]
    DuplicatePopup(u64),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("I/O error during deserialization: {0}")]
    Io(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Serialized type hierarchy
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
struct SerializedCatalog {
    metadata: CatalogMetadata,
    popups: Vec<SerializedPopup>,
}

#[derive(Debug, Serialize, Deserialize)]
struct CatalogMetadata {
    popup_count: usize,
    condition_count: usize,
    source_digest: Option<[u8; 32]>,
}

#[derive(Debug, Serialize, Deserialize)]
struct SerializedPopup {
    id: u64,
    any: bool,
    conditions: Vec<(String, SerializedParam)>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum SerializedParam {
    None,
    Int(i64),
    Str(String),
    List(Vec<String>),
}

// ---------------------------------------------------------------------------
// Param conversion
// ---------------------------------------------------------------------------

fn serialize_param(param: &Param) -> SerializedParam {
    match param {
        Param::None => SerializedParam::None,
        Param::Int(v) => SerializedParam::Int(*v),
        Param::Str(v) => SerializedParam::Str(v.clone()),
        Param::List(v) => SerializedParam::List(v.clone()),
    }
}

fn deserialize_param(param: SerializedParam) -> Param {
    match param {
        SerializedParam::None => Param::None,
        SerializedParam::Int(v) => Param::Int(v),
        SerializedParam::Str(v) => Param::Str(v),
        SerializedParam::List(v) => Param::List(v),
    }
}

// ---------------------------------------------------------------------------
// Catalog -> SerializedCatalog
// ---------------------------------------------------------------------------

fn catalog_to_serialized(catalog: &Catalog, source_text: Option<&str>) -> SerializedCatalog {
    let popups: Vec<SerializedPopup> = catalog
        .iter()
        .map(|(id, config)| SerializedPopup {
            id: id.0,
            any: config.mode() == MatchMode::Any,
            conditions: config
                .conditions()
                .iter()
                .map(|(cond, param)| (cond.clone(), serialize_param(param)))
                .collect(),
        })
        .collect();

    SerializedCatalog {
        metadata: CatalogMetadata {
            popup_count: popups.len(),
            condition_count: popups.iter().map(|p| p.conditions.len()).sum(),
            source_digest: source_text.map(digest),
        },
        popups,
    }
}

fn digest(source_text: &str) -> [u8; 32] {
    *blake3::hash(source_text.as_bytes()).as_bytes()
}

// ---------------------------------------------------------------------------
// SerializedCatalog -> Catalog
// ---------------------------------------------------------------------------

fn serialized_to_catalog(ser: SerializedCatalog) -> Result<Catalog, DeserializeError> {
    validate(&ser)?;

    let popups = ser
        .popups
        .into_iter()
        .map(|sp| {
            let mode = if sp.any { MatchMode::Any } else { MatchMode::All };
            let mut config = PopupRuleConfig::new().with_mode(mode);
            for (cond, param) in sp.conditions {
                config.push(&cond, deserialize_param(param));
            }
            (PopupId(sp.id), config)
        })
        .collect();

    Ok(Catalog { popups })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(ser: &SerializedCatalog) -> Result<(), DeserializeError> {
    // Metadata consistency
    if ser.metadata.popup_count != ser.popups.len() {
        return Err(DeserializeError::Validation(format!(
            "metadata says {} popups but payload has {}",
            ser.metadata.popup_count,
            ser.popups.len()
        )));
    }
    let condition_count: usize = ser.popups.iter().map(|p| p.conditions.len()).sum();
    if ser.metadata.condition_count != condition_count {
        return Err(DeserializeError::Validation(format!(
            "metadata says {} conditions but payload has {}",
            ser.metadata.condition_count, condition_count
        )));
    }

    let mut seen = HashSet::with_capacity(ser.popups.len());
    for popup in &ser.popups {
        if !seen.insert(popup.id) {
            return Err(DeserializeError::DuplicatePopup(popup.id));
        }
        validate_conditions(popup)?;
    }

    Ok(())
}

fn validate_conditions(popup: &SerializedPopup) -> Result<(), DeserializeError> {
    let mut seen = HashSet::with_capacity(popup.conditions.len());
    for (cond, _) in &popup.conditions {
        if cond.is_empty() {
            return Err(DeserializeError::Validation(format!(
                "popup {} has an empty condition id",
                popup.id
            )));
        }
        if !seen.insert(cond.as_str()) {
            return Err(DeserializeError::Validation(format!(
                "popup {} lists condition '{cond}' twice",
                popup.id
            )));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Header I/O
// ---------------------------------------------------------------------------

fn write_header(buf: &mut Vec<u8>, payload: &[u8]) -> Result<(), SerializeError> {
    let hash = blake3::hash(payload);
    let hash_bytes = hash.as_bytes();
    let payload_len =
        u32::try_from(payload.len()).map_err(|_| SerializeError::TooLarge(payload.len()))?;

    buf.extend_from_slice(MAGIC);
    buf.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
    buf.extend_from_slice(&ENGINE_VERSION.to_le_bytes());
    buf.extend_from_slice(&0u32.to_le_bytes()); // flags (reserved)
    buf.extend_from_slice(&payload_len.to_le_bytes());
    buf.extend_from_slice(&hash_bytes[..16]);
    Ok(())
}

#[allow(clippy::cast_possible_truncation)] // HEADER_SIZE is 32, always fits in u32
fn read_header(bytes: &[u8]) -> Result<(u16, u32, [u8; 16]), DeserializeError> {
    if bytes.len() < HEADER_SIZE {
        return Err(DeserializeError::LengthMismatch {
            expected: HEADER_SIZE as u32,
            actual: bytes.len(),
        });
    }

    if &bytes[0..4] != MAGIC {
        return Err(DeserializeError::BadMagic);
    }

    let format_version = u16::from_le_bytes([bytes[4], bytes[5]]);
    // bytes[6..8] is engine_version, bytes[8..12] is flags
    let payload_len = u32::from_le_bytes([bytes[12], bytes[13], bytes[14], bytes[15]]);

    let mut hash = [0u8; 16];
    hash.copy_from_slice(&bytes[16..32]);

    Ok((format_version, payload_len, hash))
}

// ---------------------------------------------------------------------------
// Public encode/decode
// ---------------------------------------------------------------------------

pub(crate) fn encode(
    catalog: &Catalog,
    source_text: Option<&str>,
) -> Result<Vec<u8>, SerializeError> {
    let serialized = catalog_to_serialized(catalog, source_text);
    let payload = bincode::serde::encode_to_vec(&serialized, bincode::config::standard())?;

    let mut buf = Vec::with_capacity(HEADER_SIZE + payload.len());
    write_header(&mut buf, &payload)?;
    buf.extend_from_slice(&payload);
    Ok(buf)
}

fn decode_payload(bytes: &[u8]) -> Result<SerializedCatalog, DeserializeError> {
    let (format_version, payload_len, stored_hash) = read_header(bytes)?;

    if format_version != FORMAT_VERSION {
        return Err(DeserializeError::IncompatibleVersion {
            blob: format_version,
            supported: FORMAT_VERSION,
        });
    }

    let payload = &bytes[HEADER_SIZE..];
    if payload.len() != payload_len as usize {
        return Err(DeserializeError::LengthMismatch {
            expected: payload_len,
            actual: payload.len(),
        });
    }

    // Integrity check
    let computed_hash = blake3::hash(payload);
    if computed_hash.as_bytes()[..16] != stored_hash {
        return Err(DeserializeError::ChecksumMismatch);
    }

    let (serialized, _): (SerializedCatalog, usize) =
        bincode::serde::decode_from_slice(payload, bincode::config::standard())?;
    Ok(serialized)
}

pub(crate) fn decode(bytes: &[u8]) -> Result<Catalog, DeserializeError> {
    serialized_to_catalog(decode_payload(bytes)?)
}

/// Decode only if the cache was written from exactly `source_text`.
pub(crate) fn decode_if_fresh(
    bytes: &[u8],
    source_text: &str,
) -> Result<Option<Catalog>, DeserializeError> {
    let serialized = decode_payload(bytes)?;
    if serialized.metadata.source_digest != Some(digest(source_text)) {
        return Ok(None);
    }
    serialized_to_catalog(serialized).map(Some)
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

//! Response format selection from the request's `Accept` header.
//!
//! Discovery clients commonly omit `Accept` entirely, so an empty or
//! unmatched header falls back to the canonical JSON media type instead of
//! failing; negotiation only errors when the fallback itself is not among
//! the supported types.

use annex_core::{AnnexError, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Canonical JSON media type; the fallback when negotiation yields no match
pub const MEDIA_TYPE_JSON: &str = "application/json";
/// YAML media type
pub const MEDIA_TYPE_YAML: &str = "application/yaml";

/// Media types this server can produce, in preference order
pub const SUPPORTED_MEDIA_TYPES: &[&str] = &[MEDIA_TYPE_JSON, MEDIA_TYPE_YAML];

/// Wire format backing a negotiated media type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireFormat {
    Json,
    Yaml,
}

/// A resolved serializer for one request; never persisted
#[derive(Debug, Clone)]
pub struct SerializerInfo {
    pub media_type: String,
    pub format: WireFormat,
}

impl SerializerInfo {
    /// Resolve a serializer for an exact media type, if one exists
    pub fn from_media_type(media_type: &str) -> Option<Self> {
        let format = match media_type {
            MEDIA_TYPE_JSON => WireFormat::Json,
            MEDIA_TYPE_YAML => WireFormat::Yaml,
            _ => return None,
        };
        Some(Self {
            media_type: media_type.to_string(),
            format,
        })
    }

    /// Encode a value in this serializer's wire format
    pub fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>> {
        match self.format {
            WireFormat::Json => annex_core::to_json(value),
            WireFormat::Yaml => annex_core::to_yaml(value),
        }
    }

    /// Decode a payload in this serializer's wire format
    pub fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T> {
        match self.format {
            WireFormat::Json => annex_core::from_json(data),
            WireFormat::Yaml => annex_core::from_yaml(data),
        }
    }
}

/// One media range from an `Accept` header
struct AcceptClause<'a> {
    kind: &'a str,
    subtype: &'a str,
    quality: f32,
}

fn parse_accept(header: &str) -> Vec<AcceptClause<'_>> {
    header
        .split(',')
        .filter_map(|entry| {
            let mut pieces = entry.trim().split(';');
            let media_range = pieces.next()?.trim();
            let (kind, subtype) = media_range.split_once('/')?;

            let mut quality = 1.0f32;
            for param in pieces {
                if let Some((key, value)) = param.trim().split_once('=') {
                    if key.trim() == "q" {
                        quality = value.trim().parse().unwrap_or(1.0);
                    }
                }
            }

            Some(AcceptClause {
                kind: kind.trim(),
                subtype: subtype.trim(),
                quality,
            })
        })
        .collect()
}

fn clause_matches(clause: &AcceptClause<'_>, media_type: &str) -> bool {
    let Some((kind, subtype)) = media_type.split_once('/') else {
        return false;
    };
    (clause.kind == "*" || clause.kind == kind)
        && (clause.subtype == "*" || clause.subtype == subtype)
}

/// Match an `Accept` header against the supported media types.
///
/// Returns the supported type preferred by the highest-quality matching
/// clause, or `None` when nothing matches (including an empty header).
pub fn negotiate<'a>(accept: &str, supported: &[&'a str]) -> Option<&'a str> {
    let mut clauses = parse_accept(accept);
    // Stable sort: equal-quality clauses keep their header order
    clauses.sort_by(|a, b| {
        b.quality
            .partial_cmp(&a.quality)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    for clause in &clauses {
        if clause.quality <= 0.0 {
            continue;
        }
        if let Some(media_type) = supported.iter().copied().find(|m| clause_matches(clause, m)) {
            return Some(media_type);
        }
    }

    None
}

/// Resolve the serializer for a request's `Accept` header.
///
/// Unmatched or absent preferences fall back to [`MEDIA_TYPE_JSON`]; fails
/// only when the fallback is not in `supported` (a configuration error).
pub fn accepted_serializer(accept: &str, supported: &[&str]) -> Result<SerializerInfo> {
    let media_type = negotiate(accept, supported).unwrap_or(MEDIA_TYPE_JSON);

    if !supported.contains(&media_type) {
        return Err(AnnexError::not_acceptable(accept));
    }

    SerializerInfo::from_media_type(media_type).ok_or_else(|| AnnexError::not_acceptable(accept))
}

//! IPN (instant payment notification) signature verification.
//!
//! The gateway signs every IPN callback with
//! `HMAC-SHA512(canonical_json(body), ipn_secret)` and sends the hex digest
//! in the [`IPN_SIGNATURE_HEADER`] header. Canonical JSON means object keys
//! sorted lexicographically with compact separators; `serde_json`'s default
//! `BTreeMap`-backed objects produce exactly that.

use compact_str::CompactString;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::objects::PaymentState;

/// Header carrying the IPN HMAC digest.
pub const IPN_SIGNATURE_HEADER: &str = "x-nowpayments-sig";

/// Errors produced while authenticating an IPN callback.
#[derive(Debug, thiserror::Error)]
pub enum IpnError {
    #[error("missing signature header")]
    MissingSignature,
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid hex encoding")]
    InvalidHex,
    #[error("invalid signature")]
    SignatureMismatch,
}

/// The authenticated part of an IPN body the application acts on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpnPayload {
    pub payment_id: CompactString,
    pub payment_status: PaymentState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actually_paid: Option<Decimal>,
}

/// Re-serialize a JSON body with sorted keys and compact separators.
pub fn canonical_json(value: &serde_json::Value) -> Result<String, serde_json::Error> {
    serde_json::to_string(value)
}

/// Verify an IPN request body against its signature header.
///
/// Returns the typed payload only when the digest matches; comparison is
/// constant-time.
pub fn verify_ipn(
    raw_body: &str,
    signature_hex: &str,
    ipn_secret: &[u8],
) -> Result<IpnPayload, IpnError> {
    if signature_hex.is_empty() {
        return Err(IpnError::MissingSignature);
    }

    let value: serde_json::Value = serde_json::from_str(raw_body)?;
    let canonical = canonical_json(&value)?;

    let key = ring::hmac::Key::new(ring::hmac::HMAC_SHA512, ipn_secret);
    let tag = ring::hmac::sign(&key, canonical.as_bytes());

    let provided = decode_hex(signature_hex)?;
    ring::constant_time::verify_slices_are_equal(tag.as_ref(), &provided)
        .map_err(|_| IpnError::SignatureMismatch)?;

    serde_json::from_value(value).map_err(IpnError::Json)
}

/// Compute the hex digest the gateway would send for `raw_body`.
///
/// Useful for tests and for callers that relay IPNs onward.
pub fn sign_ipn(raw_body: &str, ipn_secret: &[u8]) -> Result<String, IpnError> {
    let value: serde_json::Value = serde_json::from_str(raw_body)?;
    let canonical = canonical_json(&value)?;
    let key = ring::hmac::Key::new(ring::hmac::HMAC_SHA512, ipn_secret);
    let tag = ring::hmac::sign(&key, canonical.as_bytes());
    Ok(encode_hex(tag.as_ref()))
}

fn encode_hex(bytes: &[u8]) -> String {
    use std::fmt::Write;
    bytes.iter().fold(
        String::with_capacity(bytes.len() * 2),
        |mut out, byte| {
            let _ = write!(out, "{byte:02x}");
            out
        },
    )
}

fn decode_hex(s: &str) -> Result<Vec<u8>, IpnError> {
    if s.len() % 2 != 0 {
        return Err(IpnError::InvalidHex);
    }
    (0..s.len())
        .step_by(2)
        .map(|i| {
            s.get(i..i + 2)
                .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                .ok_or(IpnError::InvalidHex)
        })
        .collect()
}

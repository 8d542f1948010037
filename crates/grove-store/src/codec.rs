//! Canonical object encoding: `<type> <size>\0<payload>`.
//!
//! The header is ASCII: a lowercase type name, one space, the payload length
//! in decimal, and a NUL. The payload follows verbatim and may contain any
//! bytes, including NUL. Decoding finds the payload boundary from the end of
//! the decimal run and then takes exactly `size` bytes.

use crate::error::{StoreError, StoreResult};
use crate::object::ObjectKind;

/// A decoded object borrowing its payload from the input buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Decoded<'a> {
    pub kind: ObjectKind,
    pub size: u64,
    pub payload: &'a [u8],
}

/// Header bytes for an object of `kind` with a payload of `len` bytes.
pub fn encode_header(kind: ObjectKind, len: usize) -> Vec<u8> {
    format!("{} {}\0", kind.name(), len).into_bytes()
}

/// Encode an object into its canonical byte form.
pub fn encode(kind: ObjectKind, payload: &[u8]) -> Vec<u8> {
    let mut out = encode_header(kind, payload.len());
    out.reserve_exact(payload.len());
    out.extend_from_slice(payload);
    out
}

/// Decode the canonical byte form of an object.
///
/// Fails with [`StoreError::MalformedHeader`] if the type token is missing or
/// unknown, the size is not a canonical non-negative decimal, the size is
/// not followed by NUL, or the payload length disagrees with the size.
pub fn decode(bytes: &[u8]) -> StoreResult<Decoded<'_>> {
    let space = bytes
        .iter()
        .position(|&b| b == b' ')
        .ok_or_else(|| malformed("missing space after type"))?;

    let token = &bytes[..space];
    let kind = ObjectKind::from_name(token).ok_or_else(|| {
        malformed(format!(
            "unknown object type {:?}",
            String::from_utf8_lossy(token)
        ))
    })?;

    let rest = &bytes[space + 1..];
    let digits = rest.iter().take_while(|b| b.is_ascii_digit()).count();
    if digits == 0 {
        return Err(malformed("missing object size"));
    }
    if digits > 1 && rest[0] == b'0' {
        return Err(malformed("object size has a leading zero"));
    }
    let size = parse_decimal(&rest[..digits])?;

    match rest.get(digits) {
        Some(0) => {}
        Some(&b) => {
            return Err(malformed(format!(
                "unexpected byte 0x{b:02x} after object size"
            )))
        }
        None => return Err(malformed("missing NUL after object size")),
    }

    let payload = &rest[digits + 1..];
    let expected = usize::try_from(size)
        .map_err(|_| malformed(format!("object size {size} exceeds address space")))?;
    if payload.len() < expected {
        return Err(malformed(format!(
            "truncated payload: header declares {size} bytes, found {}",
            payload.len()
        )));
    }
    if payload.len() > expected {
        return Err(malformed(format!(
            "trailing data: header declares {size} bytes, found {}",
            payload.len()
        )));
    }

    Ok(Decoded {
        kind,
        size,
        payload,
    })
}

fn parse_decimal(digits: &[u8]) -> StoreResult<u64> {
    digits.iter().try_fold(0u64, |acc, &d| {
        acc.checked_mul(10)
            .and_then(|v| v.checked_add(u64::from(d - b'0')))
            .ok_or_else(|| malformed("object size overflows u64"))
    })
}

fn malformed(reason: impl Into<String>) -> StoreError {
    StoreError::MalformedHeader(reason.into())
}

//! Byte-order conventions of the realm daemon's big numbers.
//!
//! The daemon keeps big numbers as little-endian byte arrays but prints and
//! stores them as hex of the *reversed* array, i.e. most significant byte
//! first. Hash digests that feed an exponent are reversed before being read
//! as little-endian, which amounts to reading the digest big-endian.

use num_bigint::BigUint;

/// Read a hash digest as the daemon does: reverse it, then decode
/// little-endian as an unsigned integer.
pub fn decode_digest(digest: &[u8]) -> BigUint {
    let mut reversed = digest.to_vec();
    reversed.reverse();
    BigUint::from_bytes_le(&reversed)
}

/// Little-endian encoding of `value` in exactly `width` bytes.
///
/// Short values are zero padded; longer encodings are truncated to their
/// low `width` bytes.
pub fn encode_le_fixed(value: &BigUint, width: usize) -> Vec<u8> {
    let mut bytes = value.to_bytes_le();
    bytes.resize(width, 0);
    bytes
}

/// Uppercase hex of the reversed byte array, no separators.
pub fn to_protocol_hex(bytes: &[u8]) -> String {
    let mut reversed = bytes.to_vec();
    reversed.reverse();
    hex::encode_upper(reversed)
}

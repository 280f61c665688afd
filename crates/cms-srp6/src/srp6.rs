//! Salt and verifier derivation.

use crate::codec::{decode_digest, encode_le_fixed, to_protocol_hex};
use crate::errors::{CredentialError, CredentialResult};
use num_bigint::BigUint;
use rand::rngs::OsRng;
use rand::RngCore;
use sha1::{Digest, Sha1};

/// Width in bytes of both the salt and the stored verifier.
pub const SRP6_WIDTH: usize = 32;

/// Group generator `g`.
pub const SRP6_GENERATOR: u32 = 7;

/// Group modulus `N`, big-endian.
pub const SRP6_MODULUS: [u8; 32] = [
    0x89, 0x4B, 0x64, 0x5E, 0x89, 0xE1, 0x53, 0x5B, 0xBD, 0xAD, 0x5B, 0x8B, 0x29, 0x06, 0x50, 0x53,
    0x08, 0x01, 0xB1, 0x8E, 0xBF, 0xBF, 0x5E, 0x8F, 0xAB, 0x3C, 0x82, 0x87, 0x2A, 0x3E, 0x9B, 0xB7,
];

/// Salt and verifier for one account, both little-endian.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Srp6Credentials {
    pub salt: [u8; SRP6_WIDTH],
    pub verifier: [u8; SRP6_WIDTH],
}

impl Srp6Credentials {
    /// Derive credentials for `identity_hash` with a fresh random salt.
    ///
    /// `identity_hash` is the hex SHA1 of `NAME:PASSWORD`, see
    /// [`crate::identity_hash`].
    pub fn generate(identity_hash: &str) -> CredentialResult<Self> {
        let mut salt = [0u8; SRP6_WIDTH];
        OsRng.fill_bytes(&mut salt);
        Self::derive_with_salt(salt, identity_hash)
    }

    /// Deterministic derivation from an explicit salt.
    pub fn derive_with_salt(salt: [u8; SRP6_WIDTH], identity_hash: &str) -> CredentialResult<Self> {
        let identity = hex::decode(identity_hash.trim())
            .map_err(|e| CredentialError::invalid_identity_hash(e.to_string()))?;

        let mut hasher = Sha1::new();
        hasher.update(salt);
        hasher.update(&identity);
        let x = decode_digest(&hasher.finalize());

        let v = BigUint::from(SRP6_GENERATOR).modpow(&x, &modulus());

        let mut verifier = [0u8; SRP6_WIDTH];
        verifier.copy_from_slice(&encode_le_fixed(&v, SRP6_WIDTH));

        Ok(Self { salt, verifier })
    }

    /// Value for the `account.s` column.
    pub fn salt_hex(&self) -> String {
        to_protocol_hex(&self.salt)
    }

    /// Value for the `account.v` column.
    pub fn verifier_hex(&self) -> String {
        to_protocol_hex(&self.verifier)
    }
}

fn modulus() -> BigUint {
    BigUint::from_bytes_be(&SRP6_MODULUS)
}

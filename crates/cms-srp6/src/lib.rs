//! SRP6 credential derivation compatible with the CMaNGOS realm daemon.
//!
//! The realm daemon authenticates clients against the `s` (salt) and `v`
//! (verifier) columns of the `account` table. This crate derives both from an
//! account name and password exactly the way the daemon expects them, plus
//! the account-name/password checks the daemon enforces.
//!
//! ```
//! use cms_srp6::{identity_hash, Srp6Credentials};
//!
//! let hash = identity_hash("player", "secret");
//! let creds = Srp6Credentials::generate(&hash).unwrap();
//! assert_eq!(creds.salt_hex().len(), 64);
//! assert_eq!(creds.verifier_hex().len(), 64);
//! ```

pub mod account;
pub mod codec;
pub mod errors;
pub mod srp6;

pub use account::{
    identity_hash, normalize_credential, sha_pass_hash, validate_account_name, validate_password,
    MAX_ACCOUNT_STR,
};
pub use errors::{CredentialError, CredentialResult};
pub use srp6::{Srp6Credentials, SRP6_GENERATOR, SRP6_MODULUS, SRP6_WIDTH};

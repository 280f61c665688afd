//! Account name and password rules of the realm database.

use crate::errors::{CredentialError, CredentialResult};
use sha1::{Digest, Sha1};

/// Longest account name or password the daemon accepts, in UTF-8 bytes.
pub const MAX_ACCOUNT_STR: usize = 16;

/// Trim and upper-case; blank input becomes empty.
///
/// Case mapping is one char to one char. A char whose upper case expands to
/// several chars (`ß` → `SS`) is kept as is, which is what the realm
/// database hashes were written with.
pub fn normalize_credential(input: &str) -> String {
    input.trim().chars().map(upper_single).collect()
}

fn upper_single(c: char) -> char {
    let mut upper = c.to_uppercase();
    match (upper.next(), upper.next()) {
        (Some(u), None) => u,
        _ => c,
    }
}

/// Letters, or ASCII decimal digits.
///
/// Letter-like numbers (`Ⅻ`) and other number forms (`²`, `½`) are not
/// digits. Non-ASCII decimal digits are rejected as well: std has no
/// general-category lookup to tell them apart from other number forms.
fn is_letter_or_digit(c: char) -> bool {
    (c.is_alphabetic() && !c.is_numeric()) || c.is_ascii_digit()
}

/// Uppercase hex SHA1 of `name:password`, taken as given.
pub fn sha_pass_hash(name: &str, password: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(name.as_bytes());
    hasher.update(b":");
    hasher.update(password.as_bytes());
    hex::encode_upper(hasher.finalize())
}

/// Identity hash fed to SRP6: [`sha_pass_hash`] of the normalized pair.
pub fn identity_hash(username: &str, password: &str) -> String {
    sha_pass_hash(
        &normalize_credential(username),
        &normalize_credential(password),
    )
}

pub fn validate_account_name(username: &str) -> CredentialResult<()> {
    if username.trim().is_empty() {
        return Err(CredentialError::invalid_account_name("name is required"));
    }
    if username.len() > MAX_ACCOUNT_STR {
        return Err(CredentialError::invalid_account_name(format!(
            "longer than {} bytes",
            MAX_ACCOUNT_STR
        )));
    }
    if !username.chars().all(is_letter_or_digit) {
        return Err(CredentialError::invalid_account_name(
            "only letters and digits are allowed",
        ));
    }
    Ok(())
}

pub fn validate_password(password: &str) -> CredentialResult<()> {
    if password.trim().is_empty() {
        return Err(CredentialError::invalid_password("password is required"));
    }
    if password.len() > MAX_ACCOUNT_STR {
        return Err(CredentialError::invalid_password(format!(
            "longer than {} bytes",
            MAX_ACCOUNT_STR
        )));
    }
    Ok(())
}

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CredentialError {
    #[error("Identity hash is not valid hex: {reason}")]
    InvalidIdentityHash { reason: String },

    #[error("Invalid account name: {reason}")]
    InvalidAccountName { reason: String },

    #[error("Invalid password: {reason}")]
    InvalidPassword { reason: String },
}

impl CredentialError {
    pub fn invalid_identity_hash(reason: impl Into<String>) -> Self {
        Self::InvalidIdentityHash {
            reason: reason.into(),
        }
    }

    pub fn invalid_account_name(reason: impl Into<String>) -> Self {
        Self::InvalidAccountName {
            reason: reason.into(),
        }
    }

    pub fn invalid_password(reason: impl Into<String>) -> Self {
        Self::InvalidPassword {
            reason: reason.into(),
        }
    }
}

pub type CredentialResult<T> = std::result::Result<T, CredentialError>;

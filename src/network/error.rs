// ABOUTME: Error types for network provider operations.
// ABOUTME: Config, credential, tailnet/tag mismatch, install, and remote command failures.

use crate::ssh;

#[derive(Debug, thiserror::Error)]
pub enum NetworkError {
    #[error("invalid network config: {0}")]
    ConfigInvalid(String),

    #[error("network provider id must not be empty")]
    EmptyProviderId,

    #[error("network provider {0:?} already registered")]
    DuplicateProvider(String),

    #[error("auth key missing from environment variable {0}")]
    AuthKeyMissing(String),

    #[error("invalid or expired auth key")]
    AuthKeyInvalid,

    #[error("host is in tailnet {actual:?}, expected {expected:?}")]
    TailnetMismatch { actual: String, expected: String },

    #[error("host tags {actual:?} do not match expected {expected:?}")]
    TagMismatch {
        actual: Vec<String>,
        expected: Vec<String>,
    },

    #[error("unsupported operating system: {0}")]
    UnsupportedOs(String),

    #[error("installation failed: {0}")]
    InstallFailed(String),

    #[error("join failed: {0}")]
    JoinFailed(String),

    #[error("could not read network status: {0}")]
    Status(String),

    #[error(transparent)]
    Command(#[from] ssh::Error),
}

impl NetworkError {
    pub fn code(&self) -> &'static str {
        match self {
            NetworkError::ConfigInvalid(_) => "config_invalid",
            NetworkError::EmptyProviderId | NetworkError::DuplicateProvider(_) => {
                "invalid_registration"
            }
            NetworkError::AuthKeyMissing(_) => "auth_key_missing",
            NetworkError::AuthKeyInvalid => "auth_key_invalid",
            NetworkError::TailnetMismatch { .. } => "tailnet_mismatch",
            NetworkError::TagMismatch { .. } => "tag_mismatch",
            NetworkError::UnsupportedOs(_) => "unsupported_os",
            NetworkError::InstallFailed(_) => "install_failed",
            NetworkError::JoinFailed(_) => "join_failed",
            NetworkError::Status(_) => "status_unreadable",
            NetworkError::Command(e) => e.code(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, NetworkError::Command(ssh::Error::Cancelled))
    }
}

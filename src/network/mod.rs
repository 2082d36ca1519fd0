// ABOUTME: Mesh network providers used by host bootstrap.
// ABOUTME: Providers are registered explicitly in a NetworkRegistry built at startup.

mod error;
mod registry;
pub mod tailscale;

pub use error::NetworkError;
pub use registry::NetworkRegistry;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::bootstrap::Host;

/// Arguments for [`NetworkProvider::ensure_installed`].
#[derive(Debug, Clone, Copy)]
pub struct InstallOptions<'a> {
    pub host: &'a Host,
    /// Provider-specific block from `infra.bootstrap.network.config`.
    pub config: Option<&'a serde_yaml::Value>,
}

/// Arguments for [`NetworkProvider::ensure_joined`].
#[derive(Debug, Clone, Copy)]
pub struct JoinOptions<'a> {
    pub host: &'a Host,
    pub config: Option<&'a serde_yaml::Value>,
    /// Host tags, merged by the provider with any configured tags.
    pub tags: &'a [String],
}

/// A mesh network a host can be installed into and joined to.
///
/// Both operations must be idempotent: already installed or already joined
/// is success.
#[async_trait]
pub trait NetworkProvider: Send + Sync {
    fn id(&self) -> &str;

    async fn ensure_installed(
        &self,
        opts: InstallOptions<'_>,
        cancel: &CancellationToken,
    ) -> Result<(), NetworkError>;

    async fn ensure_joined(
        &self,
        opts: JoinOptions<'_>,
        cancel: &CancellationToken,
    ) -> Result<(), NetworkError>;

    /// Fully qualified name of `host` on the mesh network.
    fn node_fqdn(&self, host: &str, config: Option<&serde_yaml::Value>)
    -> Result<String, NetworkError>;
}

// ABOUTME: Explicit registry of network providers, keyed by provider ID.
// ABOUTME: Built once at startup and passed to the bootstrap engine.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::bootstrap::CommandExecutor;

use super::tailscale::TailscaleProvider;
use super::{NetworkError, NetworkProvider};

#[derive(Default)]
pub struct NetworkRegistry {
    providers: BTreeMap<String, Arc<dyn NetworkProvider>>,
}

impl NetworkRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in providers, running commands through `executor`.
    pub fn with_builtin(executor: Arc<dyn CommandExecutor>) -> Self {
        let mut registry = Self::new();
        registry
            .providers
            .insert(TailscaleProvider::ID.to_string(), Arc::new(TailscaleProvider::new(executor)));
        registry
    }

    pub fn register(&mut self, provider: Arc<dyn NetworkProvider>) -> Result<(), NetworkError> {
        let id = provider.id().trim().to_string();
        if id.is_empty() {
            return Err(NetworkError::EmptyProviderId);
        }
        if self.providers.contains_key(&id) {
            return Err(NetworkError::DuplicateProvider(id));
        }
        self.providers.insert(id, provider);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<Arc<dyn NetworkProvider>> {
        self.providers.get(id).cloned()
    }

    pub fn has(&self, id: &str) -> bool {
        self.providers.contains_key(id)
    }

    /// Registered IDs, sorted.
    pub fn ids(&self) -> Vec<String> {
        self.providers.keys().cloned().collect()
    }
}

impl std::fmt::Debug for NetworkRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetworkRegistry")
            .field("providers", &self.ids())
            .finish()
    }
}

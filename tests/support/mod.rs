// ABOUTME: Test support utilities.
// ABOUTME: Fakes for command execution, network providers, and phase functions, plus config builders.

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Once;
use tokio_util::sync::CancellationToken;

use stagecraft::bootstrap::{CommandExecutor, Host};
use stagecraft::config::Config;
use stagecraft::deploy::{PhaseContext, PhaseError, PhaseFns};
use stagecraft::network::{InstallOptions, JoinOptions, NetworkError, NetworkProvider};
use stagecraft::ssh::{self, CommandOutput};
use stagecraft::state::Phase;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for tests. Safe to call multiple times.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::EnvFilter;
        let filter = EnvFilter::from_default_env().add_directive("stagecraft=debug".parse().unwrap());
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// Parse a config, panicking on error.
pub fn config(yaml: &str) -> Config {
    Config::from_yaml(yaml).unwrap()
}

/// Config with one environment and no databases or backend.
pub fn minimal_config(env: &str) -> Config {
    config(&format!(
        "project:\n  name: shop\nenvironments:\n  {env}:\n    driver: digitalocean\n"
    ))
}

/// Config with a backend, one pre-deploy and one post-deploy database.
pub fn full_config() -> Config {
    config(
        r#"
project:
  name: shop
backend:
  provider: encore
databases:
  z_db:
    connection_env: Z_DATABASE_URL
    migrations:
      engine: raw
      path: migrations/z
      strategy: pre_deploy
  a_db:
    migrations:
      engine: raw
      path: migrations/a
      strategy: pre_deploy
  events:
    migrations:
      engine: raw
      path: migrations/events
      strategy: post_deploy
  legacy:
    migrations:
      engine: raw
      path: migrations/legacy
      strategy: manual
environments:
  staging:
    driver: digitalocean
  prod:
    driver: digitalocean
"#,
    )
}

pub fn host(id: &str, ip: &str) -> Host {
    Host::new(id).with_public_ip(ip)
}

#[derive(Debug, Clone)]
enum Reply {
    Ok(String),
    Fail { exit_code: i32, stderr: String },
}

#[derive(Debug, Clone)]
struct Entry {
    host: Option<String>,
    prefix: String,
    reply: Reply,
    /// Removed after its first match.
    once: bool,
}

impl Entry {
    fn any(prefix: &str, reply: Reply) -> Self {
        Self {
            host: None,
            prefix: prefix.to_string(),
            reply,
            once: false,
        }
    }
}

fn failure(stderr: &str) -> Reply {
    Reply::Fail {
        exit_code: 1,
        stderr: stderr.to_string(),
    }
}

/// Command executor that records every call and answers from a script.
///
/// Unscripted commands succeed with empty output.
#[derive(Default)]
pub struct RecordingExecutor {
    calls: Mutex<Vec<(String, String)>>,
    /// First matching entry wins.
    script: Mutex<Vec<Entry>>,
    unreachable: Mutex<Vec<String>>,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every command to `host_id` fails like an unreachable ssh target.
    pub fn unreachable(self, host_id: &str) -> Self {
        self.unreachable.lock().push(host_id.to_string());
        self
    }

    pub fn reply(self, command_prefix: &str, stdout: &str) -> Self {
        self.script
            .lock()
            .push(Entry::any(command_prefix, Reply::Ok(stdout.to_string())));
        self
    }

    pub fn fail(self, command_prefix: &str, stderr: &str) -> Self {
        self.script
            .lock()
            .push(Entry::any(command_prefix, failure(stderr)));
        self
    }

    /// Fail the first matching command only; later calls fall through.
    pub fn fail_once(self, command_prefix: &str, stderr: &str) -> Self {
        self.script.lock().push(Entry {
            once: true,
            ..Entry::any(command_prefix, failure(stderr))
        });
        self
    }

    pub fn fail_on(self, host_id: &str, command_prefix: &str, stderr: &str) -> Self {
        self.script.lock().push(Entry {
            host: Some(host_id.to_string()),
            ..Entry::any(command_prefix, failure(stderr))
        });
        self
    }

    /// (host id, command) pairs in call order.
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().clone()
    }

    pub fn commands_for(&self, host_id: &str) -> Vec<String> {
        self.calls
            .lock()
            .iter()
            .filter(|(h, _)| h == host_id)
            .map(|(_, c)| c.clone())
            .collect()
    }

    /// Host IDs in the order they were first contacted.
    pub fn host_order(&self) -> Vec<String> {
        let mut order: Vec<String> = Vec::new();
        for (host, _) in self.calls.lock().iter() {
            if !order.contains(host) {
                order.push(host.clone());
            }
        }
        order
    }
}

#[async_trait]
impl CommandExecutor for RecordingExecutor {
    async fn run(
        &self,
        host: &Host,
        command: &str,
        cancel: &CancellationToken,
    ) -> ssh::Result<CommandOutput> {
        if cancel.is_cancelled() {
            return Err(ssh::Error::Cancelled);
        }
        let id = host.id.to_string();
        self.calls.lock().push((id.clone(), command.to_string()));

        let target = format!("root@{}", host.address().unwrap_or("<none>"));
        if self.unreachable.lock().contains(&id) {
            return Err(ssh::Error::CommandFailed {
                target,
                exit_code: Some(255),
                stdout: String::new(),
                stderr: "ssh: connect to host: Connection refused".to_string(),
            });
        }

        let reply = {
            let mut script = self.script.lock();
            let found = script.iter().position(|e| {
                e.host.as_deref().is_none_or(|h| h == id) && command.starts_with(e.prefix.as_str())
            });
            found.map(|i| {
                if script[i].once {
                    script.remove(i).reply
                } else {
                    script[i].reply.clone()
                }
            })
        };

        match reply {
            None => Ok(CommandOutput::default()),
            Some(Reply::Ok(stdout)) => Ok(CommandOutput {
                exit_code: 0,
                stdout,
                stderr: String::new(),
            }),
            Some(Reply::Fail { exit_code, stderr }) => Err(ssh::Error::CommandFailed {
                target,
                exit_code: Some(exit_code),
                stdout: String::new(),
                stderr,
            }),
        }
    }
}

/// Network provider with canned results that records calls.
pub struct ScriptedProvider {
    id: String,
    install_error: Mutex<Option<NetworkError>>,
    join_error: Mutex<Option<NetworkError>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            install_error: Mutex::new(None),
            join_error: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_install(self, err: NetworkError) -> Self {
        *self.install_error.lock() = Some(err);
        self
    }

    pub fn failing_join(self, err: NetworkError) -> Self {
        *self.join_error.lock() = Some(err);
        self
    }

    /// `install:<host>` / `join:<host>:<tags>` entries in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl NetworkProvider for ScriptedProvider {
    fn id(&self) -> &str {
        &self.id
    }

    async fn ensure_installed(
        &self,
        opts: InstallOptions<'_>,
        _cancel: &CancellationToken,
    ) -> Result<(), NetworkError> {
        self.calls.lock().push(format!("install:{}", opts.host.id));
        match self.install_error.lock().take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn ensure_joined(
        &self,
        opts: JoinOptions<'_>,
        _cancel: &CancellationToken,
    ) -> Result<(), NetworkError> {
        self.calls
            .lock()
            .push(format!("join:{}:{}", opts.host.id, opts.tags.join(",")));
        match self.join_error.lock().take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn node_fqdn(
        &self,
        host: &str,
        _config: Option<&serde_yaml::Value>,
    ) -> Result<String, NetworkError> {
        Ok(format!("{host}.mesh.test"))
    }
}

/// Phase functions that record calls and can fail or cancel at a chosen phase.
#[derive(Default)]
pub struct RecordingPhases {
    pub calls: Mutex<Vec<(Phase, String)>>,
    fail_at: Option<Phase>,
    cancel_at: Option<(Phase, CancellationToken)>,
}

impl RecordingPhases {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_at(phase: Phase) -> Self {
        Self {
            fail_at: Some(phase),
            ..Self::default()
        }
    }

    /// Cancel `token` after `phase` completes.
    pub fn cancelling_after(phase: Phase, token: CancellationToken) -> Self {
        Self {
            cancel_at: Some((phase, token)),
            ..Self::default()
        }
    }

    pub fn phases(&self) -> Vec<Phase> {
        self.calls.lock().iter().map(|(p, _)| *p).collect()
    }

    fn record(&self, cx: PhaseContext<'_>) -> Result<(), PhaseError> {
        self.calls.lock().push((cx.phase, cx.release.id.to_string()));
        if self.fail_at == Some(cx.phase) {
            return Err(format!("{} failed", cx.phase).into());
        }
        if let Some((phase, token)) = &self.cancel_at
            && *phase == cx.phase
        {
            token.cancel();
        }
        Ok(())
    }
}

#[async_trait]
impl PhaseFns for RecordingPhases {
    async fn build(&self, cx: PhaseContext<'_>) -> Result<(), PhaseError> {
        self.record(cx)
    }
    async fn push(&self, cx: PhaseContext<'_>) -> Result<(), PhaseError> {
        self.record(cx)
    }
    async fn migrate_pre(&self, cx: PhaseContext<'_>) -> Result<(), PhaseError> {
        self.record(cx)
    }
    async fn rollout(&self, cx: PhaseContext<'_>) -> Result<(), PhaseError> {
        self.record(cx)
    }
    async fn migrate_post(&self, cx: PhaseContext<'_>) -> Result<(), PhaseError> {
        self.record(cx)
    }
    async fn finalize(&self, cx: PhaseContext<'_>) -> Result<(), PhaseError> {
        self.record(cx)
    }
}

// ABOUTME: Bootstrap command implementation.
// ABOUTME: Loads hosts from YAML and runs the bootstrap engine over SSH.

use std::fmt::Write as _;
use std::path::Path;
use std::sync::Arc;

use stagecraft::bootstrap::{
    BootstrapError, Bootstrapper, CommandExecutor, Host, SshExecutor, docker_install_commands, load_hosts,
};
use stagecraft::config::BootstrapConfig;
use stagecraft::diagnostics::Diagnostics;
use stagecraft::error::{Error, Result};
use stagecraft::network::NetworkRegistry;
use stagecraft::output::Output;

use super::{Context, emit_warnings};

pub async fn bootstrap(cx: &Context, hosts_file: &Path, output: &mut Output) -> Result<()> {
    let config = cx.load_config()?;
    let settings = config.bootstrap();
    let mut hosts = load_hosts(hosts_file)?;
    hosts.sort_by(|a, b| a.id.cmp(&b.id));

    let executor: Arc<dyn CommandExecutor> = Arc::new(SshExecutor::from_config(&settings));
    let registry = NetworkRegistry::with_builtin(executor.clone());

    if cx.dry_run {
        if let Some(net) = &settings.network
            && !registry.has(&net.provider)
        {
            return Err(BootstrapError::UnknownNetworkProvider {
                provider: net.provider.clone(),
                available: registry.ids(),
            }
            .into());
        }
        let text = describe(&hosts, &settings);
        output.result("bootstrap_plan", &text, &hosts);
        output.success(&format!("Dry run: {} host(s), no commands run", hosts.len()));
        return Ok(());
    }

    output.start_timer();
    output.progress(&format!("Bootstrapping {} host(s)", hosts.len()));

    let mut diag = Diagnostics::default();
    let result = Bootstrapper::new(executor, &registry)
        .bootstrap(&hosts, &settings, &cx.cancel, &mut diag)
        .await;
    emit_warnings(&diag, output);
    let result = result?;

    let mut text = String::new();
    for host in &result.hosts {
        match &host.error {
            None => {
                let _ = writeln!(text, "  ✓ {}", host.host.id);
            }
            Some(err) => {
                let _ = writeln!(text, "  ✗ {}: {err}", host.host.id);
            }
        }
    }
    output.result("bootstrap", &text, &result);

    if result.has_failures() {
        return Err(Error::PartialBootstrap {
            succeeded: result.success_count(),
            failed: result.failure_count(),
        });
    }

    output.success(&format!("Bootstrapped {} host(s)", result.success_count()));
    Ok(())
}

fn describe(hosts: &[Host], settings: &BootstrapConfig) -> String {
    let mut text = String::new();
    for host in hosts {
        let address = host.address().unwrap_or("<no public ip>");
        let _ = writeln!(text, "{} ({}@{})", host.id, settings.ssh_user(), address);
        let _ = writeln!(text, "  - ssh probe");
        if settings.docker.enabled {
            let _ = writeln!(
                text,
                "  - docker: detect, else {}",
                docker_install_commands(settings.docker.install_method).join(" && ")
            );
        }
        if let Some(net) = &settings.network {
            let _ = writeln!(text, "  - network: {} install and join", net.provider);
        }
    }
    text
}

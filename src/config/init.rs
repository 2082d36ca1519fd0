// ABOUTME: Config scaffolding for new projects.
// ABOUTME: Creates a stagecraft.yml template file.

use std::path::Path;

use crate::error::{Error, Result};

use super::{CONFIG_FILENAME, Config};

pub fn init_config(dir: &Path, project: Option<&str>, force: bool) -> Result<()> {
    let config_path = dir.join(CONFIG_FILENAME);

    if config_path.exists() && !force {
        return Err(Error::AlreadyExists(config_path));
    }

    let name = match project {
        Some(name) => name.to_string(),
        None => dir
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("app")
            .to_string(),
    };

    let yaml = generate_template_yaml(&name);

    // Refuse to write a template that would not load back.
    Config::from_yaml(&yaml)?;

    std::fs::write(&config_path, yaml)?;
    Ok(())
}

fn generate_template_yaml(project: &str) -> String {
    format!(
        r#"project:
  name: {project}

environments:
  staging:
    driver: digitalocean
  prod:
    driver: digitalocean

# databases:
#   main:
#     connection_env: DATABASE_URL
#     migrations:
#       engine: raw
#       path: ./migrations
#       strategy: pre_deploy

# infra:
#   bootstrap:
#     ssh:
#       user: root
#     docker:
#       enabled: true
#       install_method: apt
#     network:
#       provider: tailscale
#       config:
#         auth_key_env: TS_AUTHKEY
#         tailnet_domain: example.ts.net
"#
    )
}

// ABOUTME: Writes the cricheck.yml configuration template.
// ABOUTME: Refuses to overwrite an existing file unless forced.

use super::CONFIG_FILENAME;
use crate::error::{Error, Result};
use std::path::Path;

const TEMPLATE: &str = "\
# cricheck configuration

# Engine socket the `run` command connects to.
socket: /var/run/docker.sock

# Pause image used to realize pod sandboxes.
# sandbox_image: registry.k8s.io/pause:3.10

# Polling discipline for container-exit waits in the stress scenario.
poll_interval: 4s
poll_deadline: 2m

# Override the stress image list (defaults to the built-in public set).
# stress_images:
#   - busybox:1.34
#   - busybox:1.35
";

/// Write a commented configuration template into `dir`.
pub fn init_config(dir: &Path, force: bool) -> Result<()> {
    let path = dir.join(CONFIG_FILENAME);
    if path.exists() && !force {
        return Err(Error::AlreadyExists(path));
    }

    std::fs::write(&path, TEMPLATE)?;
    println!("Created {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn template_parses_as_valid_config() {
        let config = Config::from_yaml(TEMPLATE).unwrap();
        assert_eq!(config.socket.as_deref(), Some("/var/run/docker.sock"));
    }
}

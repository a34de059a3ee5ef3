// ABOUTME: Configuration types and parsing for cricheck.yml.
// ABOUTME: Socket selection, polling discipline, and stress list overrides.

mod init;

pub use init::init_config;

use crate::error::{Error, Result};
use crate::suite::SuiteSettings;
use crate::types::ImageRef;
use nonempty::NonEmpty;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

pub const CONFIG_FILENAME: &str = "cricheck.yml";
pub const CONFIG_FILENAME_ALT: &str = "cricheck.yaml";

/// Default engine socket for the `run` command.
pub const DEFAULT_SOCKET: &str = "/var/run/docker.sock";

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Engine socket to connect to; `--socket` takes precedence.
    #[serde(default)]
    pub socket: Option<String>,

    /// Pause image used to realize pod sandboxes.
    #[serde(default)]
    pub sandbox_image: Option<String>,

    /// Fixed interval between container status polls.
    #[serde(default = "default_poll_interval", with = "humantime_serde")]
    pub poll_interval: Duration,

    /// Hard deadline for a stress container to reach the exited state.
    #[serde(default = "default_poll_deadline", with = "humantime_serde")]
    pub poll_deadline: Duration,

    /// Override for the built-in public stress image list.
    #[serde(default)]
    pub stress_images: Option<NonEmpty<String>>,
}

fn default_poll_interval() -> Duration {
    Duration::from_secs(4)
}

fn default_poll_deadline() -> Duration {
    Duration::from_secs(120)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            socket: None,
            sandbox_image: None,
            poll_interval: default_poll_interval(),
            poll_deadline: default_poll_deadline(),
            stress_images: None,
        }
    }
}

impl Config {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(Error::from)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Find and load a config file in `dir`.
    pub fn discover(dir: &Path) -> Result<Self> {
        let candidates = [dir.join(CONFIG_FILENAME), dir.join(CONFIG_FILENAME_ALT)];
        for candidate in &candidates {
            if candidate.exists() {
                return Self::load(candidate);
            }
        }
        Err(Error::ConfigNotFound(dir.to_path_buf()))
    }

    /// Like [`Config::discover`], but a missing file yields the defaults.
    /// A file that exists but does not parse is still an error.
    pub fn discover_or_default(dir: &Path) -> Result<Self> {
        match Self::discover(dir) {
            Ok(config) => Ok(config),
            Err(Error::ConfigNotFound(_)) => Ok(Self::default()),
            Err(e) => Err(e),
        }
    }

    /// Suite settings derived from this config, with the stress list parsed
    /// and validated.
    pub fn suite_settings(&self) -> Result<SuiteSettings> {
        let stress_images = match &self.stress_images {
            Some(names) => names
                .iter()
                .map(|name| {
                    ImageRef::parse(name)
                        .map_err(|e| Error::InvalidConfig(format!("stress image {name:?}: {e}")))
                })
                .collect::<Result<Vec<_>>>()?,
            None => crate::fixtures::stress_image_list(),
        };

        Ok(SuiteSettings {
            poll_interval: self.poll_interval,
            poll_deadline: self.poll_deadline,
            stress_images,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_yaml_gets_defaults() {
        let config = Config::from_yaml("socket: /run/engine.sock").unwrap();
        assert_eq!(config.socket.as_deref(), Some("/run/engine.sock"));
        assert_eq!(config.poll_interval, Duration::from_secs(4));
        assert_eq!(config.poll_deadline, Duration::from_secs(120));
        assert!(config.stress_images.is_none());
    }

    #[test]
    fn durations_parse_humantime_forms() {
        let config = Config::from_yaml("poll_interval: 500ms\npoll_deadline: 3m").unwrap();
        assert_eq!(config.poll_interval, Duration::from_millis(500));
        assert_eq!(config.poll_deadline, Duration::from_secs(180));
    }

    #[test]
    fn stress_list_override_is_parsed() {
        let config = Config::from_yaml("stress_images:\n  - busybox:1.34\n  - alpine").unwrap();
        let settings = config.suite_settings().unwrap();
        assert_eq!(settings.stress_images.len(), 2);
        assert_eq!(settings.stress_images[0].as_str(), "busybox:1.34");
    }

    #[test]
    fn invalid_stress_reference_is_rejected() {
        let config = Config::from_yaml("stress_images:\n  - 'bad image'").unwrap();
        assert!(matches!(
            config.suite_settings(),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn empty_stress_list_is_rejected_at_parse_time() {
        assert!(Config::from_yaml("stress_images: []").is_err());
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(Config::from_yaml("sockets: /tmp/x").is_err());
    }
}

// ABOUTME: Container image reference parsing for tag, digest, and ID forms.
// ABOUTME: Preserves the raw input and computes the repo tag a backend reports.

use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseImageRefError {
    #[error("image reference cannot be empty")]
    Empty,

    #[error("invalid character in image reference: {0}")]
    InvalidChar(char),

    #[error("invalid image reference format: {0}")]
    InvalidFormat(String),
}

/// A reference to an image as a backend accepts it: `name`, `name:tag`,
/// `name@sha256:...`, or an opaque content ID.
///
/// The raw input string is preserved verbatim. The harness must send a
/// reference exactly as a fixture states it; what the backend is expected to
/// report afterwards (e.g. the `:latest` default for a tagless pull) is
/// computed separately via [`ImageRef::qualified_tag`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageRef {
    raw: String,
    registry: Option<String>,
    name: String,
    tag: Option<String>,
    digest: Option<String>,
}

impl ImageRef {
    pub fn parse(input: &str) -> Result<Self, ParseImageRefError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(ParseImageRefError::Empty);
        }

        for c in input.chars() {
            if !c.is_ascii_alphanumeric()
                && c != '/'
                && c != ':'
                && c != '.'
                && c != '-'
                && c != '_'
                && c != '@'
            {
                return Err(ParseImageRefError::InvalidChar(c));
            }
        }

        // Split off digest if present
        let (without_digest, digest) = match input.split_once('@') {
            Some((before, after)) => (before, Some(after.to_string())),
            None => (input, None),
        };
        if without_digest.is_empty() {
            return Err(ParseImageRefError::InvalidFormat(input.to_string()));
        }

        // Split off tag if present. A colon followed by a slash belongs to a
        // registry port, not a tag.
        let (without_tag, tag) = match without_digest.rsplit_once(':') {
            Some((before, after)) => {
                if after.contains('/') {
                    (without_digest, None)
                } else {
                    (before, Some(after.to_string()))
                }
            }
            None => (without_digest, None),
        };

        let (registry, name) = Self::parse_registry_and_name(without_tag)?;

        Ok(Self {
            raw: input.to_string(),
            registry,
            name,
            tag,
            digest,
        })
    }

    fn parse_registry_and_name(
        input: &str,
    ) -> Result<(Option<String>, String), ParseImageRefError> {
        // A registry is present if the first component contains a dot or
        // colon, or is "localhost"
        let parts: Vec<&str> = input.splitn(2, '/').collect();

        match parts.as_slice() {
            [name] => Ok((None, (*name).to_string())),
            [first, rest] => {
                if first.contains('.') || first.contains(':') || *first == "localhost" {
                    Ok((Some((*first).to_string()), (*rest).to_string()))
                } else {
                    // No registry, the whole thing is the name (e.g. "library/nginx")
                    Ok((None, input.to_string()))
                }
            }
            _ => Err(ParseImageRefError::InvalidFormat(input.to_string())),
        }
    }

    /// The reference exactly as written.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn registry(&self) -> Option<&str> {
        self.registry.as_deref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    pub fn digest(&self) -> Option<&str> {
        self.digest.as_deref()
    }

    /// Whether this reference pins a digest rather than a tag.
    pub fn is_digest(&self) -> bool {
        self.digest.is_some()
    }

    /// The `registry/name` stem without tag or digest.
    pub fn repo(&self) -> String {
        match &self.registry {
            Some(registry) => format!("{}/{}", registry, self.name),
            None => self.name.clone(),
        }
    }

    /// The `name:tag` form a backend reports in `repo_tags` after pulling
    /// this reference, defaulting the tag to `latest` for a tagless pull.
    /// Digest references produce no repo tag.
    pub fn qualified_tag(&self) -> Option<String> {
        if self.digest.is_some() {
            return None;
        }
        Some(format!(
            "{}:{}",
            self.repo(),
            self.tag.as_deref().unwrap_or("latest")
        ))
    }

    /// The `repo@digest` form a backend reports in `repo_digests` for a
    /// digest pull.
    pub fn qualified_digest(&self) -> Option<String> {
        self.digest
            .as_ref()
            .map(|digest| format!("{}@{}", self.repo(), digest))
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_name_without_inventing_a_tag() {
        let r = ImageRef::parse("busybox").unwrap();
        assert_eq!(r.as_str(), "busybox");
        assert_eq!(r.name(), "busybox");
        assert_eq!(r.tag(), None);
        assert_eq!(r.qualified_tag().as_deref(), Some("busybox:latest"));
    }

    #[test]
    fn parses_name_with_tag() {
        let r = ImageRef::parse("nginx:1.27").unwrap();
        assert_eq!(r.tag(), Some("1.27"));
        assert_eq!(r.qualified_tag().as_deref(), Some("nginx:1.27"));
    }

    #[test]
    fn parses_registry_with_port() {
        let r = ImageRef::parse("localhost:5000/busybox:1.36").unwrap();
        assert_eq!(r.registry(), Some("localhost:5000"));
        assert_eq!(r.name(), "busybox");
        assert_eq!(r.tag(), Some("1.36"));
    }

    #[test]
    fn digest_reference_has_no_repo_tag() {
        let r = ImageRef::parse(
            "busybox@sha256:7cc4b5aefd1d0cadf8d97d4350462ba51c694ebca145b08d7d41b41acc8db5aa",
        )
        .unwrap();
        assert!(r.is_digest());
        assert_eq!(r.tag(), None);
        assert_eq!(r.qualified_tag(), None);
        assert_eq!(
            r.qualified_digest().as_deref(),
            Some("busybox@sha256:7cc4b5aefd1d0cadf8d97d4350462ba51c694ebca145b08d7d41b41acc8db5aa"),
        );
    }

    #[test]
    fn display_round_trips_the_raw_input() {
        for input in ["busybox", "busybox:1.36", "docker.io/library/redis:7"] {
            assert_eq!(ImageRef::parse(input).unwrap().to_string(), input);
        }
    }

    #[test]
    fn rejects_empty_and_invalid_input() {
        assert!(matches!(
            ImageRef::parse("   "),
            Err(ParseImageRefError::Empty)
        ));
        assert!(matches!(
            ImageRef::parse("bad image"),
            Err(ParseImageRefError::InvalidChar(' '))
        ));
        assert!(matches!(
            ImageRef::parse("@sha256:abc"),
            Err(ParseImageRefError::InvalidFormat(_))
        ));
    }
}

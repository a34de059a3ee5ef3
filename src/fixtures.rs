// ABOUTME: Fixture image sets used by the conformance scenarios.
// ABOUTME: Includes the public stress list and the fake-backend catalog.

use crate::runtime::{FakeImage, PodSandboxConfig};
use crate::types::ImageRef;

/// Public image names of deliberately varied size and pull latency, pulled
/// concurrently by the stress scenario.
const STRESS_IMAGES: &[&str] = &[
    "wordpress",
    "mongo",
    "ghost",
    "docker",
    "rabbitmq",
    "perl",
    "rocket.chat",
    "elixir",
    "node",
    "opensuse",
    "mariadb",
    "memcached",
    "hylang",
    "haproxy",
    "erlang",
    "maven",
    "drupal",
    "websphere-liberty",
    "open-liberty",
    "adoptopenjdk",
    "ibmjava",
    "gazebo",
    "solr",
    "tomee",
    "pypy",
    "zookeeper",
    "tomcat",
    "sonarqube",
    "rapidoid",
    "nuxeo",
    "orientdb",
    "gradle",
    "jruby",
    "groovy",
    "jetty",
    "lightstreamer",
    "flink",
    "kaazing-gateway",
    "clojure",
    "openjdk",
    "express-gateway",
    "arangodb",
    "ros",
    "xwiki",
    "teamspeak",
    "percona",
    "crate",
    "alt",
    "telegraf",
    "influxdb",
    "kapacitor",
    "chronograf",
    "rust",
    "consul",
    "swipl",
    "photon",
    "amazonlinux",
    "amazoncorretto",
    "logstash:7.1.0",
    "kibana:7.1.0",
    "elasticsearch:7.1.0",
    "python",
    "julia",
    "golang",
    "sourcemage",
    "mageia",
    "haskell",
    "nextcloud",
    "ruby",
    "redis",
    "geonetwork",
    "buildpack-deps",
    "swift",
    "bonita",
    "ubuntu",
    "thrift",
    "silverpeas",
    "php-zendserver",
    "neurodebian",
    "couchbase",
    "storm",
    "clearlinux",
    "yourls",
    "joomla",
    "postfixadmin",
    "matomo",
    "adminer",
    "convertigo",
    "mongo-express",
    "composer",
    "postgres",
    "bash",
    "php",
    "httpd",
    "spiped",
    "nginx",
    "fluentd",
    "alpine",
    "haxe",
    "neo4j",
];

fn parse(reference: &str) -> ImageRef {
    ImageRef::parse(reference).expect("fixture reference is valid")
}

/// Deterministic fake digest built from a single seed byte.
fn sha(seed: u8) -> String {
    format!("sha256:{}", format!("{seed:02x}").repeat(32))
}

/// Tagged image for the basic pull/remove and resolver scenarios.
pub fn image_with_tag() -> ImageRef {
    parse("busybox:1.36")
}

/// Tagless image; pulling it must populate the `:latest` repo tag.
pub fn image_without_tag() -> ImageRef {
    parse("busybox")
}

/// Digest-pinned image; pulling it must leave repo tags empty.
pub fn image_with_digest() -> ImageRef {
    parse(&format!("busybox@{}", sha(0x11)))
}

/// One user-metadata fixture: the image and the UID/username its default
/// user must resolve to. Exactly one of the two is set per fixture.
#[derive(Debug, Clone)]
pub struct UserImageFixture {
    pub description: &'static str,
    pub image: ImageRef,
    pub uid: Option<i64>,
    pub username: &'static str,
}

pub fn user_image_fixtures() -> Vec<UserImageFixture> {
    vec![
        UserImageFixture {
            description: "UID only",
            image: parse("gcr.io/cri-tools/test-image-user-uid"),
            uid: Some(1002),
            username: "",
        },
        UserImageFixture {
            description: "Username only",
            image: parse("gcr.io/cri-tools/test-image-user-username"),
            uid: None,
            username: "www-data",
        },
        UserImageFixture {
            description: "UID:group",
            image: parse("gcr.io/cri-tools/test-image-user-uid-group"),
            uid: Some(1003),
            username: "",
        },
        UserImageFixture {
            description: "Username:group",
            image: parse("gcr.io/cri-tools/test-image-user-username-group"),
            uid: None,
            username: "www-data",
        },
    ]
}

/// Three references to three distinct underlying images.
pub fn distinct_tag_distinct_image_set() -> Vec<ImageRef> {
    vec![parse("busybox:1.34"), parse("busybox:1.35"), parse("busybox:1.36")]
}

/// Three references that all resolve to one underlying image.
pub fn distinct_tag_same_image_set() -> Vec<ImageRef> {
    vec![
        parse("busybox:1.36"),
        parse("busybox:1.36.1"),
        parse("busybox:stable"),
    ]
}

/// The full public stress list.
pub fn stress_image_list() -> Vec<ImageRef> {
    STRESS_IMAGES.iter().map(|name| parse(name)).collect()
}

/// Small deterministic stress list for `selfcheck`, fully covered by the
/// fake catalog.
pub fn selfcheck_stress_list() -> Vec<ImageRef> {
    distinct_tag_distinct_image_set()
}

/// Sandbox configuration the sequential scenarios pull on behalf of.
pub fn suite_sandbox_config() -> PodSandboxConfig {
    PodSandboxConfig::new("cricheck-suite")
}

/// Catalog covering every fixture above, for the fake backend.
pub fn fake_catalog() -> Vec<FakeImage> {
    let busybox_136 = (sha(0x01), sha(0x11), 4_261_550);
    let mut catalog = Vec::new();

    for reference in [
        "busybox:1.36".to_string(),
        "busybox".to_string(),
        format!("busybox@{}", sha(0x11)),
        "busybox:1.36.1".to_string(),
        "busybox:stable".to_string(),
    ] {
        catalog.push(FakeImage {
            reference,
            id: busybox_136.0.clone(),
            digest: busybox_136.1.clone(),
            size: busybox_136.2,
            uid: None,
            username: String::new(),
        });
    }

    catalog.push(FakeImage {
        reference: "busybox:1.34".to_string(),
        id: sha(0x02),
        digest: sha(0x12),
        size: 4_497_821,
        uid: None,
        username: String::new(),
    });
    catalog.push(FakeImage {
        reference: "busybox:1.35".to_string(),
        id: sha(0x03),
        digest: sha(0x13),
        size: 4_374_336,
        uid: None,
        username: String::new(),
    });

    for (index, fixture) in user_image_fixtures().into_iter().enumerate() {
        let seed = 0x04 + index as u8;
        catalog.push(FakeImage {
            reference: fixture.image.to_string(),
            id: sha(seed),
            digest: sha(seed + 0x10),
            size: 1_154_272,
            uid: fixture.uid,
            username: fixture.username.to_string(),
        });
    }

    catalog
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_stress_image_parses() {
        assert_eq!(stress_image_list().len(), STRESS_IMAGES.len());
    }

    #[test]
    fn user_fixtures_set_exactly_one_of_uid_and_username() {
        for fixture in user_image_fixtures() {
            let has_uid = fixture.uid.is_some();
            let has_username = !fixture.username.is_empty();
            assert!(
                has_uid ^ has_username,
                "{}: exactly one of uid/username must be set",
                fixture.description
            );
        }
    }

    #[test]
    fn fake_catalog_covers_the_selfcheck_stress_list() {
        let catalog = fake_catalog();
        for image in selfcheck_stress_list() {
            assert!(
                catalog.iter().any(|entry| entry.reference == image.as_str()),
                "{image} missing from fake catalog"
            );
        }
    }
}

//! Compose document model
//!
//! Typed representation of a docker-compose file. Every entity field is
//! optional so that an absent value can be told apart from an empty one;
//! the merge rules depend on that distinction.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::variant::{
    key_values, scalar_list, scalar_string, DependsOn, External, ServiceNetworks, StringOrList,
    Ulimit,
};

/// A complete compose document
///
/// The five entity collections are keyed by entity name. They are always
/// present (empty when the source omitted them) and are left out of the
/// serialized output when empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "scalar_string")]
    pub version: Option<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub services: BTreeMap<String, Service>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub networks: BTreeMap<String, Network>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub volumes: BTreeMap<String, Volume>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub secrets: BTreeMap<String, Secret>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub configs: BTreeMap<String, Config>,
}

impl Document {
    /// Creates an empty document
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a service, replacing any service of the same name
    pub fn with_service(mut self, name: impl Into<String>, service: Service) -> Self {
        self.services.insert(name.into(), service);
        self
    }
}

/// A service definition
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Service {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build: Option<BuildSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<StringOrList>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entrypoint: Option<StringOrList>,

    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "key_values")]
    pub environment: Option<BTreeMap<String, String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env_file: Option<StringOrList>,

    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "scalar_list")]
    pub ports: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "scalar_list")]
    pub expose: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volumes: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volumes_from: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub networks: Option<ServiceNetworks>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depends_on: Option<DependsOn>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_links: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restart: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domainname: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mac_address: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub privileged: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_only: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stdin_open: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tty: Option<bool>,

    /// Relative CPU weight
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu_shares: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "scalar_string")]
    pub cpus: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpuset: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "scalar_string")]
    pub mem_limit: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "scalar_string")]
    pub memswap_limit: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "scalar_string")]
    pub shm_size: Option<String>,

    #[serde(default, rename = "pid", skip_serializing_if = "Option::is_none")]
    pub pid_mode: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipc: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security_opt: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_signal: Option<String>,

    /// Compose duration string, e.g. `"30s"`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_grace_period: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ulimits: Option<BTreeMap<String, Ulimit>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub devices: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "key_values")]
    pub labels: Option<BTreeMap<String, String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_driver: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "key_values")]
    pub log_opt: Option<BTreeMap<String, String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra_hosts: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dns: Option<StringOrList>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dns_search: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dns_opt: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tmpfs: Option<StringOrList>,

    /// Names of top-level secrets granted to this service
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secrets: Option<Vec<String>>,

    /// Names of top-level configs granted to this service
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub configs: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deploy: Option<DeploySpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub healthcheck: Option<HealthCheckSpec>,
}

impl Service {
    /// Creates a service running the given image
    pub fn from_image(image: impl Into<String>) -> Self {
        Self {
            image: Some(image.into()),
            ..Self::default()
        }
    }
}

/// Build instructions for a service
///
/// Decodes from either the mapping form or the `build: ./path` shorthand;
/// always serializes as a mapping.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawBuild")]
pub struct BuildSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub dockerfile: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub args: Option<BTreeMap<String, String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<BTreeMap<String, String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_from: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub shm_size: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub secrets: Option<Vec<String>>,
}

impl BuildSpec {
    /// Creates a build spec using the given dockerfile
    pub fn with_dockerfile(dockerfile: impl Into<String>) -> Self {
        Self {
            dockerfile: Some(dockerfile.into()),
            ..Self::default()
        }
    }
}

/// Mapping form of [`BuildSpec`], used only while decoding
#[derive(Deserialize)]
struct BuildMapping {
    #[serde(default)]
    context: Option<String>,

    #[serde(default)]
    dockerfile: Option<String>,

    #[serde(default, deserialize_with = "key_values")]
    args: Option<BTreeMap<String, String>>,

    #[serde(default)]
    target: Option<String>,

    #[serde(default, deserialize_with = "key_values")]
    labels: Option<BTreeMap<String, String>>,

    #[serde(default)]
    cache_from: Option<Vec<String>>,

    #[serde(default)]
    network: Option<String>,

    #[serde(default, deserialize_with = "scalar_string")]
    shm_size: Option<String>,

    #[serde(default)]
    secrets: Option<Vec<String>>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawBuild {
    Context(String),
    Mapping(BuildMapping),
}

impl From<RawBuild> for BuildSpec {
    fn from(raw: RawBuild) -> Self {
        match raw {
            RawBuild::Context(context) => BuildSpec {
                context: Some(context),
                ..BuildSpec::default()
            },
            RawBuild::Mapping(m) => BuildSpec {
                context: m.context,
                dockerfile: m.dockerfile,
                args: m.args,
                target: m.target,
                labels: m.labels,
                cache_from: m.cache_from,
                network: m.network,
                shm_size: m.shm_size,
                secrets: m.secrets,
            },
        }
    }
}

/// Swarm deployment settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeploySpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replicas: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "key_values")]
    pub labels: Option<BTreeMap<String, String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_config: Option<UpdateSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<ResourcesSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restart_policy: Option<RestartPolicySpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placement: Option<PlacementSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint_mode: Option<String>,
}

/// Rolling update settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parallelism: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_action: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monitor: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_failure_ratio: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<String>,
}

/// Resource limits and reservations
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourcesSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limits: Option<ResourceLimit>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reservations: Option<ResourceLimit>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceLimit {
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "scalar_string")]
    pub cpus: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "scalar_string")]
    pub memory: Option<String>,

    /// Device requests; kept verbatim
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub devices: Option<Vec<serde_yaml::Value>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RestartPolicySpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_attempts: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlacementSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraints: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferences: Option<Vec<BTreeMap<String, String>>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_replicas_per_node: Option<u32>,
}

/// Container health check
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HealthCheckSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test: Option<StringOrList>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retries: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_period: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disable: Option<bool>,
}

/// A top-level network
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Network {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driver: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "key_values")]
    pub driver_opts: Option<BTreeMap<String, String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipam: Option<IpamSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external: Option<External>,

    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "key_values")]
    pub labels: Option<BTreeMap<String, String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_ipv6: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachable: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub internal: Option<bool>,

    /// Name the orchestrator uses, independent of the map key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// IP address management for a network
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IpamSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driver: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<Vec<BTreeMap<String, serde_yaml::Value>>>,

    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "key_values")]
    pub options: Option<BTreeMap<String, String>>,
}

/// A top-level named volume
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Volume {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driver: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "key_values")]
    pub driver_opts: Option<BTreeMap<String, String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external: Option<External>,

    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "key_values")]
    pub labels: Option<BTreeMap<String, String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// A top-level secret
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Secret {
    /// Path of the file backing the secret
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external: Option<External>,

    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "key_values")]
    pub labels: Option<BTreeMap<String, String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Secret {
    /// Creates a secret backed by a file
    pub fn from_file(file: impl Into<String>) -> Self {
        Self {
            file: Some(file.into()),
            ..Self::default()
        }
    }
}

/// A top-level config
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external: Option<External>,

    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "key_values")]
    pub labels: Option<BTreeMap<String, String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

//! Domain models for compose-merge
//!
//! The compose document model and the merge engine, without any I/O
//! concerns.

mod combine;
mod compose;
mod merge;
mod variant;


pub use combine::{
    combine, ConflictResolver, Entity, EntityKind, MergeError, MergeOptions, Precedence,
    PreferIncoming,
};
pub use compose::{
    BuildSpec, Config, DeploySpec, Document, HealthCheckSpec, IpamSpec, Network, PlacementSpec,
    ResourceLimit, ResourcesSpec, RestartPolicySpec, Secret, Service, UpdateSpec, Volume,
};
pub use merge::{merge_secrets, merge_services, relative, SecretStaging, DEFAULT_CONFIG_FOLDER};
pub use variant::{
    DependsOn, DependsOnCondition, External, NetworkAttachment, ServiceNetworks, StringOrList,
    Ulimit,
};

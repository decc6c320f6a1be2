//! Whole-document merge
//!
//! [`combine`] produces a new document from two inputs. Services may be
//! deep-merged; networks, volumes and configs are only ever kept or
//! replaced as a whole; secrets are unioned by [`merge_secrets`].

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;
use tracing::{debug, info};

use super::compose::{Config, Document, Network, Service, Volume};
use super::merge::{merge_secrets, merge_services, SecretStaging};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MergeError {
    #[error("no documents supplied")]
    NoDocuments,
}

/// Kinds of entity that go through conflict resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Service,
    Network,
    Volume,
    Config,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Service => write!(f, "service"),
            EntityKind::Network => write!(f, "network"),
            EntityKind::Volume => write!(f, "volume"),
            EntityKind::Config => write!(f, "config"),
        }
    }
}

/// Borrowed view of one side of a conflict
#[derive(Debug, Clone, Copy)]
pub enum Entity<'a> {
    Service(&'a Service),
    Network(&'a Network),
    Volume(&'a Volume),
    Config(&'a Config),
}

impl Entity<'_> {
    pub fn kind(&self) -> EntityKind {
        match self {
            Entity::Service(_) => EntityKind::Service,
            Entity::Network(_) => EntityKind::Network,
            Entity::Volume(_) => EntityKind::Volume,
            Entity::Config(_) => EntityKind::Config,
        }
    }
}

/// Decides same-name conflicts between two documents
pub trait ConflictResolver {
    /// Returns true if `incoming` should win over `existing`
    fn resolve(
        &self,
        kind: EntityKind,
        name: &str,
        existing: Entity<'_>,
        incoming: Entity<'_>,
    ) -> bool;
}

/// Always prefers the incoming (later) entity
#[derive(Debug, Clone, Copy, Default)]
pub struct PreferIncoming;

impl ConflictResolver for PreferIncoming {
    fn resolve(
        &self,
        kind: EntityKind,
        name: &str,
        _existing: Entity<'_>,
        _incoming: Entity<'_>,
    ) -> bool {
        info!(%kind, name, "conflict detected, preferring the later definition");
        true
    }
}

/// Which document's version string takes precedence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Precedence {
    First,
    #[default]
    Second,
}

/// Controls how [`combine`] treats overlapping entities
pub struct MergeOptions {
    /// Deep-merge same-name services instead of replacing them
    pub merge_services: bool,

    /// Whose version wins, and the fallback when no resolver is set
    pub precedence: Precedence,

    /// Conflict handler; `None` falls back to `precedence`
    pub resolver: Option<Box<dyn ConflictResolver>>,

    /// Where secret files are relocated to
    pub staging: SecretStaging,
}

impl MergeOptions {
    /// Pipeline defaults: merge services, later document wins, log conflicts
    pub fn new(staging: SecretStaging) -> Self {
        Self {
            merge_services: true,
            precedence: Precedence::Second,
            resolver: Some(Box::new(PreferIncoming)),
            staging,
        }
    }

    pub fn with_resolver(mut self, resolver: impl ConflictResolver + 'static) -> Self {
        self.resolver = Some(Box::new(resolver));
        self
    }

    pub fn without_resolver(mut self) -> Self {
        self.resolver = None;
        self
    }

    pub fn with_precedence(mut self, precedence: Precedence) -> Self {
        self.precedence = precedence;
        self
    }

    pub fn replace_services(mut self) -> Self {
        self.merge_services = false;
        self
    }

    fn incoming_wins(&self, name: &str, existing: Entity<'_>, incoming: Entity<'_>) -> bool {
        match &self.resolver {
            Some(resolver) => resolver.resolve(existing.kind(), name, existing, incoming),
            None => self.precedence == Precedence::Second,
        }
    }
}

impl fmt::Debug for MergeOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MergeOptions")
            .field("merge_services", &self.merge_services)
            .field("precedence", &self.precedence)
            .field("resolver", &self.resolver.as_ref().map(|_| "<resolver>"))
            .field("staging", &self.staging)
            .finish()
    }
}

/// Combines two documents into a new one
///
/// When only one side is present it is returned as is (borrowed, nothing
/// is rebuilt). When both are present the result is a fresh document and
/// neither input is touched.
///
/// # Errors
///
/// [`MergeError::NoDocuments`] when both sides are absent.
pub fn combine<'a>(
    a: Option<&'a Document>,
    b: Option<&'a Document>,
    options: &MergeOptions,
) -> Result<Cow<'a, Document>, MergeError> {
    let (a, b) = match (a, b) {
        (None, None) => return Err(MergeError::NoDocuments),
        (Some(a), None) => return Ok(Cow::Borrowed(a)),
        (None, Some(b)) => return Ok(Cow::Borrowed(b)),
        (Some(a), Some(b)) => (a, b),
    };

    let mut result = Document::new();

    result.version = match options.precedence {
        Precedence::First => pick_version(&a.version, &b.version),
        Precedence::Second => pick_version(&b.version, &a.version),
    };

    result.services = a.services.clone();
    for (name, service) in &b.services {
        match result.services.get(name) {
            None => {
                result.services.insert(name.clone(), service.clone());
            }
            Some(existing) => {
                let (old, new) = (Entity::Service(existing), Entity::Service(service));
                if !options.incoming_wins(name, old, new) {
                    debug!(service = %name, "keeping existing service");
                    continue;
                }
                let replacement = if options.merge_services {
                    merge_services(existing, service)
                } else {
                    service.clone()
                };
                result.services.insert(name.clone(), replacement);
            }
        }
    }

    result.networks = overlay(&a.networks, &b.networks, options, |n| Entity::Network(n));
    result.volumes = overlay(&a.volumes, &b.volumes, options, |v| Entity::Volume(v));
    result.secrets = merge_secrets(&a.secrets, &b.secrets, &options.staging);
    result.configs = overlay(&a.configs, &b.configs, options, |c| Entity::Config(c));

    Ok(Cow::Owned(result))
}

fn pick_version(preferred: &Option<String>, fallback: &Option<String>) -> Option<String> {
    match preferred.as_deref() {
        Some(v) if !v.is_empty() => Some(v.to_string()),
        _ => fallback.clone(),
    }
}

/// Copies `a`, then lays `b` over it entry by entry without field merging
fn overlay<T: Clone>(
    a: &BTreeMap<String, T>,
    b: &BTreeMap<String, T>,
    options: &MergeOptions,
    view: for<'e> fn(&'e T) -> Entity<'e>,
) -> BTreeMap<String, T> {
    let mut result = a.clone();

    for (name, incoming) in b {
        let replace = match result.get(name) {
            None => true,
            Some(existing) => options.incoming_wins(name, view(existing), view(incoming)),
        };
        if replace {
            result.insert(name.clone(), incoming.clone());
        }
    }

    result
}

//! Entity-level merge rules
//!
//! Services are combined field by field, with the second (override)
//! service taking precedence wherever it actually says something. Secrets
//! are unioned and their backing files relocated into a single staging
//! directory next to the generated compose file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::compose::{Secret, Service};

/// Folder name used for relocated secret files when none is configured
pub const DEFAULT_CONFIG_FOLDER: &str = "config";

/// Merges two services, with `b` taking precedence for conflicting fields
///
/// Starts from a copy of `a` and overlays `b`:
///
/// * Scalars (`image`, `container_name`, `restart`, `user`, `working_dir`)
///   are replaced only when `b` has a non-empty value.
/// * `build`, `command` and `entrypoint` are replaced wholesale when `b`
///   sets them at all.
/// * `environment` and `labels` are unioned key by key.
/// * `ports` and `volumes` are concatenated, duplicates included.
/// * `depends_on` always takes `b`'s value, even when `b` has none.
///
/// Every other field keeps `a`'s value.
pub fn merge_services(a: &Service, b: &Service) -> Service {
    let mut merged = a.clone();

    overlay_scalar(&mut merged.image, &b.image);
    overlay_scalar(&mut merged.container_name, &b.container_name);
    overlay_scalar(&mut merged.restart, &b.restart);
    overlay_scalar(&mut merged.user, &b.user);
    overlay_scalar(&mut merged.working_dir, &b.working_dir);

    if b.build.is_some() {
        merged.build = b.build.clone();
    }
    if b.command.is_some() {
        merged.command = b.command.clone();
    }
    if b.entrypoint.is_some() {
        merged.entrypoint = b.entrypoint.clone();
    }

    union_map(&mut merged.environment, &b.environment);
    union_map(&mut merged.labels, &b.labels);

    append_list(&mut merged.ports, &b.ports);
    append_list(&mut merged.volumes, &b.volumes);

    // Partial dependency lists don't compose, so the override owns them.
    merged.depends_on = b.depends_on.clone();

    merged
}

fn overlay_scalar(target: &mut Option<String>, incoming: &Option<String>) {
    if let Some(value) = incoming {
        if !value.is_empty() {
            *target = Some(value.clone());
        }
    }
}

fn union_map(
    target: &mut Option<BTreeMap<String, String>>,
    incoming: &Option<BTreeMap<String, String>>,
) {
    if let Some(entries) = incoming {
        if entries.is_empty() {
            return;
        }
        let map = target.get_or_insert_with(BTreeMap::new);
        for (key, value) in entries {
            map.insert(key.clone(), value.clone());
        }
    }
}

fn append_list(target: &mut Option<Vec<String>>, incoming: &Option<Vec<String>>) {
    if let Some(items) = incoming {
        if items.is_empty() {
            return;
        }
        target.get_or_insert_with(Vec::new).extend(items.iter().cloned());
    }
}

/// Where relocated secret files live: `<project_root>/<output>/<config_folder>/`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretStaging {
    pub project_root: PathBuf,
    pub output: String,
    pub config_folder: String,
}

impl SecretStaging {
    pub fn new(
        project_root: impl Into<PathBuf>,
        output: impl Into<String>,
        config_folder: impl Into<String>,
    ) -> Self {
        Self {
            project_root: project_root.into(),
            output: output.into(),
            config_folder: config_folder.into(),
        }
    }

    /// The staging directory itself
    pub fn dir(&self) -> PathBuf {
        let folder = if self.config_folder.is_empty() {
            DEFAULT_CONFIG_FOLDER
        } else {
            self.config_folder.as_str()
        };
        self.project_root
            .join(relative(&self.output))
            .join(relative(folder))
    }

    /// Maps a secret's file path into the staging directory
    ///
    /// Only the file name survives; leading directories are dropped.
    /// Returns `None` for paths without a file name (e.g. `/` or `..`).
    pub fn relocate(&self, file: &str) -> Option<String> {
        let name = Path::new(file).file_name()?;
        Some(self.dir().join(name).display().to_string())
    }

    fn rewrite(&self, name: &str, secret: &Secret) -> Secret {
        let mut rewritten = Secret {
            file: secret.file.clone(),
            external: secret.external.clone(),
            labels: secret.labels.clone(),
            name: secret.name.clone(),
        };

        if let Some(file) = secret.file.as_deref().filter(|f| !f.is_empty()) {
            match self.relocate(file) {
                Some(staged) => {
                    debug!(secret = name, from = file, to = %staged, "relocating secret file");
                    rewritten.file = Some(staged);
                }
                None => warn!(secret = name, file, "secret file has no file name, leaving as is"),
            }
        }

        rewritten
    }
}

/// A settings path component as a path relative to the project root
///
/// Leading separators are stripped so `"/build"` still lands under the root
/// instead of replacing it on join.
pub fn relative(component: &str) -> &Path {
    Path::new(component.trim_start_matches('/'))
}

/// Unions two secret collections, relocating every backing file
///
/// There is no conflict resolution: entries from `b` are inserted after
/// those from `a`, so a secret present in both ends up as `b`'s version.
/// Secrets without a file (purely external ones) keep an empty file.
pub fn merge_secrets(
    a: &BTreeMap<String, Secret>,
    b: &BTreeMap<String, Secret>,
    staging: &SecretStaging,
) -> BTreeMap<String, Secret> {
    let mut merged = BTreeMap::new();

    for (name, secret) in a.iter().chain(b.iter()) {
        merged.insert(name.clone(), staging.rewrite(name, secret));
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BuildSpec, DependsOn, External, StringOrList};

    fn env(pairs: &[(&str, &str)]) -> Option<BTreeMap<String, String>> {
        Some(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    fn list(items: &[&str]) -> Option<Vec<String>> {
        Some(items.iter().map(|s| s.to_string()).collect())
    }

    fn staging() -> SecretStaging {
        SecretStaging::new("/app", "build", "config")
    }

    #[test]
    fn scalars_overwritten_only_when_non_empty() {
        let a = Service {
            image: Some("nginx".to_string()),
            user: Some("root".to_string()),
            restart: Some("always".to_string()),
            ..Service::default()
        };
        let b = Service {
            image: Some("nginx:alpine".to_string()),
            user: Some(String::new()),
            restart: None,
            working_dir: Some("/srv".to_string()),
            ..Service::default()
        };

        let merged = merge_services(&a, &b);

        assert_eq!(merged.image.as_deref(), Some("nginx:alpine"));
        assert_eq!(merged.user.as_deref(), Some("root"));
        assert_eq!(merged.restart.as_deref(), Some("always"));
        assert_eq!(merged.working_dir.as_deref(), Some("/srv"));
    }

    #[test]
    fn environment_is_unioned() {
        let a = Service {
            environment: env(&[("X", "1"), ("Y", "2")]),
            ..Service::default()
        };
        let b = Service {
            environment: env(&[("Y", "3"), ("Z", "4")]),
            ..Service::default()
        };

        let merged = merge_services(&a, &b);

        assert_eq!(merged.environment, env(&[("X", "1"), ("Y", "3"), ("Z", "4")]));
    }

    #[test]
    fn labels_added_when_first_has_none() {
        let a = Service::default();
        let b = Service {
            labels: env(&[("team", "core")]),
            ..Service::default()
        };

        assert_eq!(merge_services(&a, &b).labels, env(&[("team", "core")]));
    }

    #[test]
    fn ports_and_volumes_concatenate_without_dedup() {
        let a = Service {
            ports: list(&["80:80"]),
            volumes: list(&["data:/data"]),
            ..Service::default()
        };
        let b = Service {
            ports: list(&["80:80"]),
            volumes: list(&["logs:/logs"]),
            ..Service::default()
        };

        let merged = merge_services(&a, &b);

        assert_eq!(merged.ports, list(&["80:80", "80:80"]));
        assert_eq!(merged.volumes, list(&["data:/data", "logs:/logs"]));
    }

    #[test]
    fn depends_on_is_replaced() {
        let a = Service {
            depends_on: Some(DependsOn::from(vec!["db"])),
            ..Service::default()
        };
        let b = Service {
            depends_on: Some(DependsOn::from(vec!["cache"])),
            ..Service::default()
        };

        let merged = merge_services(&a, &b);
        assert_eq!(merged.depends_on, Some(DependsOn::from(vec!["cache"])));

        let merged = merge_services(&a, &Service::default());
        assert_eq!(merged.depends_on, None);
    }

    #[test]
    fn build_and_command_replaced_wholesale() {
        let a = Service {
            build: Some(BuildSpec {
                context: Some("./a".to_string()),
                target: Some("dev".to_string()),
                ..BuildSpec::default()
            }),
            command: Some(StringOrList::from(vec!["run", "a"])),
            ..Service::default()
        };
        let b = Service {
            build: Some(BuildSpec::with_dockerfile("Dockerfile.prod")),
            command: Some(StringOrList::from("serve")),
            ..Service::default()
        };

        let merged = merge_services(&a, &b);

        let build = merged.build.unwrap();
        assert_eq!(build.dockerfile.as_deref(), Some("Dockerfile.prod"));
        assert!(build.context.is_none());
        assert!(build.target.is_none());
        assert_eq!(merged.command, Some(StringOrList::from("serve")));
    }

    #[test]
    fn merging_with_itself_keeps_non_list_fields() {
        let a = Service {
            image: Some("app".to_string()),
            container_name: Some("app-1".to_string()),
            command: Some(StringOrList::from("serve")),
            entrypoint: Some(StringOrList::from(vec!["/bin/sh", "-c"])),
            environment: env(&[("A", "1")]),
            labels: env(&[("l", "v")]),
            restart: Some("always".to_string()),
            user: Some("app".to_string()),
            working_dir: Some("/srv".to_string()),
            depends_on: Some(DependsOn::from(vec!["db"])),
            build: Some(BuildSpec::with_dockerfile("Dockerfile")),
            ..Service::default()
        };

        assert_eq!(merge_services(&a, &a), a);
    }

    #[test]
    fn untouched_fields_come_from_first() {
        let a = Service {
            hostname: Some("web".to_string()),
            privileged: Some(true),
            ..Service::default()
        };
        let b = Service {
            hostname: Some("other".to_string()),
            ..Service::default()
        };

        let merged = merge_services(&a, &b);
        assert_eq!(merged.hostname.as_deref(), Some("web"));
        assert_eq!(merged.privileged, Some(true));
    }

    #[test]
    fn secret_file_relocated() {
        let a = BTreeMap::from([("creds".to_string(), Secret::from_file("/secrets/creds.pem"))]);

        let merged = merge_secrets(&a, &BTreeMap::new(), &staging());

        assert_eq!(
            merged["creds"].file.as_deref(),
            Some("/app/build/config/creds.pem")
        );
    }

    #[test]
    fn secret_metadata_preserved() {
        let secret = Secret {
            file: Some("./token".to_string()),
            external: Some(External::Flag(false)),
            labels: env(&[("scope", "api")]),
            name: Some("api_token".to_string()),
        };
        let b = BTreeMap::from([("token".to_string(), secret)]);

        let merged = merge_secrets(&BTreeMap::new(), &b, &staging());
        let token = &merged["token"];

        assert_eq!(token.file.as_deref(), Some("/app/build/config/token"));
        assert_eq!(token.external, Some(External::Flag(false)));
        assert_eq!(token.labels, env(&[("scope", "api")]));
        assert_eq!(token.name.as_deref(), Some("api_token"));
    }

    #[test]
    fn external_secret_without_file_untouched() {
        let external = Secret {
            external: Some(External::Flag(true)),
            ..Secret::default()
        };
        let empty = Secret::from_file("");
        let a = BTreeMap::from([
            ("ext".to_string(), external.clone()),
            ("empty".to_string(), empty.clone()),
        ]);

        let merged = merge_secrets(&a, &BTreeMap::new(), &staging());

        assert_eq!(merged["ext"], external);
        assert_eq!(merged["empty"], empty);
    }

    #[test]
    fn second_secret_wins_on_name_collision() {
        let a = BTreeMap::from([("key".to_string(), Secret::from_file("a/key.pem"))]);
        let b = BTreeMap::from([(
            "key".to_string(),
            Secret {
                file: Some("b/other.pem".to_string()),
                name: Some("from-b".to_string()),
                ..Secret::default()
            },
        )]);

        let merged = merge_secrets(&a, &b, &staging());

        assert_eq!(merged.len(), 1);
        assert_eq!(merged["key"].name.as_deref(), Some("from-b"));
        assert_eq!(
            merged["key"].file.as_deref(),
            Some("/app/build/config/other.pem")
        );
    }

    #[test]
    fn empty_config_folder_falls_back_to_default() {
        let staging = SecretStaging::new("/app", "out", "");
        assert_eq!(
            staging.relocate("x/y.txt").as_deref(),
            Some("/app/out/config/y.txt")
        );
    }

    #[test]
    fn custom_config_folder() {
        let staging = SecretStaging::new("/app", "out", "creds");
        assert_eq!(
            staging.relocate("y.txt").as_deref(),
            Some("/app/out/creds/y.txt")
        );
    }

    #[test]
    fn absolute_components_stay_under_root() {
        let staging = SecretStaging::new("/app", "/build", "/secrets");
        assert_eq!(staging.dir(), PathBuf::from("/app/build/secrets"));
        assert_eq!(
            staging.relocate("./creds.pem").as_deref(),
            Some("/app/build/secrets/creds.pem")
        );
    }
}

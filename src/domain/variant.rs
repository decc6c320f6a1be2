//! Two-shape field types
//!
//! Compose files allow several fields to be written in one of two shapes
//! (a string or a list, a flag or an options map). Each is decoded into a
//! tagged union that accepts exactly those two shapes; anything else is a
//! decode error.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

/// A single string or a list of strings (`command`, `entrypoint`, `dns`, ...)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StringOrList {
    Single(String),
    List(Vec<String>),
}

impl From<&str> for StringOrList {
    fn from(s: &str) -> Self {
        StringOrList::Single(s.to_string())
    }
}

impl From<Vec<&str>> for StringOrList {
    fn from(items: Vec<&str>) -> Self {
        StringOrList::List(items.into_iter().map(String::from).collect())
    }
}

/// The `external` field of networks, volumes, secrets and configs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum External {
    Flag(bool),
    Options(BTreeMap<String, String>),
}

/// Long-form `depends_on` entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependsOnCondition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
}

/// A service's `depends_on`: plain names or names mapped to a condition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DependsOn {
    List(Vec<String>),
    Conditions(BTreeMap<String, DependsOnCondition>),
}

impl From<Vec<&str>> for DependsOn {
    fn from(names: Vec<&str>) -> Self {
        DependsOn::List(names.into_iter().map(String::from).collect())
    }
}

/// Per-network settings for a service attachment
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkAttachment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aliases: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipv4_address: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipv6_address: Option<String>,
}

/// A service's `networks`: plain names or names mapped to attachment settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ServiceNetworks {
    List(Vec<String>),
    Attachments(BTreeMap<String, Option<NetworkAttachment>>),
}

/// A `ulimits` entry: one value for both limits, or soft/hard separately
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Ulimit {
    Single(i64),
    Range { soft: i64, hard: i64 },
}

/// A scalar that compose files commonly write unquoted
#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl Scalar {
    fn into_string(self) -> String {
        match self {
            Scalar::Str(s) => s,
            Scalar::Int(i) => i.to_string(),
            Scalar::Float(f) => f.to_string(),
            Scalar::Bool(b) => b.to_string(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawKeyValues {
    Map(BTreeMap<String, Option<Scalar>>),
    List(Vec<String>),
}

/// Decodes `environment`/`labels`/`args` style fields.
///
/// Accepts either a mapping (scalar values are stringified, `null` becomes
/// an empty string) or a list of `KEY=VALUE` entries.
pub fn key_values<'de, D>(deserializer: D) -> Result<Option<BTreeMap<String, String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawKeyValues>::deserialize(deserializer)?;

    Ok(raw.map(|raw| match raw {
        RawKeyValues::Map(map) => map
            .into_iter()
            .map(|(k, v)| (k, v.map(Scalar::into_string).unwrap_or_default()))
            .collect(),
        RawKeyValues::List(entries) => entries
            .into_iter()
            .map(|entry| match entry.split_once('=') {
                Some((k, v)) => (k.to_string(), v.to_string()),
                None => (entry, String::new()),
            })
            .collect(),
    }))
}

/// Decodes a string field that may be written as a bare number (`cpus: 0.5`)
pub fn scalar_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Scalar>::deserialize(deserializer)?.map(Scalar::into_string))
}

/// Decodes a list of strings whose items may be bare numbers (`- 8080`)
pub fn scalar_list<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<Scalar>>::deserialize(deserializer)?
        .map(|items| items.into_iter().map(Scalar::into_string).collect()))
}

//! Per-instance check configuration.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Deserializer};

/// Default status tool invocation when `base_command` is not set.
pub const DEFAULT_BASE_COMMAND: &str = "fdbcli";

/// Connection and tagging settings for one monitored cluster.
///
/// All fields are optional; an empty config runs plain `fdbcli` against the
/// default cluster file.
#[derive(Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct InstanceConfig {
    /// Replacement for the `fdbcli` program and any leading arguments.
    #[serde(deserialize_with = "optional_list")]
    pub base_command: Option<Vec<String>>,

    /// Passed as `-C <path>`.
    pub cluster_file: Option<PathBuf>,

    pub tls_certificate_file: Option<PathBuf>,
    pub tls_key_file: Option<PathBuf>,
    pub tls_verify_peers: Option<String>,
    pub tls_password: Option<String>,
    pub tls_ca_file: Option<PathBuf>,

    /// Extra tags attached to every metric and service check.
    #[serde(deserialize_with = "list")]
    pub tags: Vec<String>,
}

impl InstanceConfig {
    /// The configured base command, or `["fdbcli"]`.
    pub fn base_command(&self) -> Vec<String> {
        self.base_command
            .clone()
            .unwrap_or_else(|| vec![DEFAULT_BASE_COMMAND.to_string()])
    }

    /// TLS options in the order they are passed to the status tool, as
    /// `(flag name, value)` pairs. Unset options are skipped.
    pub fn tls_options(&self) -> Vec<(&'static str, String)> {
        let path = |p: &Option<PathBuf>| p.as_ref().map(|p| p.display().to_string());
        [
            ("tls_certificate_file", path(&self.tls_certificate_file)),
            ("tls_key_file", path(&self.tls_key_file)),
            ("tls_verify_peers", self.tls_verify_peers.clone()),
            ("tls_password", self.tls_password.clone()),
            ("tls_ca_file", path(&self.tls_ca_file)),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.map(|v| (key, v)))
        .collect()
    }
}

/// A list given either as a sequence or as one comma separated string, the
/// form environment variables take.
#[derive(Deserialize)]
#[serde(untagged)]
enum ListOrJoined {
    List(Vec<String>),
    Joined(String),
}

impl From<ListOrJoined> for Vec<String> {
    fn from(value: ListOrJoined) -> Self {
        match value {
            ListOrJoined::List(items) => items,
            ListOrJoined::Joined(joined) => joined
                .split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }
}

fn list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    ListOrJoined::deserialize(deserializer).map(Into::into)
}

fn optional_list<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<ListOrJoined>::deserialize(deserializer)?.map(Into::into))
}

impl fmt::Debug for InstanceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstanceConfig")
            .field("base_command", &self.base_command)
            .field("cluster_file", &self.cluster_file)
            .field("tls_certificate_file", &self.tls_certificate_file)
            .field("tls_key_file", &self.tls_key_file)
            .field("tls_verify_peers", &self.tls_verify_peers)
            .field("tls_password", &self.tls_password.as_ref().map(|_| "<redacted>"))
            .field("tls_ca_file", &self.tls_ca_file)
            .field("tags", &self.tags)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = InstanceConfig::default();
        assert_eq!(config.base_command(), vec!["fdbcli".to_string()]);
        assert!(config.tls_options().is_empty());
        assert!(config.tags.is_empty());
    }

    #[test]
    fn test_tls_options_order() {
        let config = InstanceConfig {
            tls_ca_file: Some(PathBuf::from("/etc/fdb/ca.pem")),
            tls_password: Some("hunter2".to_string()),
            tls_certificate_file: Some(PathBuf::from("/etc/fdb/cert.pem")),
            ..Default::default()
        };

        let keys: Vec<_> = config.tls_options().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, ["tls_certificate_file", "tls_password", "tls_ca_file"]);
    }

    #[test]
    fn test_deserialize_partial() {
        let config: InstanceConfig = serde_json::from_str(
            r#"{"cluster_file": "/etc/foundationdb/fdb.cluster", "tags": ["env:prod"]}"#,
        )
        .unwrap();
        assert_eq!(
            config.cluster_file,
            Some(PathBuf::from("/etc/foundationdb/fdb.cluster"))
        );
        assert_eq!(config.tags, vec!["env:prod".to_string()]);
        assert!(config.base_command.is_none());
    }

    #[test]
    fn test_lists_accept_joined_strings() {
        let config: InstanceConfig = serde_json::from_str(
            r#"{"tags": "env:prod, team:storage,", "base_command": "/opt/fdb/fdbcli"}"#,
        )
        .unwrap();
        assert_eq!(config.tags, ["env:prod", "team:storage"]);
        assert_eq!(config.base_command(), ["/opt/fdb/fdbcli"]);

        let config: InstanceConfig =
            serde_json::from_str(r#"{"tags": ["a,b"], "base_command": ["sudo", "fdbcli"]}"#)
                .unwrap();
        assert_eq!(config.tags, ["a,b"]);
        assert_eq!(config.base_command(), ["sudo", "fdbcli"]);
    }

    #[test]
    fn test_debug_redacts_password() {
        let config = InstanceConfig {
            tls_password: Some("hunter2".to_string()),
            ..Default::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("<redacted>"));
    }
}

//! Records decoded from a build's `started.json` and `finished.json` markers.
//!
//! Known fields are typed; anything else the CI system adds is kept in `extra`.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Contents of `started.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Started {
    /// Epoch seconds.
    pub timestamp: i64,
    #[serde(rename = "repo-version", default, deserialize_with = "null_as_default")]
    pub repo_version: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub node: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub pull: String,
    /// Repository name to branch-or-pull descriptor.
    #[serde(default, deserialize_with = "null_as_default")]
    pub repos: BTreeMap<String, String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Started {
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.timestamp, 0)
    }
}

/// Contents of `finished.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Finished {
    /// Epoch seconds.
    pub timestamp: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub passed: bool,
    #[serde(rename = "job-version", default, deserialize_with = "null_as_default")]
    pub job_version: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub metadata: Metadata,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Finished {
    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.timestamp, 0)
    }

    pub fn result(&self) -> BuildResult {
        if self.passed {
            BuildResult::Passed
        } else {
            BuildResult::Failed
        }
    }
}

/// Treat an explicit `null` like a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Outcome recorded in `finished.json`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildResult {
    Passed,
    Failed,
}

impl std::fmt::Display for BuildResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BuildResult::Passed => write!(f, "passed"),
            BuildResult::Failed => write!(f, "failed"),
        }
    }
}

/// Free-form `metadata` object of `finished.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Metadata(pub Map<String, Value>);

impl Metadata {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// String value for `key`, if present and a string.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

//! Shared types used across the codebase

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

/// Caller identity resolved by the authentication gate, once per request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    /// No credentials were checked (authentication disabled or bootstrap mode)
    Anonymous,
    /// Credentials were verified against the user directory
    User { name: String, admin: bool },
}

impl Identity {
    pub fn is_anonymous(&self) -> bool {
        matches!(self, Identity::Anonymous)
    }
}

impl From<&User> for Identity {
    fn from(user: &User) -> Self {
        Identity::User {
            name: user.name.clone(),
            admin: user.admin,
        }
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identity::Anonymous => write!(f, "anonymous"),
            Identity::User { name, .. } => write!(f, "{}", name),
        }
    }
}

/// A cluster user account. The password hash never leaves the process.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub name: String,
    #[serde(skip)]
    pub hash: String,
    #[serde(skip_serializing_if = "is_false")]
    pub admin: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// Retention policy attached to a database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionPolicy {
    pub name: String,
    /// Zero means data is kept forever
    #[serde(default, with = "duration_nanos")]
    pub duration: Duration,
    #[serde(rename = "replicaN", default = "default_replica_n")]
    pub replica_n: u32,
}

fn default_replica_n() -> u32 {
    1
}

impl RetentionPolicy {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            duration: Duration::ZERO,
            replica_n: default_replica_n(),
        }
    }
}

/// Partial update of a retention policy; absent fields are left untouched
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RetentionPolicyUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, with = "duration_nanos::option")]
    pub duration: Option<Duration>,
    #[serde(rename = "replicaN", default)]
    pub replica_n: Option<u32>,
}

/// A shard covering one time window of a retention policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Shard {
    pub id: u64,
    pub policy: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

impl Shard {
    pub fn contains(&self, timestamp: DateTime<Utc>) -> bool {
        self.start_time <= timestamp && timestamp < self.end_time
    }
}

/// A cluster member that stores data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataNode {
    pub id: u64,
    pub url: Url,
}

impl DataNode {
    /// Address as exposed on the wire; a bare root path carries no trailing slash
    pub fn address(&self) -> String {
        node_address(&self.url)
    }
}

impl Serialize for DataNode {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;

        let mut node = serializer.serialize_struct("DataNode", 2)?;
        node.serialize_field("id", &self.id)?;
        node.serialize_field("url", &self.address())?;
        node.end()
    }
}

pub(crate) fn node_address(url: &Url) -> String {
    let rendered = url.as_str();
    if url.path() == "/" && url.query().is_none() && url.fragment().is_none() {
        rendered.trim_end_matches('/').to_string()
    } else {
        rendered.to_string()
    }
}

/// Durations travel on the wire as integer nanoseconds
pub(crate) mod duration_nanos {
    use std::time::Duration;

    use serde::{ser::Error as _, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        let nanos = u64::try_from(value.as_nanos())
            .map_err(|_| S::Error::custom(format!("duration out of range: {:?}", value)))?;
        serializer.serialize_u64(nanos)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let nanos = u64::deserialize(deserializer)?;
        Ok(Duration::from_nanos(nanos))
    }

    pub mod option {
        use std::time::Duration;

        use serde::{Deserialize, Deserializer};

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<Duration>, D::Error> {
            let nanos = Option::<u64>::deserialize(deserializer)?;
            Ok(nanos.map(Duration::from_nanos))
        }
    }
}

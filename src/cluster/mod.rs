//! Cluster metadata store behind the gateway.
//!
//! `Backend` is the capability surface the gate, the dispatcher and the
//! handlers consume. `MemoryCluster` is the in-process implementation used
//! by the binary and the tests.

pub mod memory;

use async_trait::async_trait;
use thiserror::Error;
use url::Url;

use crate::types::{DataNode, RetentionPolicy, RetentionPolicyUpdate, Shard, User};

pub use memory::MemoryCluster;

/// Errors reported by the cluster store
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClusterError {
    #[error("database not found")]
    DatabaseNotFound,

    #[error("retention policy not found")]
    RetentionPolicyNotFound,

    #[error("user not found")]
    UserNotFound,

    #[error("data node not found")]
    DataNodeNotFound,

    #[error("shard not found")]
    ShardNotFound,

    #[error("database exists")]
    DatabaseExists,

    #[error("retention policy exists")]
    RetentionPolicyExists,

    #[error("user exists")]
    UserExists,

    #[error("data node exists")]
    DataNodeExists,

    #[error("database name required")]
    DatabaseNameRequired,

    #[error("retention policy name required")]
    RetentionPolicyNameRequired,

    #[error("username required")]
    UsernameRequired,

    #[error("data node url required")]
    DataNodeUrlRequired,

    #[error("replication factor must be at least 1")]
    InvalidReplicaN,

    #[error("invalid password")]
    InvalidPassword,

    #[error("initial admin user already exists")]
    BootstrapClosed,

    #[error("internal error: {0}")]
    Internal(String),
}

impl ClusterError {
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ClusterError::DatabaseNotFound
                | ClusterError::RetentionPolicyNotFound
                | ClusterError::UserNotFound
                | ClusterError::DataNodeNotFound
                | ClusterError::ShardNotFound
        )
    }

    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            ClusterError::DatabaseExists
                | ClusterError::RetentionPolicyExists
                | ClusterError::UserExists
                | ClusterError::DataNodeExists
        )
    }

    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            ClusterError::DatabaseNameRequired
                | ClusterError::RetentionPolicyNameRequired
                | ClusterError::UsernameRequired
                | ClusterError::DataNodeUrlRequired
                | ClusterError::InvalidReplicaN
        )
    }
}

pub type ClusterResult<T> = Result<T, ClusterError>;

/// Admin flag requested for a new user.
///
/// Conditional grants are decided under the same lock as the insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminGrant {
    Denied,
    Granted,
    /// Admin only if no admin exists yet
    FirstAdmin,
    /// Admin, and refused with `BootstrapClosed` once any user exists
    Bootstrap,
}

/// Operations the gateway needs from the cluster.
///
/// Implementations own all synchronisation; callers hold no locks between
/// calls. `create_user` must evaluate its `AdminGrant` atomically with the
/// insert so two requests racing to create the first admin promote one user.
#[async_trait]
pub trait Backend: Send + Sync {
    // Users
    async fn users_count(&self) -> ClusterResult<usize>;
    async fn admin_exists(&self) -> ClusterResult<bool>;
    async fn authenticate(&self, username: &str, password: &str) -> ClusterResult<User>;
    async fn users(&self) -> ClusterResult<Vec<User>>;
    /// Returns whether the stored user is an admin
    async fn create_user(
        &self,
        name: &str,
        password: &str,
        grant: AdminGrant,
    ) -> ClusterResult<bool>;
    async fn delete_user(&self, name: &str) -> ClusterResult<()>;

    // Databases
    async fn databases(&self) -> ClusterResult<Vec<String>>;
    async fn create_database(&self, name: &str) -> ClusterResult<()>;
    async fn delete_database(&self, name: &str) -> ClusterResult<()>;

    // Retention policies
    async fn retention_policies(&self, database: &str) -> ClusterResult<Vec<RetentionPolicy>>;
    async fn create_retention_policy(
        &self,
        database: &str,
        policy: RetentionPolicy,
    ) -> ClusterResult<()>;
    async fn update_retention_policy(
        &self,
        database: &str,
        name: &str,
        update: RetentionPolicyUpdate,
    ) -> ClusterResult<()>;
    async fn delete_retention_policy(&self, database: &str, name: &str) -> ClusterResult<()>;

    // Shards
    async fn shards(&self, database: &str) -> ClusterResult<Vec<Shard>>;
    async fn delete_shard(&self, database: &str, id: u64) -> ClusterResult<()>;

    // Data nodes
    async fn data_nodes(&self) -> ClusterResult<Vec<DataNode>>;
    async fn create_data_node(&self, url: &Url) -> ClusterResult<DataNode>;
    async fn delete_data_node(&self, id: u64) -> ClusterResult<()>;
}

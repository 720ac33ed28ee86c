use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use tokio::sync::Barrier;
use url::Url;

use crate::cluster::{AdminGrant, Backend, ClusterResult, MemoryCluster};
use crate::types::{DataNode, RetentionPolicy, RetentionPolicyUpdate, Shard, User};

/// `Authorization` header value for HTTP Basic credentials
pub fn basic_auth(username: &str, password: &str) -> String {
    let pair = format!("{}:{}", username, password);
    format!("Basic {}", general_purpose::STANDARD.encode(pair))
}

/// In-memory backend that records the calls tests assert on
#[derive(Default)]
pub struct RecordingBackend {
    inner: MemoryCluster,
    authenticate_calls: AtomicUsize,
    authenticated: Mutex<Vec<(String, String)>>,
    created_users: Mutex<Vec<(String, bool)>>,
    users_count_barrier: Option<Arc<Barrier>>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every `users_count` call waits on `barrier` before answering
    pub fn with_users_count_barrier(barrier: Arc<Barrier>) -> Self {
        Self {
            users_count_barrier: Some(barrier),
            ..Self::default()
        }
    }

    pub fn inner(&self) -> &MemoryCluster {
        &self.inner
    }

    pub fn authenticate_calls(&self) -> usize {
        self.authenticate_calls.load(Ordering::SeqCst)
    }

    /// Credential pairs passed to `authenticate`, in call order
    pub fn authenticated(&self) -> Vec<(String, String)> {
        self.authenticated.lock().unwrap().clone()
    }

    /// `(name, admin)` for every user created, with the admin flag as stored
    pub fn created_users(&self) -> Vec<(String, bool)> {
        self.created_users.lock().unwrap().clone()
    }
}

#[async_trait]
impl Backend for RecordingBackend {
    async fn users_count(&self) -> ClusterResult<usize> {
        let count = self.inner.users_count().await;
        if let Some(barrier) = &self.users_count_barrier {
            barrier.wait().await;
        }
        count
    }

    async fn admin_exists(&self) -> ClusterResult<bool> {
        self.inner.admin_exists().await
    }

    async fn authenticate(&self, username: &str, password: &str) -> ClusterResult<User> {
        self.authenticate_calls.fetch_add(1, Ordering::SeqCst);
        self.authenticated
            .lock()
            .unwrap()
            .push((username.to_string(), password.to_string()));
        self.inner.authenticate(username, password).await
    }

    async fn users(&self) -> ClusterResult<Vec<User>> {
        self.inner.users().await
    }

    async fn create_user(
        &self,
        name: &str,
        password: &str,
        grant: AdminGrant,
    ) -> ClusterResult<bool> {
        let admin = self.inner.create_user(name, password, grant).await?;
        self.created_users
            .lock()
            .unwrap()
            .push((name.to_string(), admin));
        Ok(admin)
    }

    async fn delete_user(&self, name: &str) -> ClusterResult<()> {
        self.inner.delete_user(name).await
    }

    async fn databases(&self) -> ClusterResult<Vec<String>> {
        self.inner.databases().await
    }

    async fn create_database(&self, name: &str) -> ClusterResult<()> {
        self.inner.create_database(name).await
    }

    async fn delete_database(&self, name: &str) -> ClusterResult<()> {
        self.inner.delete_database(name).await
    }

    async fn retention_policies(&self, database: &str) -> ClusterResult<Vec<RetentionPolicy>> {
        self.inner.retention_policies(database).await
    }

    async fn create_retention_policy(
        &self,
        database: &str,
        policy: RetentionPolicy,
    ) -> ClusterResult<()> {
        self.inner.create_retention_policy(database, policy).await
    }

    async fn update_retention_policy(
        &self,
        database: &str,
        name: &str,
        update: RetentionPolicyUpdate,
    ) -> ClusterResult<()> {
        self.inner.update_retention_policy(database, name, update).await
    }

    async fn delete_retention_policy(&self, database: &str, name: &str) -> ClusterResult<()> {
        self.inner.delete_retention_policy(database, name).await
    }

    async fn shards(&self, database: &str) -> ClusterResult<Vec<Shard>> {
        self.inner.shards(database).await
    }

    async fn delete_shard(&self, database: &str, id: u64) -> ClusterResult<()> {
        self.inner.delete_shard(database, id).await
    }

    async fn data_nodes(&self) -> ClusterResult<Vec<DataNode>> {
        self.inner.data_nodes().await
    }

    async fn create_data_node(&self, url: &Url) -> ClusterResult<DataNode> {
        self.inner.create_data_node(url).await
    }

    async fn delete_data_node(&self, id: u64) -> ClusterResult<()> {
        self.inner.delete_data_node(id).await
    }
}

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use tokio::sync::RwLock;
use tracing::{debug, info};
use url::Url;

use super::{AdminGrant, Backend, ClusterError, ClusterResult};
use crate::auth::{PasswordHasher, Sha256Hasher};
use crate::types::{node_address, DataNode, RetentionPolicy, RetentionPolicyUpdate, Shard, User};

const HOUR: Duration = Duration::from_secs(60 * 60);
const DAY: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Default)]
struct DatabaseInfo {
    policies: BTreeMap<String, RetentionPolicy>,
    shards: Vec<Shard>,
}

#[derive(Debug)]
struct ClusterData {
    users: BTreeMap<String, User>,
    databases: BTreeMap<String, DatabaseInfo>,
    data_nodes: BTreeMap<u64, DataNode>,
    /// Shared by data nodes and shards
    next_id: u64,
}

impl Default for ClusterData {
    fn default() -> Self {
        Self {
            users: BTreeMap::new(),
            databases: BTreeMap::new(),
            data_nodes: BTreeMap::new(),
            next_id: 1,
        }
    }
}

impl ClusterData {
    fn allocate_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn admin_exists(&self) -> bool {
        self.users.values().any(|u| u.admin)
    }

    fn database(&self, name: &str) -> ClusterResult<&DatabaseInfo> {
        self.databases.get(name).ok_or(ClusterError::DatabaseNotFound)
    }

    fn database_mut(&mut self, name: &str) -> ClusterResult<&mut DatabaseInfo> {
        self.databases.get_mut(name).ok_or(ClusterError::DatabaseNotFound)
    }
}

/// In-memory cluster catalog; a single lock serialises every mutation
pub struct MemoryCluster {
    data: RwLock<ClusterData>,
    hasher: Arc<dyn PasswordHasher>,
}

impl Default for MemoryCluster {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryCluster {
    pub fn new() -> Self {
        Self::with_hasher(Arc::new(Sha256Hasher))
    }

    pub fn with_hasher(hasher: Arc<dyn PasswordHasher>) -> Self {
        Self {
            data: RwLock::new(ClusterData::default()),
            hasher,
        }
    }

    /// Find or create the shard covering `timestamp` for a policy.
    ///
    /// Series ingest answers 501, so no route allocates shards; embedders and
    /// tests use this to seed the catalog that the shard routes list and drop.
    pub async fn create_shard_group(
        &self,
        database: &str,
        policy: &str,
        timestamp: DateTime<Utc>,
    ) -> ClusterResult<Shard> {
        let mut data = self.data.write().await;
        let width = {
            let db = data.database(database)?;
            let rp = db
                .policies
                .get(policy)
                .ok_or(ClusterError::RetentionPolicyNotFound)?;

            if let Some(existing) = db
                .shards
                .iter()
                .find(|s| s.policy == policy && s.contains(timestamp))
            {
                return Ok(existing.clone());
            }
            shard_group_duration(rp.duration)
        };

        let width_secs = width.as_secs() as i64;
        let seconds = timestamp.timestamp();
        let start = seconds - seconds.rem_euclid(width_secs);
        let start_time = timestamp_at(start)?;
        let end_time = timestamp_at(start + width_secs)?;

        let id = data.allocate_id();
        let shard = Shard {
            id,
            policy: policy.to_string(),
            start_time,
            end_time,
        };
        data.database_mut(database)?.shards.push(shard.clone());

        debug!(database, policy, shard_id = id, "created shard group");
        Ok(shard)
    }
}

/// Width of one shard group for a policy duration; zero means infinite
fn shard_group_duration(retention: Duration) -> Duration {
    if retention.is_zero() {
        7 * DAY
    } else if retention < 2 * DAY {
        HOUR
    } else if retention <= 180 * DAY {
        DAY
    } else {
        7 * DAY
    }
}

fn timestamp_at(seconds: i64) -> ClusterResult<DateTime<Utc>> {
    Utc.timestamp_opt(seconds, 0)
        .single()
        .ok_or_else(|| ClusterError::Internal(format!("timestamp out of range: {}", seconds)))
}

#[async_trait]
impl Backend for MemoryCluster {
    async fn users_count(&self) -> ClusterResult<usize> {
        Ok(self.data.read().await.users.len())
    }

    async fn admin_exists(&self) -> ClusterResult<bool> {
        Ok(self.data.read().await.admin_exists())
    }

    async fn authenticate(&self, username: &str, password: &str) -> ClusterResult<User> {
        let data = self.data.read().await;
        let user = data.users.get(username).ok_or(ClusterError::UserNotFound)?;
        if !self.hasher.verify(password, &user.hash) {
            return Err(ClusterError::InvalidPassword);
        }
        Ok(user.clone())
    }

    async fn users(&self) -> ClusterResult<Vec<User>> {
        Ok(self.data.read().await.users.values().cloned().collect())
    }

    async fn create_user(
        &self,
        name: &str,
        password: &str,
        grant: AdminGrant,
    ) -> ClusterResult<bool> {
        if name.is_empty() {
            return Err(ClusterError::UsernameRequired);
        }

        let mut data = self.data.write().await;
        if grant == AdminGrant::Bootstrap && !data.users.is_empty() {
            return Err(ClusterError::BootstrapClosed);
        }
        if data.users.contains_key(name) {
            return Err(ClusterError::UserExists);
        }

        let admin = match grant {
            AdminGrant::Denied => false,
            AdminGrant::Granted | AdminGrant::Bootstrap => true,
            AdminGrant::FirstAdmin => !data.admin_exists(),
        };

        let user = User {
            name: name.to_string(),
            hash: self.hasher.hash(password),
            admin,
        };
        data.users.insert(name.to_string(), user);

        info!(user = name, admin, "user created");
        Ok(admin)
    }

    async fn delete_user(&self, name: &str) -> ClusterResult<()> {
        if name.is_empty() {
            return Err(ClusterError::UsernameRequired);
        }
        let mut data = self.data.write().await;
        data.users.remove(name).ok_or(ClusterError::UserNotFound)?;
        info!(user = name, "user deleted");
        Ok(())
    }

    async fn databases(&self) -> ClusterResult<Vec<String>> {
        Ok(self.data.read().await.databases.keys().cloned().collect())
    }

    async fn create_database(&self, name: &str) -> ClusterResult<()> {
        if name.is_empty() {
            return Err(ClusterError::DatabaseNameRequired);
        }
        let mut data = self.data.write().await;
        if data.databases.contains_key(name) {
            return Err(ClusterError::DatabaseExists);
        }
        data.databases.insert(name.to_string(), DatabaseInfo::default());
        info!(database = name, "database created");
        Ok(())
    }

    async fn delete_database(&self, name: &str) -> ClusterResult<()> {
        if name.is_empty() {
            return Err(ClusterError::DatabaseNameRequired);
        }
        let mut data = self.data.write().await;
        data.databases.remove(name).ok_or(ClusterError::DatabaseNotFound)?;
        info!(database = name, "database deleted");
        Ok(())
    }

    async fn retention_policies(&self, database: &str) -> ClusterResult<Vec<RetentionPolicy>> {
        let data = self.data.read().await;
        Ok(data.database(database)?.policies.values().cloned().collect())
    }

    async fn create_retention_policy(
        &self,
        database: &str,
        policy: RetentionPolicy,
    ) -> ClusterResult<()> {
        if policy.name.is_empty() {
            return Err(ClusterError::RetentionPolicyNameRequired);
        }
        if policy.replica_n == 0 {
            return Err(ClusterError::InvalidReplicaN);
        }

        let mut data = self.data.write().await;
        let db = data.database_mut(database)?;
        if db.policies.contains_key(&policy.name) {
            return Err(ClusterError::RetentionPolicyExists);
        }

        info!(database, policy = %policy.name, "retention policy created");
        db.policies.insert(policy.name.clone(), policy);
        Ok(())
    }

    async fn update_retention_policy(
        &self,
        database: &str,
        name: &str,
        update: RetentionPolicyUpdate,
    ) -> ClusterResult<()> {
        if update.replica_n == Some(0) {
            return Err(ClusterError::InvalidReplicaN);
        }

        let mut data = self.data.write().await;
        let db = data.database_mut(database)?;
        let mut policy = db
            .policies
            .get(name)
            .cloned()
            .ok_or(ClusterError::RetentionPolicyNotFound)?;

        if let Some(new_name) = update.name.as_deref() {
            if new_name.is_empty() {
                return Err(ClusterError::RetentionPolicyNameRequired);
            }
            if new_name != name && db.policies.contains_key(new_name) {
                return Err(ClusterError::RetentionPolicyExists);
            }
            policy.name = new_name.to_string();
        }
        if let Some(duration) = update.duration {
            policy.duration = duration;
        }
        if let Some(replica_n) = update.replica_n {
            policy.replica_n = replica_n;
        }

        if policy.name != name {
            db.policies.remove(name);
            for shard in db.shards.iter_mut().filter(|s| s.policy == name) {
                shard.policy = policy.name.clone();
            }
        }

        info!(database, policy = %policy.name, "retention policy updated");
        db.policies.insert(policy.name.clone(), policy);
        Ok(())
    }

    async fn delete_retention_policy(&self, database: &str, name: &str) -> ClusterResult<()> {
        if name.is_empty() {
            return Err(ClusterError::RetentionPolicyNameRequired);
        }
        let mut data = self.data.write().await;
        let db = data.database_mut(database)?;
        db.policies
            .remove(name)
            .ok_or(ClusterError::RetentionPolicyNotFound)?;
        db.shards.retain(|s| s.policy != name);
        info!(database, policy = name, "retention policy deleted");
        Ok(())
    }

    async fn shards(&self, database: &str) -> ClusterResult<Vec<Shard>> {
        let data = self.data.read().await;
        Ok(data.database(database)?.shards.clone())
    }

    async fn delete_shard(&self, database: &str, id: u64) -> ClusterResult<()> {
        let mut data = self.data.write().await;
        let db = data.database_mut(database)?;
        let position = db
            .shards
            .iter()
            .position(|s| s.id == id)
            .ok_or(ClusterError::ShardNotFound)?;
        db.shards.remove(position);
        info!(database, shard_id = id, "shard deleted");
        Ok(())
    }

    async fn data_nodes(&self) -> ClusterResult<Vec<DataNode>> {
        Ok(self.data.read().await.data_nodes.values().cloned().collect())
    }

    async fn create_data_node(&self, url: &Url) -> ClusterResult<DataNode> {
        let address = node_address(url);
        let mut data = self.data.write().await;
        if data.data_nodes.values().any(|n| n.address() == address) {
            return Err(ClusterError::DataNodeExists);
        }

        let node = DataNode {
            id: data.allocate_id(),
            url: url.clone(),
        };
        data.data_nodes.insert(node.id, node.clone());

        info!(node_id = node.id, url = %address, "data node created");
        Ok(node)
    }

    async fn delete_data_node(&self, id: u64) -> ClusterResult<()> {
        let mut data = self.data.write().await;
        data.data_nodes
            .remove(&id)
            .ok_or(ClusterError::DataNodeNotFound)?;
        info!(node_id = id, "data node deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(rfc3339: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(rfc3339)
            .unwrap()
            .with_timezone(&Utc)
    }

    async fn cluster_with_policy(duration: Duration) -> MemoryCluster {
        let cluster = MemoryCluster::new();
        cluster.create_database("foo").await.unwrap();
        let policy = RetentionPolicy {
            name: "bar".into(),
            duration,
            replica_n: 1,
        };
        cluster.create_retention_policy("foo", policy).await.unwrap();
        cluster
    }

    #[tokio::test]
    async fn authenticates_users() {
        let cluster = MemoryCluster::new();
        cluster.create_user("lisa", "password", AdminGrant::Granted).await.unwrap();

        let user = cluster.authenticate("lisa", "password").await.unwrap();
        assert!(user.admin);
        assert_eq!(
            cluster.authenticate("lisa", "wrong").await.unwrap_err(),
            ClusterError::InvalidPassword
        );
        assert_eq!(
            cluster.authenticate("nobody", "password").await.unwrap_err(),
            ClusterError::UserNotFound
        );
    }

    #[tokio::test]
    async fn conditional_admin_grants() {
        let cluster = MemoryCluster::new();
        assert!(cluster
            .create_user("orla", "x", AdminGrant::Bootstrap)
            .await
            .unwrap());
        assert_eq!(
            cluster
                .create_user("mallory", "x", AdminGrant::Bootstrap)
                .await
                .unwrap_err(),
            ClusterError::BootstrapClosed
        );
        assert!(!cluster
            .create_user("jdoe", "x", AdminGrant::FirstAdmin)
            .await
            .unwrap());

        let empty = MemoryCluster::new();
        assert!(empty
            .create_user("a", "x", AdminGrant::FirstAdmin)
            .await
            .unwrap());
        assert!(!empty
            .create_user("b", "x", AdminGrant::FirstAdmin)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn tracks_user_count_and_admins() {
        let cluster = MemoryCluster::new();
        assert_eq!(cluster.users_count().await.unwrap(), 0);
        assert!(!cluster.admin_exists().await.unwrap());

        cluster.create_user("jdoe", "1337", AdminGrant::Denied).await.unwrap();
        assert_eq!(cluster.users_count().await.unwrap(), 1);
        assert!(!cluster.admin_exists().await.unwrap());

        cluster.create_user("mclark", "1337", AdminGrant::Granted).await.unwrap();
        assert!(cluster.admin_exists().await.unwrap());

        assert_eq!(
            cluster.create_user("jdoe", "x", AdminGrant::Denied).await.unwrap_err(),
            ClusterError::UserExists
        );
        assert_eq!(
            cluster.create_user("", "x", AdminGrant::Denied).await.unwrap_err(),
            ClusterError::UsernameRequired
        );
    }

    #[tokio::test]
    async fn databases_are_listed_sorted() {
        let cluster = MemoryCluster::new();
        cluster.create_database("foo").await.unwrap();
        cluster.create_database("bar").await.unwrap();
        assert_eq!(cluster.databases().await.unwrap(), vec!["bar", "foo"]);

        assert_eq!(
            cluster.create_database("foo").await.unwrap_err(),
            ClusterError::DatabaseExists
        );
        cluster.delete_database("foo").await.unwrap();
        assert_eq!(
            cluster.delete_database("foo").await.unwrap_err(),
            ClusterError::DatabaseNotFound
        );
    }

    #[tokio::test]
    async fn retention_policy_lifecycle() {
        let cluster = cluster_with_policy(DAY).await;

        assert_eq!(
            cluster
                .create_retention_policy("foo", RetentionPolicy::new("bar"))
                .await
                .unwrap_err(),
            ClusterError::RetentionPolicyExists
        );

        let update = RetentionPolicyUpdate {
            name: Some("baz".into()),
            duration: None,
            replica_n: Some(3),
        };
        cluster.update_retention_policy("foo", "bar", update).await.unwrap();

        let policies = cluster.retention_policies("foo").await.unwrap();
        assert_eq!(policies.len(), 1);
        assert_eq!(policies[0].name, "baz");
        assert_eq!(policies[0].duration, DAY);
        assert_eq!(policies[0].replica_n, 3);

        assert_eq!(
            cluster.delete_retention_policy("foo", "bar").await.unwrap_err(),
            ClusterError::RetentionPolicyNotFound
        );
        cluster.delete_retention_policy("foo", "baz").await.unwrap();
        assert!(cluster.retention_policies("foo").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn rejects_zero_replicas() {
        let cluster = MemoryCluster::new();
        cluster.create_database("foo").await.unwrap();
        let policy = RetentionPolicy {
            replica_n: 0,
            ..RetentionPolicy::new("bar")
        };
        assert_eq!(
            cluster.create_retention_policy("foo", policy).await.unwrap_err(),
            ClusterError::InvalidReplicaN
        );
    }

    #[tokio::test]
    async fn policies_require_existing_database() {
        let cluster = MemoryCluster::new();
        assert_eq!(
            cluster
                .create_retention_policy("nope", RetentionPolicy::new("bar"))
                .await
                .unwrap_err(),
            ClusterError::DatabaseNotFound
        );
        assert_eq!(
            cluster.shards("nope").await.unwrap_err(),
            ClusterError::DatabaseNotFound
        );
    }

    #[tokio::test]
    async fn shard_groups_are_reused_within_their_window() {
        let cluster = cluster_with_policy(DAY).await;

        let first = cluster
            .create_shard_group("foo", "bar", at("2000-01-01T10:15:00Z"))
            .await
            .unwrap();
        assert_eq!(first.start_time, at("2000-01-01T10:00:00Z"));
        assert_eq!(first.end_time, at("2000-01-01T11:00:00Z"));

        let same = cluster
            .create_shard_group("foo", "bar", at("2000-01-01T10:59:59Z"))
            .await
            .unwrap();
        assert_eq!(same.id, first.id);

        let next = cluster
            .create_shard_group("foo", "bar", at("2000-01-01T11:00:00Z"))
            .await
            .unwrap();
        assert_ne!(next.id, first.id);
        assert_eq!(cluster.shards("foo").await.unwrap().len(), 2);
    }

    #[test]
    fn shard_group_width_follows_retention() {
        assert_eq!(shard_group_duration(HOUR), HOUR);
        assert_eq!(shard_group_duration(DAY), HOUR);
        assert_eq!(shard_group_duration(30 * DAY), DAY);
        assert_eq!(shard_group_duration(365 * DAY), 7 * DAY);
        assert_eq!(shard_group_duration(Duration::ZERO), 7 * DAY);
    }

    #[tokio::test]
    async fn deletes_shards() {
        let cluster = cluster_with_policy(DAY).await;
        let shard = cluster
            .create_shard_group("foo", "bar", at("2000-01-01T00:00:00Z"))
            .await
            .unwrap();

        cluster.delete_shard("foo", shard.id).await.unwrap();
        assert_eq!(
            cluster.delete_shard("foo", shard.id).await.unwrap_err(),
            ClusterError::ShardNotFound
        );
    }

    #[tokio::test]
    async fn data_node_ids_are_sequential_and_unique_by_url() {
        let cluster = MemoryCluster::new();
        let first = cluster
            .create_data_node(&Url::parse("http://localhost:1000").unwrap())
            .await
            .unwrap();
        let second = cluster
            .create_data_node(&Url::parse("http://localhost:2000").unwrap())
            .await
            .unwrap();
        assert_eq!((first.id, second.id), (1, 2));

        assert_eq!(
            cluster
                .create_data_node(&Url::parse("http://localhost:1000/").unwrap())
                .await
                .unwrap_err(),
            ClusterError::DataNodeExists
        );

        cluster.delete_data_node(1).await.unwrap();
        assert_eq!(
            cluster.delete_data_node(1).await.unwrap_err(),
            ClusterError::DataNodeNotFound
        );
        let remaining = cluster.data_nodes().await.unwrap();
        assert_eq!(remaining, vec![second]);
    }
}

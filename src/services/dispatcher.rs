use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::cluster::{AdminGrant, Backend, ClusterError};
use crate::query::{Query, Statement};
use crate::types::{Identity, RetentionPolicy, RetentionPolicyUpdate};

#[derive(Debug, Error)]
pub enum DispatchError {
    /// Unauthenticated query outside the single bootstrap statement
    #[error("initial admin user does not exist")]
    BootstrapViolation,

    #[error("{message}")]
    InvalidStatement { index: usize, message: String },

    #[error("{source}")]
    Backend {
        index: usize,
        statement: &'static str,
        source: ClusterError,
    },

    #[error(transparent)]
    Cluster(#[from] ClusterError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    /// Applied to the cluster by this dispatcher
    Executed,
    /// Accepted but left to the query engine
    Delegated,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatementResult {
    pub index: usize,
    pub statement: &'static str,
    pub outcome: Outcome,
}

/// Tracks whether the current query may still promote a user to admin.
///
/// Only the first create-user statement carries a conditional grant; the
/// backend decides it atomically with the insert.
#[derive(Debug)]
struct BootstrapGrant {
    next: Option<AdminGrant>,
}

impl BootstrapGrant {
    fn new(bootstrap: bool) -> Self {
        let grant = if bootstrap {
            AdminGrant::Bootstrap
        } else {
            AdminGrant::FirstAdmin
        };
        Self { next: Some(grant) }
    }

    fn claim(&mut self) -> AdminGrant {
        self.next.take().unwrap_or(AdminGrant::Denied)
    }
}

/// Executes parsed statements against the cluster, in order, stopping at
/// the first failure
pub struct StatementDispatcher<'a> {
    backend: &'a dyn Backend,
    auth_enabled: bool,
}

impl<'a> StatementDispatcher<'a> {
    pub fn new(backend: &'a dyn Backend, auth_enabled: bool) -> Self {
        Self {
            backend,
            auth_enabled,
        }
    }

    pub async fn dispatch(
        &self,
        query: &Query,
        identity: &Identity,
    ) -> Result<Vec<StatementResult>, DispatchError> {
        // An anonymous caller with authentication on only gets here through
        // the bootstrap waiver.
        let bootstrap = self.auth_enabled && identity.is_anonymous();
        if bootstrap {
            self.check_bootstrap(query).await?;
        }

        let mut grant = BootstrapGrant::new(bootstrap);
        let mut results = Vec::with_capacity(query.len());

        for (index, statement) in query.statements.iter().enumerate() {
            let outcome = self.execute(index, statement, identity, &mut grant).await?;
            results.push(StatementResult {
                index,
                statement: statement.kind(),
                outcome,
            });
        }

        Ok(results)
    }

    async fn check_bootstrap(&self, query: &Query) -> Result<(), DispatchError> {
        match query.statements.as_slice() {
            [statement] if statement.is_create_user() => {}
            _ => {
                warn!(statements = query.len(), "rejected unauthenticated query during bootstrap");
                return Err(DispatchError::BootstrapViolation);
            }
        }

        // Another request may have created the first user since the gate ran.
        if self.backend.users_count().await? > 0 {
            warn!("bootstrap window closed before dispatch");
            return Err(DispatchError::BootstrapViolation);
        }
        Ok(())
    }

    async fn execute(
        &self,
        index: usize,
        statement: &Statement,
        identity: &Identity,
        grant: &mut BootstrapGrant,
    ) -> Result<Outcome, DispatchError> {
        let kind = statement.kind();
        let failed = |source: ClusterError| DispatchError::Backend {
            index,
            statement: kind,
            source,
        };

        match statement {
            Statement::CreateDatabase { name } => {
                self.backend.create_database(name).await.map_err(failed)?;
                info!(caller = %identity, database = %name, "CREATE DATABASE");
            }
            Statement::DropDatabase { name } => {
                self.backend.delete_database(name).await.map_err(failed)?;
                info!(caller = %identity, database = %name, "DROP DATABASE");
            }
            Statement::CreateUser {
                name,
                password,
                all_privileges,
            } => {
                let admin = match self.backend.create_user(name, password, grant.claim()).await {
                    Ok(admin) => admin,
                    Err(ClusterError::BootstrapClosed) => {
                        warn!(user = %name, "bootstrap window closed before user was created");
                        return Err(DispatchError::BootstrapViolation);
                    }
                    Err(e) => return Err(failed(e)),
                };
                info!(
                    caller = %identity,
                    user = %name,
                    admin,
                    all_privileges = *all_privileges,
                    "CREATE USER"
                );
            }
            Statement::DropUser { name } => {
                self.backend.delete_user(name).await.map_err(failed)?;
                info!(caller = %identity, user = %name, "DROP USER");
            }
            Statement::CreateRetentionPolicy {
                name,
                database,
                duration,
                replication,
            } => {
                let policy = RetentionPolicy {
                    name: name.clone(),
                    duration: *duration,
                    replica_n: replica_count(index, *replication)?,
                };
                self.backend
                    .create_retention_policy(database, policy)
                    .await
                    .map_err(failed)?;
                info!(caller = %identity, database = %database, policy = %name, "CREATE RETENTION POLICY");
            }
            Statement::AlterRetentionPolicy {
                name,
                database,
                duration,
                replication,
            } => {
                let (Some(duration), Some(replication)) = (duration, replication) else {
                    return Err(DispatchError::InvalidStatement {
                        index,
                        message: "ALTER RETENTION POLICY requires both DURATION and REPLICATION"
                            .to_string(),
                    });
                };
                let update = RetentionPolicyUpdate {
                    name: None,
                    duration: Some(*duration),
                    replica_n: Some(replica_count(index, *replication)?),
                };
                self.backend
                    .update_retention_policy(database, name, update)
                    .await
                    .map_err(failed)?;
                info!(caller = %identity, database = %database, policy = %name, "ALTER RETENTION POLICY");
            }

            Statement::Select(_)
            | Statement::DropSeries(_)
            | Statement::ListSeries(_)
            | Statement::ListMeasurements(_)
            | Statement::ListTagKeys(_)
            | Statement::ListTagValues(_)
            | Statement::ListFieldKeys(_)
            | Statement::ListFieldValues(_)
            | Statement::Grant(_)
            | Statement::Revoke(_)
            | Statement::CreateContinuousQuery(_)
            | Statement::DropContinuousQuery(_)
            | Statement::ListContinuousQueries(_) => {
                debug!(caller = %identity, statement = kind, "delegated to query engine");
                return Ok(Outcome::Delegated);
            }
        }

        Ok(Outcome::Executed)
    }
}

fn replica_count(index: usize, replication: i64) -> Result<u32, DispatchError> {
    u32::try_from(replication).map_err(|_| DispatchError::InvalidStatement {
        index,
        message: format!("invalid replication factor: {}", replication),
    })
}

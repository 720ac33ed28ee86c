// handlers/mod.rs - Request surface of the gateway
//
// Every route sits behind the authentication gate; handlers receive the
// resolved `Identity` through request extensions and talk to the cluster
// through `AppState::backend`.
//
// Route map:
//   GET    /ping                              -> ping
//   GET    /query?q=                          -> query (statement dispatcher)
//   GET    /db                                -> databases
//   POST   /db/:db/series                     -> series (ingest, not implemented)
//   GET    /db/:db/shards                     -> shards
//   DELETE /db/:db/shards/:id                 -> shards
//   GET    /db/:db/retention_policies         -> retention_policies
//   POST   /db/:db/retention_policies         -> retention_policies
//   PUT    /db/:db/retention_policies/:name   -> retention_policies
//   DELETE /db/:db/retention_policies/:name   -> retention_policies
//   GET    /users                             -> users
//   GET    /data_nodes                        -> data_nodes
//   POST   /data_nodes                        -> data_nodes
//   DELETE /data_nodes/:id                    -> data_nodes

pub mod data_nodes;
pub mod databases;
pub mod ping;
pub mod query;
pub mod retention_policies;
pub mod series;
pub mod shards;
pub mod users;

pub use data_nodes::{data_node_create, data_node_delete, data_nodes_list};
pub use databases::databases_list;
pub use ping::ping;
pub use query::query;
pub use retention_policies::{
    retention_policies_list, retention_policy_create, retention_policy_delete,
    retention_policy_update,
};
pub use series::series_write;
pub use shards::{shard_delete, shards_list};
pub use users::users_list;

use crate::error::ApiError;

/// Parse a numeric path segment, rejecting with `message` on failure
pub(crate) fn parse_id(raw: &str, message: &str) -> Result<u64, ApiError> {
    raw.parse().map_err(|_| ApiError::bad_request(message))
}

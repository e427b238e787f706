//! # mongo-api-bridge - REST routes over MongoDB for dashboards
//!
//! Serves a handful of read-only routes (list databases, list collections,
//! find, count, aggregate) so tools like Grafana's JSON API or Infinity data
//! sources can query MongoDB without a native driver.
//!
//! ```rust,ignore
//! let mut options = ServerOptions::new();
//! options.set_mongo_url("mongodb://localhost:27017");
//! options.set_default_db("app");
//!
//! ApiServer::new(options)?.launch().await?;
//! ```

pub mod cli;
pub mod db;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod options;
pub mod server;
pub mod store;

pub use rocket_db_pools::mongodb::bson;

pub use crate::errors::{ApiError, ConfigError, StoreError};
pub use crate::options::ServerOptions;
pub use crate::server::ApiServer;
pub use crate::store::{DocumentStore, MongoStore, Store};

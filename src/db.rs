//! # Database connection module
//!
//! This module provides the MongoDB connection pool through rocket_db_pools and
//! the fairings that hand it to the rest of the server.
//!
//! ## Configuration
//!
//! The pool reads `databases.mongo.url` from the Rocket figment. The CLI fills
//! it from `--mongo-url`, `MONGODB_URL` or `DATABASE_URL`.
//!
//! ## Usage
//!
//! Built-in routes talk to the pool through [`Store`]. Custom routes may use the
//! client directly with the `Connection<MongoApiDb>` guard.
//!
//! ```rust,ignore
//! use mongo_api_bridge::db::MongoApiDb;
//! use rocket::get;
//! use rocket_db_pools::Connection;
//!
//! #[get("/users/count")]
//! async fn user_count(db: Connection<MongoApiDb>) -> String {
//!     let count = db
//!         .database("app")
//!         .collection::<mongo_api_bridge::bson::Document>("users")
//!         .count_documents(None, None)
//!         .await
//!         .unwrap_or_default();
//!     count.to_string()
//! }
//! ```

use std::time::Duration;

use rocket::fairing::{AdHoc, Fairing};
use rocket_db_pools::{Database, mongodb::Client};

use crate::store::{MongoStore, Store};

/// Name of the pool in the `databases` table of the Rocket figment.
pub const DATABASE_NAME: &str = "mongo";

const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// MongoDB connection pool managed by Rocket.
#[derive(Database)]
#[database("mongo")]
pub struct MongoApiDb(Client);

/// Places a [`MongoStore`] backed by the pool into managed state. Must be
/// attached after `MongoApiDb::init()`.
pub fn store_fairing() -> impl Fairing {
    AdHoc::try_on_ignite("MongoDB store", |rocket| async move {
        let client = MongoApiDb::fetch(&rocket).map(|db| db.0.clone());
        let Some(client) = client else {
            log::error!("MongoDB pool is not initialized");
            return Err(rocket);
        };

        Ok(rocket.manage(Store::new(MongoStore::new(client))))
    })
}

/// Releases the client when the server shuts down. A client that does not
/// finish within the grace period is left to the process exit.
pub fn shutdown_fairing() -> impl Fairing {
    AdHoc::on_shutdown("MongoDB disconnect", |rocket| {
        Box::pin(async move {
            let Some(db) = MongoApiDb::fetch(rocket) else {
                return;
            };

            let client = db.0.clone();
            match tokio::time::timeout(SHUTDOWN_GRACE, client.shutdown()).await {
                Ok(()) => log::info!("disconnected from MongoDB"),
                Err(_) => log::warn!(
                    "error while disconnecting from MongoDB: timed out after {}s",
                    SHUTDOWN_GRACE.as_secs()
                ),
            }
        })
    })
}

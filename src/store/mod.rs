//! The read operations the HTTP layer needs from a document database.
//!
//! Handlers only see [`Store`], a shared handle to some [`DocumentStore`].
//! Production servers back it with [`MongoStore`]; tests can inject any other
//! implementation through [`ApiServer::with_store`](crate::server::ApiServer::with_store).

use std::ops::Deref;
use std::sync::Arc;

use rocket_db_pools::mongodb::bson::Document;

use crate::errors::StoreError;

mod mongo;

pub use mongo::MongoStore;

#[rocket::async_trait]
pub trait DocumentStore: Send + Sync {
    /// Checks that the backend is reachable.
    async fn ping(&self) -> Result<(), StoreError>;

    async fn database_names(&self) -> Result<Vec<String>, StoreError>;

    async fn collection_names(&self, database: &str) -> Result<Vec<String>, StoreError>;

    /// Runs a filtered query returning at most `limit` documents. Large
    /// result sets may spill to disk on the server.
    async fn find(
        &self,
        database: &str,
        collection: &str,
        filter: Document,
        limit: i64,
    ) -> Result<Vec<Document>, StoreError>;

    async fn count(
        &self,
        database: &str,
        collection: &str,
        filter: Document,
    ) -> Result<u64, StoreError>;

    /// Runs an aggregation pipeline. Large result sets may spill to disk on
    /// the server.
    async fn aggregate(
        &self,
        database: &str,
        collection: &str,
        pipeline: Vec<Document>,
    ) -> Result<Vec<Document>, StoreError>;
}

/// Shared store handle kept in Rocket managed state.
#[derive(Clone)]
pub struct Store(Arc<dyn DocumentStore>);

impl Store {
    pub fn new(store: impl DocumentStore + 'static) -> Self {
        Self(Arc::new(store))
    }

    pub fn from_arc(store: Arc<dyn DocumentStore>) -> Self {
        Self(store)
    }
}

impl Deref for Store {
    type Target = dyn DocumentStore;

    fn deref(&self) -> &Self::Target {
        self.0.as_ref()
    }
}

use rocket::futures::TryStreamExt;
use rocket_db_pools::mongodb::{
    Client, Collection,
    bson::{Document, doc},
    options::{AggregateOptions, FindOptions},
};

use super::DocumentStore;
use crate::errors::StoreError;

/// [`DocumentStore`] backed by the pooled MongoDB client.
#[derive(Clone)]
pub struct MongoStore {
    client: Client,
}

impl MongoStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    fn collection(&self, database: &str, collection: &str) -> Collection<Document> {
        self.client.database(database).collection(collection)
    }
}

#[rocket::async_trait]
impl DocumentStore for MongoStore {
    async fn ping(&self) -> Result<(), StoreError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(StoreError::query)?;

        Ok(())
    }

    async fn database_names(&self) -> Result<Vec<String>, StoreError> {
        self.client
            .list_database_names(None, None)
            .await
            .map_err(StoreError::query)
    }

    async fn collection_names(&self, database: &str) -> Result<Vec<String>, StoreError> {
        self.client
            .database(database)
            .list_collection_names(None)
            .await
            .map_err(StoreError::query)
    }

    async fn find(
        &self,
        database: &str,
        collection: &str,
        filter: Document,
        limit: i64,
    ) -> Result<Vec<Document>, StoreError> {
        let options = FindOptions::builder()
            .limit(limit)
            .allow_disk_use(true)
            .build();

        let cursor = self
            .collection(database, collection)
            .find(filter, options)
            .await
            .map_err(StoreError::query)?;

        cursor.try_collect().await.map_err(StoreError::decode)
    }

    async fn count(
        &self,
        database: &str,
        collection: &str,
        filter: Document,
    ) -> Result<u64, StoreError> {
        self.collection(database, collection)
            .count_documents(filter, None)
            .await
            .map_err(StoreError::query)
    }

    async fn aggregate(
        &self,
        database: &str,
        collection: &str,
        pipeline: Vec<Document>,
    ) -> Result<Vec<Document>, StoreError> {
        let options = AggregateOptions::builder().allow_disk_use(true).build();

        let cursor = self
            .collection(database, collection)
            .aggregate(pipeline, options)
            .await
            .map_err(StoreError::query)?;

        cursor.try_collect().await.map_err(StoreError::decode)
    }
}

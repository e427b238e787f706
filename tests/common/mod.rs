#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use mongo_api_bridge::bson::{Bson, Document, doc};
use mongo_api_bridge::{ApiServer, DocumentStore, ServerOptions, StoreError};
use rocket::local::asynchronous::Client;

type Collections = BTreeMap<String, Vec<Document>>;

/// In-memory stand-in for MongoDB. Filters support top-level equality only;
/// pipelines support `$match` and `$limit`.
#[derive(Clone, Default)]
pub struct MemoryStore {
    databases: Arc<BTreeMap<String, Collections>>,
    last_limit: Arc<Mutex<Option<i64>>>,
    failure: Option<String>,
    unreachable: bool,
}

impl MemoryStore {
    pub fn new(databases: BTreeMap<String, Collections>) -> Self {
        Self {
            databases: Arc::new(databases),
            ..Self::default()
        }
    }

    /// A store that answers pings but fails every query with `message`.
    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Self::default()
        }
    }

    /// A store that cannot even be pinged.
    pub fn unreachable() -> Self {
        Self {
            unreachable: true,
            ..Self::default()
        }
    }

    /// Limit passed to the most recent find.
    pub fn last_limit(&self) -> Option<i64> {
        *self.last_limit.lock().unwrap()
    }

    fn check(&self) -> Result<(), StoreError> {
        match &self.failure {
            Some(message) => Err(StoreError::Query(message.clone())),
            None => Ok(()),
        }
    }

    fn documents(&self, database: &str, collection: &str) -> Vec<Document> {
        self.databases
            .get(database)
            .and_then(|collections| collections.get(collection))
            .cloned()
            .unwrap_or_default()
    }
}

fn matches(document: &Document, filter: &Document) -> bool {
    filter
        .iter()
        .all(|(key, expected)| document.get(key) == Some(expected))
}

fn stage_limit(value: &Bson) -> Result<usize, StoreError> {
    match value {
        Bson::Int32(n) if *n > 0 => Ok(*n as usize),
        Bson::Int64(n) if *n > 0 => Ok(*n as usize),
        other => Err(StoreError::Query(format!("invalid $limit: {other}"))),
    }
}

#[rocket::async_trait]
impl DocumentStore for MemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        if self.unreachable {
            return Err(StoreError::Query("server selection timeout".to_string()));
        }
        Ok(())
    }

    async fn database_names(&self) -> Result<Vec<String>, StoreError> {
        self.check()?;
        Ok(self.databases.keys().cloned().collect())
    }

    async fn collection_names(&self, database: &str) -> Result<Vec<String>, StoreError> {
        self.check()?;
        Ok(self
            .databases
            .get(database)
            .map(|collections| collections.keys().cloned().collect())
            .unwrap_or_default())
    }

    async fn find(
        &self,
        database: &str,
        collection: &str,
        filter: Document,
        limit: i64,
    ) -> Result<Vec<Document>, StoreError> {
        self.check()?;
        *self.last_limit.lock().unwrap() = Some(limit);

        Ok(self
            .documents(database, collection)
            .into_iter()
            .filter(|document| matches(document, &filter))
            .take(limit as usize)
            .collect())
    }

    async fn count(
        &self,
        database: &str,
        collection: &str,
        filter: Document,
    ) -> Result<u64, StoreError> {
        self.check()?;

        Ok(self
            .documents(database, collection)
            .iter()
            .filter(|document| matches(document, &filter))
            .count() as u64)
    }

    async fn aggregate(
        &self,
        database: &str,
        collection: &str,
        pipeline: Vec<Document>,
    ) -> Result<Vec<Document>, StoreError> {
        self.check()?;

        let mut documents = self.documents(database, collection);
        for stage in pipeline {
            let Some((operator, argument)) = stage.iter().next() else {
                return Err(StoreError::Query("empty pipeline stage".to_string()));
            };

            match (operator.as_str(), argument) {
                ("$match", Bson::Document(filter)) => {
                    documents.retain(|document| matches(document, filter));
                }
                ("$limit", value) => documents.truncate(stage_limit(value)?),
                (other, _) => {
                    return Err(StoreError::Query(format!(
                        "Unrecognized pipeline stage name: '{other}'"
                    )));
                }
            }
        }

        Ok(documents)
    }
}

/// Two databases: `app` with `users` (3 active, 2 inactive) and `events`,
/// and `sales` with `orders`.
pub fn sample_store() -> MemoryStore {
    let users = vec![
        doc! { "name": "ada", "status": "active" },
        doc! { "name": "bob", "status": "inactive" },
        doc! { "name": "cy", "status": "active" },
        doc! { "name": "dee", "status": "active" },
        doc! { "name": "eve", "status": "inactive" },
    ];
    let events = vec![
        doc! { "x": 1, "kind": "click" },
        doc! { "x": 2, "kind": "view" },
        doc! { "x": 1, "kind": "view" },
        doc! { "x": 3, "kind": "click" },
    ];
    let orders = vec![doc! { "total": 12.5 }, doc! { "total": 40.0 }];

    let mut app = Collections::new();
    app.insert("users".to_string(), users);
    app.insert("events".to_string(), events);

    let mut sales = Collections::new();
    sales.insert("orders".to_string(), orders);

    let mut databases = BTreeMap::new();
    databases.insert("app".to_string(), app);
    databases.insert("sales".to_string(), sales);

    MemoryStore::new(databases)
}

pub async fn client_with(options: ServerOptions, store: MemoryStore) -> Client {
    let server = match ApiServer::with_store(rocket::build(), options, store) {
        Ok(server) => server,
        Err(e) => panic!("invalid server options: {e}"),
    };

    Client::tracked(server.into_rocket())
        .await
        .expect("valid rocket instance")
}

pub async fn client(store: MemoryStore) -> Client {
    client_with(ServerOptions::new(), store).await
}

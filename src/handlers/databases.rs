use rocket::serde::json::Json;
use rocket::{State, get, routes as rocket_routes};

use crate::errors::ApiError;
use crate::models::{CollectionList, DatabaseList};
use crate::options::ServerOptions;
use crate::store::Store;

/// Lists database names. A server pinned to one database only ever reports
/// that database.
#[get("/databases")]
pub async fn get_databases(
    store: &State<Store>,
    options: &State<ServerOptions>,
) -> Result<Json<DatabaseList>, ApiError> {
    if let Some(default_db) = &options.default_db {
        return Ok(Json(DatabaseList {
            databases: vec![default_db.clone()],
        }));
    }

    let databases = store
        .database_names()
        .await
        .map_err(|e| ApiError::backend("getting databases names", e))?;

    Ok(Json(DatabaseList { databases }))
}

/// `GET /api/collections?database=app`
#[get("/collections?<database>")]
pub async fn get_collections(
    store: &State<Store>,
    options: &State<ServerOptions>,
    database: Option<&str>,
) -> Result<Json<CollectionList>, ApiError> {
    let database = options.resolve_database(database)?;

    let collections = store
        .collection_names(&database)
        .await
        .map_err(|e| ApiError::backend("getting collection names", e))?;

    Ok(Json(CollectionList { collections }))
}

pub fn routes() -> Vec<rocket::Route> {
    rocket_routes![get_databases, get_collections]
}

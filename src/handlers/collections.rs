use rocket::serde::json::{Error as JsonError, Json};
use rocket::{State, post, routes as rocket_routes};
use serde_json::Value;

use crate::errors::ApiError;
use crate::models::{self, CountResult};
use crate::options::ServerOptions;
use crate::store::Store;

type JsonBody<'r> = Result<Json<Value>, JsonError<'r>>;

fn collection_name(name: &str) -> Result<&str, ApiError> {
    if name.trim().is_empty() {
        return Err(ApiError::MissingCollection);
    }

    Ok(name)
}

fn read_body(body: JsonBody<'_>) -> Result<Value, ApiError> {
    body.map(Json::into_inner)
        .map_err(|e| ApiError::InvalidBody(e.to_string()))
}

/// Runs a find on the collection.
///
/// Query parameters are `database` and `limit`; the body is the filter, for
/// example `{"UserName": "Jon"}`.
#[post("/collections/<name>/find?<database>&<limit>", data = "<body>")]
pub async fn collection_find(
    store: &State<Store>,
    options: &State<ServerOptions>,
    name: &str,
    database: Option<&str>,
    limit: Option<&str>,
    body: JsonBody<'_>,
) -> Result<Json<Vec<Value>>, ApiError> {
    let database = options.resolve_database(database)?;
    let collection = collection_name(name)?;
    let limit = options.resolve_limit(limit)?;
    let filter = models::filter_document(read_body(body)?)?;

    let documents = store
        .find(&database, collection, filter, limit)
        .await
        .map_err(|e| ApiError::backend("running find", e))?;

    Ok(Json(models::documents_to_json(documents)))
}

/// Counts the documents matching the filter in the body.
#[post("/collections/<name>/count?<database>", data = "<body>")]
pub async fn collection_count(
    store: &State<Store>,
    options: &State<ServerOptions>,
    name: &str,
    database: Option<&str>,
    body: JsonBody<'_>,
) -> Result<Json<CountResult>, ApiError> {
    let database = options.resolve_database(database)?;
    let collection = collection_name(name)?;
    let filter = models::filter_document(read_body(body)?)?;

    let count = store
        .count(&database, collection, filter)
        .await
        .map_err(|e| ApiError::backend("running count", e))?;

    Ok(Json(CountResult { count }))
}

/// Runs an aggregation pipeline, given as
/// `{"Aggregate": [{"$match": {"UserName": "Jon"}}]}`.
#[post("/collections/<name>/aggregate?<database>", data = "<body>")]
pub async fn collection_aggregate(
    store: &State<Store>,
    options: &State<ServerOptions>,
    name: &str,
    database: Option<&str>,
    body: JsonBody<'_>,
) -> Result<Json<Vec<Value>>, ApiError> {
    let database = options.resolve_database(database)?;
    let collection = collection_name(name)?;
    let pipeline = models::pipeline_documents(read_body(body)?)?;

    let documents = store
        .aggregate(&database, collection, pipeline)
        .await
        .map_err(|e| ApiError::backend("running aggregate", e))?;

    Ok(Json(models::documents_to_json(documents)))
}

// An empty collection segment collapses `/collections//find` into these.
#[post("/collections/find")]
pub fn find_without_collection() -> ApiError {
    ApiError::MissingCollection
}

#[post("/collections/count")]
pub fn count_without_collection() -> ApiError {
    ApiError::MissingCollection
}

#[post("/collections/aggregate")]
pub fn aggregate_without_collection() -> ApiError {
    ApiError::MissingCollection
}

pub fn routes() -> Vec<rocket::Route> {
    rocket_routes![
        collection_find,
        collection_count,
        collection_aggregate,
        find_without_collection,
        count_without_collection,
        aggregate_without_collection
    ]
}

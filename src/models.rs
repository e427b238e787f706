use serde::{Deserialize, Serialize};
use rocket_db_pools::mongodb::bson::{Bson, Document};
use serde_json::{Map, Value};

use crate::errors::ApiError;

/// Key of the pipeline array in an aggregate request body.
pub const PIPELINE_KEY: &str = "Aggregate";

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DatabaseList {
    #[serde(rename = "Databases")]
    pub databases: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CollectionList {
    #[serde(rename = "Collections")]
    pub collections: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CountResult {
    #[serde(rename = "Count")]
    pub count: u64,
}

/// Converts a JSON request body into a query filter. Extended JSON such as
/// `{"$oid": "..."}` is understood.
pub fn filter_document(body: Value) -> Result<Document, ApiError> {
    match body {
        Value::Object(map) => object_to_document(map),
        other => Err(ApiError::InvalidBody(format!(
            "expected a JSON object, got {}",
            json_kind(&other)
        ))),
    }
}

/// Pulls the pipeline stages out of an aggregate request body.
pub fn pipeline_documents(body: Value) -> Result<Vec<Document>, ApiError> {
    let Value::Object(mut map) = body else {
        return Err(ApiError::MissingPipeline);
    };

    let Some(Value::Array(stages)) = map.remove(PIPELINE_KEY) else {
        return Err(ApiError::MissingPipeline);
    };

    stages
        .into_iter()
        .enumerate()
        .map(|(index, stage)| match stage {
            Value::Object(map) => object_to_document(map),
            _ => Err(ApiError::InvalidBody(format!(
                "pipeline stage {index} is not a document"
            ))),
        })
        .collect()
}

/// Renders result documents as plain JSON: object ids become hex strings and
/// dates RFC 3339 strings. Other values use relaxed extended JSON.
pub fn documents_to_json(documents: Vec<Document>) -> Vec<Value> {
    documents
        .into_iter()
        .map(|document| plain_json(Bson::Document(document)))
        .collect()
}

fn plain_json(value: Bson) -> Value {
    match value {
        Bson::ObjectId(oid) => Value::String(oid.to_hex()),
        // Dates outside the RFC 3339 range keep their `$date` form.
        Bson::DateTime(date) => match date.try_to_rfc3339_string() {
            Ok(text) => Value::String(text),
            Err(_) => Bson::DateTime(date).into_relaxed_extjson(),
        },
        Bson::Document(document) => Value::Object(
            document
                .into_iter()
                .map(|(key, value)| (key, plain_json(value)))
                .collect(),
        ),
        Bson::Array(values) => Value::Array(values.into_iter().map(plain_json).collect()),
        other => other.into_relaxed_extjson(),
    }
}

fn object_to_document(map: Map<String, Value>) -> Result<Document, ApiError> {
    Document::try_from(map).map_err(|e| ApiError::InvalidBody(e.to_string()))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

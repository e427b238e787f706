use rocket::Request;
use rocket::http::{ContentType, Method, Status};
use rocket::response::{self, Responder, Response};
use serde_json::json;
use thiserror::Error;

/// Failure reported by a [`DocumentStore`](crate::store::DocumentStore).
#[derive(Error, Debug)]
pub enum StoreError {
    /// The operation itself was rejected or failed on the server.
    #[error("{0}")]
    Query(String),
    /// The operation ran but its results could not be read back.
    #[error("{0}")]
    Decode(String),
}

impl StoreError {
    pub fn query(err: impl std::fmt::Display) -> Self {
        StoreError::Query(err.to_string())
    }

    pub fn decode(err: impl std::fmt::Display) -> Self {
        StoreError::Decode(err.to_string())
    }
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Database name was not passed, one is needed")]
    MissingDatabase,
    #[error("Collection name was not passed")]
    MissingCollection,
    #[error("Limit is not an int: {0}")]
    InvalidLimit(#[from] std::num::ParseIntError),
    #[error("Limit must not be negative")]
    NegativeLimit,
    #[error("Passed limit is greater than max limit set by server")]
    LimitTooLarge,
    #[error("Error reading body request: {0}")]
    InvalidBody(String),
    #[error("Request Body is missing aggregate pipeline")]
    MissingPipeline,
    #[error("Error {action}: {source}")]
    Backend {
        action: &'static str,
        #[source]
        source: StoreError,
    },
}

impl ApiError {
    /// Wraps a store failure, naming the step that failed.
    ///
    /// Decoding failures are reported the same way for every operation.
    pub fn backend(action: &'static str, source: StoreError) -> Self {
        let action = match source {
            StoreError::Query(_) => action,
            StoreError::Decode(_) => "decoding results",
        };
        log::warn!("store operation failed while {action}: {source}");
        ApiError::Backend { action, source }
    }

    pub fn status(&self) -> Status {
        match self {
            ApiError::Backend { .. } => Status::InternalServerError,
            _ => Status::BadRequest,
        }
    }
}

impl<'r> Responder<'r, 'static> for ApiError {
    fn respond_to(self, _: &'r Request<'_>) -> response::Result<'static> {
        error_response(self.status(), &self.to_string())
    }
}

/// Builds the JSON error envelope shared by handlers and catchers.
pub fn error_response(status: Status, message: &str) -> response::Result<'static> {
    let body = json!({
        "error": message,
        "status": status.code
    })
    .to_string();

    Response::build()
        .status(status)
        .header(ContentType::JSON)
        .sized_body(body.len(), std::io::Cursor::new(body))
        .ok()
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid custom route name")]
    InvalidCustomRouteName,
    #[error("find limit must be greater than zero, got {0}")]
    InvalidFindLimit(i64),
    #[error("find max limit must not be negative, got {0}")]
    InvalidFindMaxLimit(i64),
    #[error("find limit {limit} is greater than find max limit {max}")]
    FindLimitAboveMax { limit: i64, max: i64 },
    #[error("default database name must not be empty")]
    EmptyDefaultDb,
    #[error("invalid server address '{0}'")]
    InvalidAddress(String),
    #[error("custom routes only accept GET and POST, got {method} {uri}")]
    UnsupportedCustomMethod { method: Method, uri: String },
    #[error("invalid configuration: {0}")]
    Figment(#[from] rocket::figment::Error),
    #[error("failed to build CORS fairing: {0}")]
    Cors(#[from] rocket_cors::Error),
}

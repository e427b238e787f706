use rocket::http::Status;
use rocket::response::{self, Responder};
use rocket::{Request, catch, catchers, get};

use crate::errors::error_response;

pub mod collections;
pub mod databases;

/// Connectivity probe. Answers regardless of database health.
#[get("/")]
pub fn index() -> Status {
    Status::Ok
}

/// JSON body for errors raised outside the handlers.
pub struct CatcherError {
    status: Status,
    message: &'static str,
}

impl<'r> Responder<'r, 'static> for CatcherError {
    fn respond_to(self, _: &'r Request<'_>) -> response::Result<'static> {
        error_response(self.status, self.message)
    }
}

#[catch(400)]
pub fn catch400() -> CatcherError {
    CatcherError {
        status: Status::BadRequest,
        message: "Bad request",
    }
}

#[catch(404)]
pub fn catch404() -> CatcherError {
    CatcherError {
        status: Status::NotFound,
        message: "Resource not found",
    }
}

#[catch(422)]
pub fn catch422() -> CatcherError {
    CatcherError {
        status: Status::UnprocessableEntity,
        message: "Request could not be processed",
    }
}

#[catch(500)]
pub fn catch500() -> CatcherError {
    CatcherError {
        status: Status::InternalServerError,
        message: "Internal server error",
    }
}

pub fn catchers() -> Vec<rocket::Catcher> {
    catchers![catch400, catch404, catch422, catch500]
}

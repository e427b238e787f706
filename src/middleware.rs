//! Fairings used as per-group middleware.
//!
//! Rocket fairings are global. [`Scoped`] narrows one to the requests whose path
//! sits under a route group, which is how `/api` and the custom group get their
//! own middleware stacks.

use std::time::Instant;

use rocket::fairing::{Fairing, Info, Kind};
use rocket::http::Header;
use rocket::{Data, Request, Response};
use uuid::Uuid;

/// Header carrying the id assigned to each request.
pub const REQUEST_ID_HEADER: &str = "X-Request-Id";

/// Runs the request and response callbacks of `inner` only for requests under
/// `prefix`. Ignite, liftoff and shutdown callbacks are not forwarded.
pub struct Scoped<F> {
    prefix: String,
    inner: F,
}

impl<F: Fairing> Scoped<F> {
    pub fn new(prefix: impl Into<String>, inner: F) -> Self {
        let prefix = prefix.into().trim_end_matches('/').to_string();
        Self { prefix, inner }
    }

    fn applies_to(&self, req: &Request<'_>) -> bool {
        let path = req.uri().path();
        let path = path.as_str();

        match path.strip_prefix(self.prefix.as_str()) {
            Some(rest) => rest.is_empty() || rest.starts_with('/'),
            None => false,
        }
    }
}

#[rocket::async_trait]
impl<F: Fairing> Fairing for Scoped<F> {
    fn info(&self) -> Info {
        Info {
            name: self.inner.info().name,
            kind: Kind::Request | Kind::Response,
        }
    }

    async fn on_request(&self, req: &mut Request<'_>, data: &mut Data<'_>) {
        if self.inner.info().kind.is(Kind::Request) && self.applies_to(req) {
            self.inner.on_request(req, data).await;
        }
    }

    async fn on_response<'r>(&self, req: &'r Request<'_>, res: &mut Response<'r>) {
        if self.inner.info().kind.is(Kind::Response) && self.applies_to(req) {
            self.inner.on_response(req, res).await;
        }
    }
}

#[derive(Clone, Copy)]
struct RequestStart {
    id: Uuid,
    at: Instant,
}

/// Tags every request with an id and logs one line per response.
#[derive(Default)]
pub struct RequestLog;

#[rocket::async_trait]
impl Fairing for RequestLog {
    fn info(&self) -> Info {
        Info {
            name: "Request log",
            kind: Kind::Request | Kind::Response,
        }
    }

    async fn on_request(&self, req: &mut Request<'_>, _: &mut Data<'_>) {
        req.local_cache(|| RequestStart {
            id: Uuid::new_v4(),
            at: Instant::now(),
        });
    }

    async fn on_response<'r>(&self, req: &'r Request<'_>, res: &mut Response<'r>) {
        let start = *req.local_cache(|| RequestStart {
            id: Uuid::new_v4(),
            at: Instant::now(),
        });

        log::info!(
            "[{}] {} {} -> {} ({} ms)",
            start.id,
            req.method(),
            req.uri().path(),
            res.status().code,
            start.at.elapsed().as_millis()
        );

        res.set_header(Header::new(REQUEST_ID_HEADER, start.id.to_string()));
    }
}

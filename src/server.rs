use rocket::fairing::{AdHoc, Fairing};
#[cfg(test)]
use rocket::fairing::Kind;
use rocket::http::Method;
use rocket::{Build, Ignite, Rocket, Route, routes};
use rocket_cors::{AllowedOrigins, CorsOptions};
use rocket_db_pools::Database;

use crate::db::{self, MongoApiDb};
use crate::errors::ConfigError;
use crate::handlers;
use crate::middleware::{RequestLog, Scoped};
use crate::options::ServerOptions;
use crate::store::{DocumentStore, Store};

/// Mount point of the built-in query routes.
pub const API_BASE: &str = "/api";

/// Builder around the Rocket instance serving the query routes.
///
/// Built-in routes:
///
/// | Path                             | Verb | Result                                            |
/// |----------------------------------|------|---------------------------------------------------|
/// | `/`                              | GET  | Always 200, connectivity check                    |
/// | `/api/databases`                 | GET  | Database names, or only the fixed database        |
/// | `/api/collections`               | GET  | Collection names of the resolved database         |
/// | `/api/collections/<name>/find`   | POST | Documents matching the filter in the body         |
/// | `/api/collections/<name>/count`  | POST | `{"Count": n}` for the filter in the body         |
/// | `/api/collections/<name>/aggregate` | POST | Result of the pipeline under `Aggregate`       |
///
/// Callers add their own GET/POST routes under the custom group with
/// [`ApiServer::mount_custom`].
pub struct ApiServer {
    options: ServerOptions,
    custom_base: String,
    rocket: Rocket<Build>,
}

impl ApiServer {
    /// Builds a server on a default Rocket instance backed by MongoDB.
    pub fn new(options: ServerOptions) -> Result<Self, ConfigError> {
        Self::on(rocket::build(), options)
    }

    /// Builds a server on a caller supplied Rocket instance backed by MongoDB.
    /// The listen address and pool URL from `options` override the ones in
    /// that instance's figment.
    pub fn on(rocket: Rocket<Build>, options: ServerOptions) -> Result<Self, ConfigError> {
        let figment = options.figment(rocket.figment().clone())?;
        let rocket = rocket
            .configure(figment)
            .attach(MongoApiDb::init())
            .attach(db::store_fairing())
            .attach(db::shutdown_fairing());

        Self::assemble(rocket, options)
    }

    /// Builds a server that answers from `store` instead of MongoDB.
    pub fn with_store(
        rocket: Rocket<Build>,
        options: ServerOptions,
        store: impl DocumentStore + 'static,
    ) -> Result<Self, ConfigError> {
        Self::assemble(rocket.manage(Store::new(store)), options)
    }

    fn assemble(rocket: Rocket<Build>, options: ServerOptions) -> Result<Self, ConfigError> {
        options.validate()?;
        let custom_base = options.custom_route()?;

        let cors = CorsOptions::default()
            .allowed_origins(AllowedOrigins::all())
            .allowed_methods(
                vec![Method::Get, Method::Post, Method::Options]
                    .into_iter()
                    .map(From::from)
                    .collect(),
            )
            .allow_credentials(true)
            .to_cors()?;

        let rocket = rocket
            .attach(ping_fairing())
            .attach(cors)
            .attach(RequestLog)
            .manage(options.clone())
            .register("/", handlers::catchers())
            .mount("/", routes![handlers::index])
            .mount(API_BASE, handlers::databases::routes())
            .mount(API_BASE, handlers::collections::routes());

        Ok(Self {
            options,
            custom_base,
            rocket,
        })
    }

    pub fn options(&self) -> &ServerOptions {
        &self.options
    }

    /// Path the custom routes are mounted under, e.g. `/custom`.
    pub fn custom_base(&self) -> &str {
        &self.custom_base
    }

    /// Adds middleware for the `/api` group, e.g. logging or auth.
    pub fn attach_api<F: Fairing>(mut self, fairing: F) -> Self {
        self.rocket = self.rocket.attach(Scoped::new(API_BASE, fairing));
        self
    }

    /// Adds middleware for the custom group.
    pub fn attach_custom<F: Fairing>(mut self, fairing: F) -> Self {
        let scoped = Scoped::new(self.custom_base.clone(), fairing);
        self.rocket = self.rocket.attach(scoped);
        self
    }

    /// Mounts caller defined routes under the custom group. Handlers can reach
    /// the database through `&State<Store>` or `Connection<MongoApiDb>`.
    pub fn mount_custom(mut self, routes: Vec<Route>) -> Result<Self, ConfigError> {
        if let Some(route) = routes
            .iter()
            .find(|route| !matches!(route.method, Method::Get | Method::Post))
        {
            return Err(ConfigError::UnsupportedCustomMethod {
                method: route.method,
                uri: route.uri.to_string(),
            });
        }

        self.rocket = self.rocket.mount(self.custom_base.as_str(), routes);
        Ok(self)
    }

    /// Hands out the assembled Rocket instance, e.g. for a local test client.
    pub fn into_rocket(self) -> Rocket<Build> {
        self.rocket
    }

    /// Pings the store and serves requests until shutdown.
    pub async fn launch(self) -> Result<Rocket<Ignite>, rocket::Error> {
        self.rocket.launch().await
    }
}

/// Aborts ignition when the store does not answer a ping.
fn ping_fairing() -> impl Fairing {
    AdHoc::try_on_ignite("Document store ping", |rocket| async move {
        let store = rocket.state::<Store>().cloned();
        let Some(store) = store else {
            log::error!("no document store configured");
            return Err(rocket);
        };

        match store.ping().await {
            Ok(()) => {
                log::info!("document store is reachable");
                Ok(rocket)
            }
            Err(e) => {
                log::error!("failed to ping document store: {e}");
                Err(rocket)
            }
        }
    })
}

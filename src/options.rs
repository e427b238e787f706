//! # Server options
//!
//! Settings are read once at startup and placed in Rocket managed state, so
//! handlers receive them through `&State<ServerOptions>`.
//!
//! ## Sources
//!
//! - `[default.bridge]` in `Rocket.toml` (or `ROCKET_BRIDGE`), see [`ServerOptions::from_figment`]
//! - `MONGODB_URL` / `DATABASE_URL`, loaded by the CLI through dotenvy
//! - command line flags, see [`crate::cli`]

use std::net::{IpAddr, Ipv4Addr};

use rocket::figment::Figment;
use rocket::http::uri::Origin;
use serde::{Deserialize, Serialize};

use crate::db::DATABASE_NAME;
use crate::errors::{ApiError, ConfigError};

/// Figment key holding the bridge settings.
pub const CONFIG_KEY: &str = "bridge";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ServerOptions {
    /// Listen address, `:8080` binds every interface on port 8080.
    pub address: String,
    /// Name of the route group that hosts caller-defined routes.
    pub custom_route_name: String,
    /// Number of documents find returns when no limit is passed.
    pub find_limit: i64,
    /// Upper bound for the find limit, 0 means unbounded.
    pub find_max_limit: i64,
    /// When set, every request is pinned to this database.
    pub default_db: Option<String>,
    /// MongoDB connection string handed to the pool.
    pub mongo_url: Option<String>,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            address: ":8080".to_string(),
            custom_route_name: "custom".to_string(),
            find_limit: 1000,
            find_max_limit: 0,
            default_db: None,
            mongo_url: None,
        }
    }
}

impl ServerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads the `bridge` table from a figment, falling back to defaults for
    /// anything missing.
    pub fn from_figment(figment: &Figment) -> Result<Self, ConfigError> {
        if !figment.contains(CONFIG_KEY) {
            return Ok(Self::default());
        }

        Ok(figment.extract_inner(CONFIG_KEY)?)
    }

    pub fn set_address(&mut self, address: impl Into<String>) {
        self.address = address.into();
    }

    /// Sets the custom group name. `/` and `/api` would shadow the built-in
    /// routes and are rejected.
    pub fn set_custom_route_name(&mut self, name: &str) -> Result<(), ConfigError> {
        self.custom_route_name = normalize_route_name(name)?;
        Ok(())
    }

    pub fn set_find_limit(&mut self, limit: i64) {
        self.find_limit = limit;
    }

    pub fn set_find_max_limit(&mut self, max: i64) {
        self.find_max_limit = max;
    }

    pub fn set_default_db(&mut self, name: impl Into<String>) {
        self.default_db = Some(name.into());
    }

    pub fn set_mongo_url(&mut self, url: impl Into<String>) {
        self.mongo_url = Some(url.into());
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        normalize_route_name(&self.custom_route_name)?;
        self.socket_addr()?;

        if self.find_limit <= 0 {
            return Err(ConfigError::InvalidFindLimit(self.find_limit));
        }
        if self.find_max_limit < 0 {
            return Err(ConfigError::InvalidFindMaxLimit(self.find_max_limit));
        }
        if self.find_max_limit != 0 && self.find_limit > self.find_max_limit {
            return Err(ConfigError::FindLimitAboveMax {
                limit: self.find_limit,
                max: self.find_max_limit,
            });
        }
        if matches!(&self.default_db, Some(name) if name.trim().is_empty()) {
            return Err(ConfigError::EmptyDefaultDb);
        }

        Ok(())
    }

    /// Mount point of the custom route group, always with a leading `/`.
    pub fn custom_route(&self) -> Result<String, ConfigError> {
        normalize_route_name(&self.custom_route_name)
    }

    /// Splits `address` into the IP and port Rocket binds to.
    pub fn socket_addr(&self) -> Result<(IpAddr, u16), ConfigError> {
        let invalid = || ConfigError::InvalidAddress(self.address.clone());
        let (host, port) = self.address.rsplit_once(':').ok_or_else(invalid)?;
        let port = port.parse::<u16>().map_err(|_| invalid())?;

        let host = host.trim_start_matches('[').trim_end_matches(']');
        let ip = match host {
            "" => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            "localhost" => IpAddr::V4(Ipv4Addr::LOCALHOST),
            other => other.parse().map_err(|_| invalid())?,
        };

        Ok((ip, port))
    }

    /// Builds the Rocket figment carrying the listen address and the pool URL
    /// on top of whatever `Rocket.toml` and the environment provide.
    pub fn figment(&self, base: Figment) -> Result<Figment, ConfigError> {
        let (address, port) = self.socket_addr()?;
        let mut figment = base.merge(("address", address)).merge(("port", port));

        if let Some(url) = &self.mongo_url {
            figment = figment.merge((format!("databases.{DATABASE_NAME}.url"), url));
        }

        Ok(figment)
    }

    /// Picks the database a request runs against. A configured default always
    /// wins over the query parameter.
    pub fn resolve_database(&self, requested: Option<&str>) -> Result<String, ApiError> {
        if let Some(default_db) = &self.default_db {
            return Ok(default_db.clone());
        }

        match requested {
            Some(name) if !name.is_empty() => Ok(name.to_string()),
            _ => Err(ApiError::MissingDatabase),
        }
    }

    /// Turns the raw `limit` query value into the limit find runs with.
    pub fn resolve_limit(&self, requested: Option<&str>) -> Result<i64, ApiError> {
        let limit = match requested.map(str::trim) {
            None | Some("") => self.find_limit,
            Some(raw) => raw.parse::<i64>()?,
        };

        if limit < 0 {
            return Err(ApiError::NegativeLimit);
        }

        let limit = if limit == 0 { self.find_limit } else { limit };

        if self.find_max_limit != 0 && limit > self.find_max_limit {
            return Err(ApiError::LimitTooLarge);
        }

        Ok(limit)
    }
}

fn normalize_route_name(name: &str) -> Result<String, ConfigError> {
    let name = name.trim();
    let route = if name.starts_with('/') {
        name.to_string()
    } else {
        format!("/{name}")
    };
    let route = match route.trim_end_matches('/') {
        "" => "/".to_string(),
        trimmed => trimmed.to_string(),
    };

    if route == "/" || route == "/api" || Origin::parse(&route).is_err() {
        return Err(ConfigError::InvalidCustomRouteName);
    }

    Ok(route)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn custom_route_name_validation() {
        let cases = [
            ("/custom", true),
            ("reports", true),
            ("/", false),
            ("/api", false),
            ("api", false),
            ("", false),
            ("my reports", false),
        ];

        for (name, ok) in cases {
            let mut options = ServerOptions::new();
            assert_eq!(
                options.set_custom_route_name(name).is_ok(),
                ok,
                "custom route name {name:?}"
            );
        }
    }

    #[test]
    fn custom_route_gets_leading_slash() {
        let mut options = ServerOptions::new();
        options.set_custom_route_name("reports/").unwrap();
        assert_eq!(options.custom_route_name, "/reports");
        assert_eq!(ServerOptions::new().custom_route().unwrap(), "/custom");
    }

    #[test]
    fn address_parsing() {
        let mut options = ServerOptions::new();
        assert_eq!(
            options.socket_addr().unwrap(),
            (IpAddr::V4(Ipv4Addr::UNSPECIFIED), 8080)
        );

        options.set_address("127.0.0.1:9000");
        assert_eq!(
            options.socket_addr().unwrap(),
            (IpAddr::V4(Ipv4Addr::LOCALHOST), 9000)
        );

        options.set_address("localhost:80");
        assert_eq!(options.socket_addr().unwrap().1, 80);

        options.set_address("[::1]:8081");
        assert!(options.socket_addr().unwrap().0.is_loopback());

        options.set_address("8080");
        assert!(options.socket_addr().is_err());

        options.set_address("example:port");
        assert!(options.socket_addr().is_err());
    }

    #[test]
    fn limits_are_validated() {
        let mut options = ServerOptions::new();
        assert!(options.validate().is_ok());

        options.set_find_limit(0);
        assert!(matches!(
            options.validate(),
            Err(ConfigError::InvalidFindLimit(0))
        ));

        options.set_find_limit(500);
        options.set_find_max_limit(100);
        assert!(matches!(
            options.validate(),
            Err(ConfigError::FindLimitAboveMax { .. })
        ));

        options.set_find_max_limit(-1);
        assert!(matches!(
            options.validate(),
            Err(ConfigError::InvalidFindMaxLimit(-1))
        ));
    }

    #[test]
    fn empty_default_db_is_rejected() {
        let mut options = ServerOptions::new();
        options.set_default_db("  ");
        assert!(matches!(options.validate(), Err(ConfigError::EmptyDefaultDb)));
    }

    #[test]
    fn database_resolution() {
        let mut options = ServerOptions::new();
        assert!(matches!(
            options.resolve_database(None),
            Err(ApiError::MissingDatabase)
        ));
        assert!(matches!(
            options.resolve_database(Some("")),
            Err(ApiError::MissingDatabase)
        ));
        assert_eq!(options.resolve_database(Some("sales")).unwrap(), "sales");

        options.set_default_db("app");
        assert_eq!(options.resolve_database(None).unwrap(), "app");
        assert_eq!(options.resolve_database(Some("sales")).unwrap(), "app");
    }

    #[test]
    fn limit_resolution() {
        let mut options = ServerOptions::new();
        assert_eq!(options.resolve_limit(None).unwrap(), 1000);
        assert_eq!(options.resolve_limit(Some("")).unwrap(), 1000);
        assert_eq!(options.resolve_limit(Some("0")).unwrap(), 1000);
        assert_eq!(options.resolve_limit(Some("25")).unwrap(), 25);
        assert!(matches!(
            options.resolve_limit(Some("ten")),
            Err(ApiError::InvalidLimit(_))
        ));
        assert!(matches!(
            options.resolve_limit(Some("-5")),
            Err(ApiError::NegativeLimit)
        ));

        options.set_find_max_limit(50);
        options.set_find_limit(10);
        assert_eq!(options.resolve_limit(Some("50")).unwrap(), 50);
        assert!(matches!(
            options.resolve_limit(Some("51")),
            Err(ApiError::LimitTooLarge)
        ));
    }

    #[test]
    fn figment_section_overrides_defaults() {
        use rocket::figment::providers::{Format, Toml};

        let figment = Figment::new().merge(Toml::string(
            r#"
            [bridge]
            find_limit = 250
            default_db = "app"
            "#,
        ));

        let options = ServerOptions::from_figment(&figment).unwrap();
        assert_eq!(options.find_limit, 250);
        assert_eq!(options.default_db.as_deref(), Some("app"));
        assert_eq!(options.address, ":8080");

        let empty = ServerOptions::from_figment(&Figment::new()).unwrap();
        assert_eq!(empty, ServerOptions::default());
    }

    #[test]
    fn figment_carries_address_and_pool_url() {
        let mut options = ServerOptions::new();
        options.set_address("127.0.0.1:9100");
        options.set_mongo_url("mongodb://localhost:27017");

        let figment = options.figment(Figment::new()).unwrap();
        assert_eq!(figment.extract_inner::<u16>("port").unwrap(), 9100);
        assert_eq!(
            figment
                .extract_inner::<String>(&format!("databases.{DATABASE_NAME}.url"))
                .unwrap(),
            "mongodb://localhost:27017"
        );
    }
}

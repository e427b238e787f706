use std::env;
use std::ffi::OsString;

use clap::{Arg, ArgMatches, Command, value_parser};
use rocket::figment::Figment;

use crate::errors::ConfigError;
use crate::options::ServerOptions;

pub fn cli() -> Command {
    Command::new("mongo-api-bridge")
        .about("Serve MongoDB find, count and aggregate queries over HTTP")
        .arg(
            Arg::new("address")
                .long("address")
                .help("Address to listen on, e.g. :8080 or 127.0.0.1:9000")
                .value_name("ADDR"),
        )
        .arg(
            Arg::new("mongo-url")
                .long("mongo-url")
                .help("MongoDB connection string (defaults to MONGODB_URL or DATABASE_URL)")
                .value_name("URL"),
        )
        .arg(
            Arg::new("default-db")
                .long("default-db")
                .help("Pin every request to this database")
                .value_name("NAME"),
        )
        .arg(
            Arg::new("find-limit")
                .long("find-limit")
                .help("Documents returned by find when no limit is passed")
                .value_name("N")
                .value_parser(value_parser!(i64)),
        )
        .arg(
            Arg::new("find-max-limit")
                .long("find-max-limit")
                .help("Largest limit find accepts, 0 for no limit")
                .value_name("N")
                .value_parser(value_parser!(i64)),
        )
        .arg(
            Arg::new("custom-route")
                .long("custom-route")
                .help("Route group for custom routes")
                .value_name("NAME"),
        )
}

/// Layers the environment and command line on top of the figment settings.
pub fn load_options<I, T>(figment: &Figment, args: I) -> Result<ServerOptions, CliError>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let matches = cli().try_get_matches_from(args)?;
    let mut options = ServerOptions::from_figment(figment)?;

    if let Ok(url) = env::var("MONGODB_URL").or_else(|_| env::var("DATABASE_URL")) {
        options.set_mongo_url(url);
    }

    apply_matches(&mut options, &matches)?;
    options.validate()?;

    Ok(options)
}

fn apply_matches(options: &mut ServerOptions, matches: &ArgMatches) -> Result<(), ConfigError> {
    if let Some(address) = matches.get_one::<String>("address") {
        options.set_address(address);
    }
    if let Some(url) = matches.get_one::<String>("mongo-url") {
        options.set_mongo_url(url);
    }
    if let Some(name) = matches.get_one::<String>("default-db") {
        options.set_default_db(name);
    }
    if let Some(limit) = matches.get_one::<i64>("find-limit") {
        options.set_find_limit(*limit);
    }
    if let Some(max) = matches.get_one::<i64>("find-max-limit") {
        options.set_find_max_limit(*max);
    }
    if let Some(name) = matches.get_one::<String>("custom-route") {
        options.set_custom_route_name(name)?;
    }

    Ok(())
}

#[derive(thiserror::Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Args(#[from] clap::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

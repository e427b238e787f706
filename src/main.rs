//! # mongo-api-bridge
//!
//! ## Environment Variables
//!
//! - `MONGODB_URL` or `DATABASE_URL`: MongoDB connection string
//! - `ROCKET_*`: Rocket settings, including `ROCKET_BRIDGE` for the bridge table

use mongo_api_bridge::ApiServer;
use mongo_api_bridge::cli::{self, CliError};

/// Loads settings from `Rocket.toml`, `.env` and the command line, then serves
/// until shutdown. Startup fails if MongoDB cannot be reached.
#[rocket::main]
async fn main() -> Result<(), rocket::Error> {
    dotenvy::dotenv().ok();

    let options = match cli::load_options(&rocket::Config::figment(), std::env::args_os()) {
        Ok(options) => options,
        Err(CliError::Args(e)) => e.exit(),
        Err(CliError::Config(e)) => {
            eprintln!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    let server = match ApiServer::new(options) {
        Ok(server) => server,
        Err(e) => {
            eprintln!("Failed to build server: {}", e);
            std::process::exit(1);
        }
    };

    let _rocket = server.launch().await?;

    Ok(())
}

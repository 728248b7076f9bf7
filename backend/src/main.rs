//! # Backend Service
//!
//! Thin entry point that delegates to lib-web for server setup.
//!
//! `BIND_ADDRESS` and `ALLOWED_ORIGINS` (comma separated) override the server
//! defaults; everything else is read by `lib_core::Config`.

use lib_utils::get_env_opt;
use lib_web::{start_server, ServerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let mut config = ServerConfig::default();
    if let Some(bind_address) = get_env_opt("BIND_ADDRESS") {
        config.bind_address = bind_address;
    }
    if let Some(origins) = get_env_opt("ALLOWED_ORIGINS") {
        config.allowed_origins = origins
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(str::to_string)
            .collect();
    }

    start_server(config).await
}

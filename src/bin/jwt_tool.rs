use log::{error, info, warn};
use std::sync::Arc;

use jwt_provider::auth::{JwtTokenProvider, TokenProvider};
use jwt_provider::config::{generate_secret, TokenConfig};
use jwt_provider::error::{JwtProviderError, Result};
use jwt_provider::security_logger::init_security_logger;
use jwt_provider::storage::InMemoryUserStore;

const USAGE: &str = "usage:
  jwt_tool issue <identity> [ROLE...]
  jwt_tool validate <token>
  jwt_tool resolve <authorization header value>
  jwt_tool generate-secret";

#[tokio::main]
async fn main() {
    // Initialize env before logging so RUST_LOG can come from .env
    let dotenv = dotenvy::dotenv();

    // Initialize logging
    env_logger::init();

    match dotenv {
        Ok(path) => info!("Environment variables loaded from {}", path.display()),
        Err(e) => warn!("Failed to load .env file: {}", e),
    };

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = match args.first() {
        Some(command) => command.as_str(),
        None => {
            eprintln!("{}", USAGE);
            std::process::exit(2);
        }
    };

    if command == "generate-secret" {
        println!("{}", generate_secret());
        return;
    }

    init_security_logger();

    let provider = match build_provider().await {
        Ok(provider) => provider,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let outcome = match (command, &args[1..]) {
        ("issue", [identity, roles @ ..]) => provider.create_token(identity, roles),
        ("validate", [token]) => validate(&provider, token),
        ("resolve", [header]) => match provider.resolve_token(Some(header.as_str())) {
            Some(token) => Ok(token),
            None => Err(JwtProviderError::ValidationError(
                "Authorization header has no Bearer token".to_string(),
            )),
        },
        _ => {
            eprintln!("{}", USAGE);
            std::process::exit(2);
        }
    };

    match outcome {
        Ok(output) => println!("{}", output),
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    }
}

async fn build_provider() -> Result<JwtTokenProvider> {
    let config = TokenConfig::load().await?;
    let provider = JwtTokenProvider::from_config(&config, Arc::new(InMemoryUserStore::new()))?;
    info!(
        "Token provider configured: key fingerprint {}, validity {:?}",
        provider.key_fingerprint(),
        provider.validity()
    );
    Ok(provider)
}

// Prints the verified claims as JSON
fn validate(provider: &JwtTokenProvider, token: &str) -> Result<String> {
    let claims = provider.decode_claims(token)?;
    serde_json::to_string_pretty(&claims)
        .map_err(|e| JwtProviderError::ValidationError(format!("Failed to render claims: {}", e)))
}

use jsonwebtoken::{Algorithm, DecodingKey};
use lazy_static::lazy_static;
use std::env;
use std::str::FromStr;
use std::time::Duration;
use threads_common::errors::ThreadsServerError;

lazy_static! {
    pub static ref CONFIG: ServerConfig = ServerConfig::from_env();
}

const DEFAULT_PAGE_CACHE_TTL_SECS: u64 = 60;

/// Runtime settings. Compile time defaults come from build.rs
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub mongodb_uri: String,
    pub database_name: String,
    pub session_algorithm: Algorithm,
    // shared secret for HS* or PEM encoded public key for RS*/ES*
    pub session_key: Option<String>,
    pub webhook_secret: Option<String>,
    pub page_cache_ttl: Duration,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let session_algorithm = env::var("THREADS_SESSION_ALGORITHM")
            .ok()
            .and_then(|alg| match Algorithm::from_str(&alg) {
                Ok(alg) => Some(alg),
                Err(_) => {
                    tracing::warn!("Unknown session algorithm {}, falling back to HS256", alg);
                    None
                }
            })
            .unwrap_or(Algorithm::HS256);
        let page_cache_ttl = env::var("THREADS_PAGE_CACHE_TTL")
            .ok()
            .and_then(|secs| secs.parse::<u64>().ok())
            .unwrap_or(DEFAULT_PAGE_CACHE_TTL_SECS);
        Self {
            mongodb_uri: env::var("MONGODB_URI").unwrap_or(env!("MONGODB_URI").to_string()),
            database_name: env::var("DATABASE_NAME").unwrap_or(env!("DATABASE_NAME").to_string()),
            session_algorithm,
            session_key: env::var("THREADS_SESSION_KEY").ok(),
            webhook_secret: env::var("THREADS_WEBHOOK_SECRET").ok(),
            page_cache_ttl: Duration::from_secs(page_cache_ttl),
        }
    }

    /**
     * Build the key used to verify session tokens from the auth provider
     *
     * @returns - the decoding key matching the configured algorithm family
     */
    pub fn session_decoding_key(&self) -> Result<DecodingKey, ThreadsServerError> {
        let key = match &self.session_key {
            Some(key) => key,
            None => {
                return Err(ThreadsServerError::ConfigError(String::from(
                    "THREADS_SESSION_KEY is not set",
                )))
            }
        };
        let decoded = match self.session_algorithm {
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => {
                Ok(DecodingKey::from_secret(key.as_bytes()))
            }
            Algorithm::RS256
            | Algorithm::RS384
            | Algorithm::RS512
            | Algorithm::PS256
            | Algorithm::PS384
            | Algorithm::PS512 => DecodingKey::from_rsa_pem(key.as_bytes()),
            Algorithm::ES256 | Algorithm::ES384 => DecodingKey::from_ec_pem(key.as_bytes()),
            Algorithm::EdDSA => DecodingKey::from_ed_pem(key.as_bytes()),
        };
        decoded.map_err(|e| ThreadsServerError::ConfigError(e.to_string()))
    }
}

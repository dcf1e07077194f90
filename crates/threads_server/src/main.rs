#[macro_use]
extern crate rocket;
use cache::PageCache;
use catchers::{bad_request, internal_error, not_found, unauthorized};
use config::CONFIG;
use mongo::ThreadsDB;
use rocket::{Build, Rocket};
use routes::{PAGE_ROUTES, THREAD_ROUTES, USER_ROUTES, WEBHOOK_ROUTES};
use tracing_subscriber::EnvFilter;

mod cache;
mod catchers;
mod config;
mod guards;
mod mongo;
mod routes;
#[cfg(test)]
mod tests;
mod utils;
mod webhook;

#[rocket::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    // connect to mongodb
    let mongo = ThreadsDB::init(&CONFIG.mongodb_uri, &CONFIG.database_name).await?;
    let cache = PageCache::new(CONFIG.page_cache_ttl);
    if CONFIG.session_key.is_none() {
        tracing::warn!("THREADS_SESSION_KEY is not set, every session will be rejected");
    }
    if CONFIG.webhook_secret.is_none() {
        tracing::warn!("THREADS_WEBHOOK_SECRET is not set, webhooks will be rejected");
    }
    build_rocket(mongo, cache).launch().await?;
    Ok(())
}

/// Assemble the server around a database handle and page cache
pub(crate) fn build_rocket(mongo: ThreadsDB, cache: PageCache) -> Rocket<Build> {
    rocket::build()
        .manage(mongo)
        .manage(cache)
        .mount("/", PAGE_ROUTES.clone())
        .mount("/user", USER_ROUTES.clone())
        .mount("/thread", THREAD_ROUTES.clone())
        .mount("/api/webhook", WEBHOOK_ROUTES.clone())
        .register(
            "/",
            catchers![bad_request, unauthorized, not_found, internal_error],
        )
}

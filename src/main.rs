use std::sync::Arc;

use salvo::{listener::TcpListener, Server};
use tracing_subscriber::EnvFilter;

use config::env_var;
use infra::{
    database::{connection, schema},
    router::{self, RouterConfig},
    service::vision::GeminiVisionService,
};

mod app;
mod base;
mod config;
mod domain;
mod error;
mod infra;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let env = env_var::get();

    let pool = connection::create_sqlx_pool().await;
    schema::apply(&pool)
        .await
        .expect("Expect to apply the database schema");

    let vision = GeminiVisionService::new(
        &env.gemini_api_url,
        &env.gemini_model,
        env.gemini_api_key.clone(),
        env.gemini_timeout,
    )
    .expect("Expect to create the Gemini client");

    let config = RouterConfig {
        max_upload_bytes: env.max_upload_bytes,
        history_limit: env.history_limit,
    };

    let address = format!("0.0.0.0:{}", env.port);
    tracing::info!(model = %env.gemini_model, "food analyzer listening on {address}");

    let listener = TcpListener::bind(&address);
    Server::new(listener)
        .serve(router::app(&pool, Arc::new(vision), config))
        .await;
}

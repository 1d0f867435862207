use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client,
};
use url::Url;

use std::time::Duration;

pub async fn setup_test() -> (Client, Url, sqlx::PgPool) {
    dotenv::dotenv().ok();
    (create_client(), service_url(), setup_database().await)
}

fn service_url() -> Url {
    let port: u16 = std::env::var("PORT")
        .unwrap()
        .parse()
        .expect("Invalid PORT");
    Url::parse(format!("http://localhost:{port}").as_str()).unwrap()
}

async fn setup_database() -> sqlx::PgPool {
    let database_host = std::env::var("DATABASE_HOST").unwrap();
    let database_name = std::env::var("DATABASE_NAME").unwrap();
    let database_user = std::env::var("DATABASE_USER").unwrap();
    let database_password = std::env::var("DATABASE_PASSWORD").unwrap();
    let database_port: u16 = std::env::var("DATABASE_PORT")
        .unwrap()
        .parse()
        .expect("Invalid DATABASE_PORT");

    let database_url = format!("postgres://{database_user}:{database_password}@{database_host}:{database_port}/{database_name}");
    let pool = sqlx::postgres::PgPoolOptions::new()
        .min_connections(1)
        .max_connections(2)
        .acquire_timeout(Duration::from_millis(1000))
        .connect(&database_url)
        .await
        .expect("Expect to create a database pool with a open connection");

    let mut trx = pool.begin().await.unwrap();
    for sttm in include_str!("../../dbschema.sql").split(';') {
        if sttm.trim().is_empty() {
            continue;
        }
        sqlx::query(sttm).execute(&mut trx).await.unwrap();
    }
    sqlx::query("TRUNCATE analyzer.food_analysis")
        .execute(&mut trx)
        .await
        .unwrap();
    trx.commit().await.unwrap();

    pool
}

fn create_client() -> reqwest::Client {
    let mut headers = HeaderMap::new();
    headers.append("accept", HeaderValue::from_static("application/json"));

    let connect_timeout = 1000 * 5; // 5 sec
    let timeout = 1000 * 90; // model calls are slow

    reqwest::Client::builder()
        .connect_timeout(Duration::from_millis(connect_timeout))
        .timeout(Duration::from_millis(timeout))
        .default_headers(headers)
        .build()
        .expect("Expect to create a http client")
}

/// Smallest valid PNG, one transparent pixel.
pub const PIXEL_PNG: &[u8] = &[
    0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a, 0x00, 0x00, 0x00, 0x0d, 0x49, 0x48, 0x44, 0x52,
    0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1f, 0x15, 0xc4,
    0x89, 0x00, 0x00, 0x00, 0x0d, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9c, 0x63, 0x00, 0x01, 0x00, 0x00,
    0x05, 0x00, 0x01, 0x0d, 0x0a, 0x2d, 0xb4, 0x00, 0x00, 0x00, 0x00, 0x49, 0x45, 0x4e, 0x44, 0xae,
    0x42, 0x60, 0x82,
];

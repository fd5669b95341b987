use anyhow::{Context, Result};
use sqlx::PgPool;
use std::env;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_host: String,
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub database_pool: PgPool,
}

impl AppConfig {
    pub async fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let cors_origins = env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:3000".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .collect();

        let database_url = env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let database_pool = PgPool::connect(&database_url).await?;

        Ok(Self {
            database_url,
            jwt_secret: env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            cors_origins,
            database_pool,
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

use std::sync::Arc;

use bistro_service::auth::TokenIssuer;
use bistro_service::{build_pool, DbPool, ServiceError};
use diesel::PgConnection;

use crate::config::Config;
use crate::error::ApiError;
use crate::rate_limit::RateLimiter;

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub tokens: Arc<TokenIssuer>,
    pub rate_limiter: RateLimiter,
}

impl AppState {
    /// Connections are opened lazily, so this never touches the database.
    pub fn new(config: &Config) -> Self {
        Self {
            pool: build_pool(&config.database_url, config.db_pool_size),
            tokens: Arc::new(TokenIssuer::new(
                &config.secret_key,
                config.access_token_ttl,
            )),
            rate_limiter: RateLimiter::new(config.rate_limit_window),
        }
    }

    /// Runs blocking diesel work on the blocking thread pool with a pooled
    /// connection.
    pub async fn db<T, F>(&self, f: F) -> Result<T, ApiError>
    where
        F: FnOnce(&mut PgConnection) -> Result<T, ServiceError> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        let result = tokio::task::spawn_blocking(move || {
            let mut conn = pool.get()?;
            f(&mut conn)
        })
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "database task failed");
            ApiError::InternalError("Internal server error".to_string())
        })?;

        result.map_err(ApiError::from)
    }
}

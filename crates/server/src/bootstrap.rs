use std::sync::Arc;

use axum::Router;
use nola_core::config::{redact_database_url, AppConfig, ConfigError};
use nola_db::{connect_lazy_with_settings, DbPool, MartRepository, PgMartRepository};
use secrecy::ExposeSecret;
use thiserror::Error;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::{api, health};

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub marts: Arc<PgMartRepository>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database pool could not be created: {0}")]
    DatabasePool(#[source] sqlx::Error),
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let schema = config.database.schema()?;
    let database_url = config.database.url.expose_secret();
    let db_pool = connect_lazy_with_settings(
        database_url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .map_err(BootstrapError::DatabasePool)?;

    // The warehouse may still be starting; requests report 503 until it answers.
    match sqlx::query("SELECT 1").execute(&db_pool).await {
        Ok(_) => info!(
            event_name = "system.bootstrap.database_connected",
            correlation_id = "bootstrap",
            database_url = %redact_database_url(database_url),
            "database connection established"
        ),
        Err(error) => warn!(
            event_name = "system.bootstrap.database_unreachable",
            correlation_id = "bootstrap",
            database_url = %redact_database_url(database_url),
            error = %error,
            "database not reachable at startup; continuing"
        ),
    }

    let marts = Arc::new(PgMartRepository::new(db_pool.clone(), schema));

    Ok(Application { config, db_pool, marts })
}

impl Application {
    pub fn router(&self) -> Router {
        let repository: Arc<dyn MartRepository> = self.marts.clone();

        Router::new()
            .merge(health::router(self.db_pool.clone(), self.marts.clone()))
            .merge(api::router(repository))
            .layer(TraceLayer::new_for_http())
    }
}

#[cfg(test)]
mod tests {
    use nola_core::config::{AppConfig, ConfigOverrides, LoadOptions};
    use secrecy::ExposeSecret;

    use crate::bootstrap::{bootstrap_with_config, Application, BootstrapError};

    async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
        bootstrap_with_config(AppConfig::load(options)?).await
    }

    fn unreachable_warehouse() -> LoadOptions {
        LoadOptions {
            overrides: ConfigOverrides {
                database_url: Some("postgres://nola@127.0.0.1:1/challenge_db".to_string()),
                database_timeout_secs: Some(1),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        }
    }

    #[tokio::test]
    async fn bootstrap_fails_fast_on_invalid_schema() {
        let mut options = unreachable_warehouse();
        options.overrides.analytics_schema = Some("Analytics-Prod".to_string());

        let result = bootstrap(options).await;

        assert!(result.is_err());
        let message = result.err().expect("error").to_string();
        assert!(message.contains("analytics_schema"));
    }

    #[tokio::test]
    async fn bootstrap_survives_an_unreachable_warehouse() {
        let app = bootstrap(unreachable_warehouse())
            .await
            .expect("bootstrap should not require a live warehouse");

        assert_eq!(app.marts.schema().as_str(), "analytics");
        assert!(app.config.database.url.expose_secret().contains("127.0.0.1:1"));
        let _router = app.router();

        app.db_pool.close().await;
    }
}

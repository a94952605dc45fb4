//! Application context for the pipeline.
//!
//! One explicit object owning the configuration, the Postgres pool, and
//! the safety policy, constructed once at process start and passed by
//! reference into the pipeline's entry points. There is deliberately no
//! global singleton: everything that needs these resources receives the
//! context.

use crate::catalog::SchemaCatalog;
use crate::crud_service::CrudService;
use crate::executor::StatementExecutor;
use crate::agent::SqlAgentService;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlsentry_commons::{PipelineError, Result};
use sqlsentry_configs::ServerConfig;
use sqlsentry_sql::SafetyPolicy;
use std::sync::Arc;
use std::time::Duration;

pub struct AppContext {
    config: Arc<ServerConfig>,
    pool: PgPool,
    policy: SafetyPolicy,
}

impl AppContext {
    /// Connect the pool and assemble the safety policy.
    ///
    /// When `safety.restrict_to_catalog` is set, the configured allowlist
    /// is extended with every table visible in the live catalog, so the
    /// agent stays confined to the schema that actually exists.
    pub async fn initialize(config: ServerConfig) -> Result<Arc<Self>> {
        let pool = PgPoolOptions::new()
            .max_connections(config.database.max_connections)
            .acquire_timeout(Duration::from_secs(config.database.acquire_timeout_seconds))
            .connect(&config.database.url)
            .await
            .map_err(|e| {
                PipelineError::connection(format!("Failed to connect to database: {}", e))
            })?;

        let mut allowed: Vec<String> = config.safety.allowed_tables.clone();
        if config.safety.restrict_to_catalog {
            let catalog = SchemaCatalog::new(pool.clone());
            allowed.extend(catalog.list_tables().await?);
        }

        let policy = if allowed.is_empty() {
            SafetyPolicy::permissive()
        } else {
            SafetyPolicy::with_allowed_tables(allowed)
        };

        log::info!(
            target: "core::context",
            "database pool ready | max_connections={} | allowlist={}",
            config.database.max_connections,
            if policy.has_allowlist() { "on" } else { "off" }
        );

        Ok(Arc::new(Self {
            config: Arc::new(config),
            pool,
            policy,
        }))
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn policy(&self) -> &SafetyPolicy {
        &self.policy
    }

    /// A statement executor borrowing this context's pool.
    pub fn executor(&self) -> StatementExecutor {
        StatementExecutor::new(self.pool.clone())
    }

    pub fn catalog(&self) -> SchemaCatalog {
        SchemaCatalog::new(self.pool.clone())
    }

    pub fn agent(self: &Arc<Self>) -> SqlAgentService {
        SqlAgentService::new(Arc::clone(self))
    }

    pub fn crud(self: &Arc<Self>) -> CrudService {
        CrudService::new(Arc::clone(self))
    }
}

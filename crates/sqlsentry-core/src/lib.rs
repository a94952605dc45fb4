//! sqlsentry-core
//!
//! The database-facing half of the pipeline: an explicit application
//! context owning the Postgres pool, the per-statement executor, the
//! batch aggregator, the CRUD service, and the information_schema
//! catalog.

pub mod agent;
pub mod app_context;
pub mod catalog;
pub mod crud_service;
pub mod executor;

pub use agent::{run_batch, SqlAgentService};
pub use app_context::AppContext;
pub use catalog::SchemaCatalog;
pub use crud_service::CrudService;
pub use executor::{StatementExecutor, StatementRunner};

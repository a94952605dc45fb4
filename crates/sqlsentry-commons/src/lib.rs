//! # sqlsentry-commons
//!
//! Shared types for the sqlsentry statement pipeline.
//!
//! This crate provides the value objects that cross crate boundaries
//! (statements, outcomes, reports, CRUD requests) and the shared error
//! type. It is kept dependency-light so every other crate can depend on
//! it without cycles.

pub mod errors;
pub mod models;

pub use errors::{PipelineError, Result};
pub use models::{
    BatchReport, BoundStatement, CrudOperation, CrudRequest, Row, Statement, StatementCategory,
    StatementOutcome,
};

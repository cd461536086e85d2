//! Descriptor-driven REST backend for manufacturing record tables.

pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod password;
pub mod response;
pub mod routes;
pub mod schema;
pub mod service;
pub mod settings;
pub mod sql;
pub mod state;
pub mod store;

pub use config::{load_model, resolve, ResolvedModel, ResolvedResource};
pub use error::{AppError, ConfigError, StoreError};
pub use routes::app;
pub use schema::{ensure_database_exists, ensure_tables};
pub use settings::Settings;
pub use state::AppState;
pub use store::{PgStore, Store};

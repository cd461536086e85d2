//! Resource services: validation, plain CRUD and the transactional batch writer.

mod batch;
mod crud;
pub mod messages;
mod validation;
pub use batch::{BatchWriter, Updated};
pub use crud::{Created, CrudService};
pub use validation::{is_truthy, RequestValidator};

//! HTTP handlers for resource CRUD.

pub mod resource;
#[cfg(test)]
mod testutils;

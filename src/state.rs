//! Shared application state for all routes.

use crate::config::{ResolvedModel, ResolvedResource};
use crate::store::Store;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub model: Arc<ResolvedModel>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, model: ResolvedModel) -> Self {
        AppState {
            store,
            model: Arc::new(model),
        }
    }

    /// State for the router of one resource.
    pub fn for_resource(&self, resource: &Arc<ResolvedResource>) -> ResourceState {
        ResourceState {
            store: Arc::clone(&self.store),
            resource: Arc::clone(resource),
        }
    }
}

/// Per-resource router state: the handlers never look the resource up by path.
#[derive(Clone)]
pub struct ResourceState {
    pub store: Arc<dyn Store>,
    pub resource: Arc<ResolvedResource>,
}

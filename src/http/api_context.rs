use crate::config::Config;
use crate::models::DynStore;
use crate::notify::DynNotifier;
use std::sync::Arc;

/// The state shared by every handler.
///
/// Everything in here is cheap to clone, which axum does once per request.
#[derive(Clone)]
pub struct ApiContext {
    pub config: Arc<Config>,
    pub store: DynStore,
    pub notifier: DynNotifier,
}

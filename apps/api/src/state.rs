use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use crate::documents::store::DocumentStore;
use crate::documents::storage::ObjectStorage;
use crate::jobs::queue::JobQueue;
use crate::jobs::store::JobStore;
use crate::retrieval::ContextRetriever;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub jobs: Arc<dyn JobStore>,
    pub documents: Arc<dyn DocumentStore>,
    pub queue: Arc<dyn JobQueue>,
    pub storage: ObjectStorage,
    pub retriever: ContextRetriever,
    /// Set by the evaluation worker while its consumer loop is alive.
    pub worker_running: Arc<AtomicBool>,
}

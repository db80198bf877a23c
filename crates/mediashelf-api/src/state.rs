//! Application state shared by every handler.

use crate::auth::JwtKeys;
use mediashelf_collections::{
    AccessGate, FileViewService, MediaContext, MediaStore, OwnerTypeRegistry, Reconciler,
    UrlResolver,
};
use mediashelf_core::{Actor, Config};
use mediashelf_storage::StorageGateway;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub gateway: Arc<StorageGateway>,
    pub store: Arc<dyn MediaStore>,
    pub owners: Arc<OwnerTypeRegistry>,
    pub gate: Arc<dyn AccessGate>,
    pub reconciler: Reconciler,
    pub views: FileViewService,
    pub urls: UrlResolver,
    pub jwt: Arc<JwtKeys>,
}

impl AppState {
    pub fn new(
        config: Config,
        gateway: StorageGateway,
        store: Arc<dyn MediaStore>,
        owners: OwnerTypeRegistry,
        gate: Arc<dyn AccessGate>,
    ) -> Self {
        let gateway = Arc::new(gateway);
        let owners = Arc::new(owners);
        let reconciler =
            Reconciler::new(store.clone(), gateway.clone(), gate.clone()).with_serialization();
        let views = FileViewService::new(store.clone(), owners.clone(), gateway.clone(), gate.clone());
        let urls = UrlResolver::from_config(&config, gateway.clone());
        let jwt = Arc::new(JwtKeys::new(config.jwt_secret()));

        Self {
            config,
            gateway,
            store,
            owners,
            gate,
            reconciler,
            views,
            urls,
            jwt,
        }
    }

    /// Request-scoped context for `actor`.
    pub fn media_context(&self, actor: Actor) -> MediaContext {
        MediaContext::from_config(&self.config, actor)
    }
}

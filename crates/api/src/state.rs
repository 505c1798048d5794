use std::sync::Arc;

use sobremesa_core::events::bus::EventBus;
use sobremesa_core::mutation::Committer;
use sobremesa_core::seo::jsonld::Site;
use sobremesa_core::{ContentClient, Store};

use crate::config::AppConfig;

/// Shared application state, passed to all handlers via Axum's `State` extractor.
/// Wrapped in `Arc` so cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<InnerState>,
}

struct InnerState {
    client: ContentClient,
    committer: Committer,
    config: AppConfig,
    event_bus: EventBus,
}

impl AppState {
    pub fn new(store: Store, config: AppConfig, event_bus: EventBus) -> Self {
        let committer = Committer::new(store.clone(), event_bus.clone(), config.dataset.clone());
        Self {
            inner: Arc::new(InnerState {
                client: ContentClient::new(store),
                committer,
                config,
                event_bus,
            }),
        }
    }

    pub fn client(&self) -> &ContentClient {
        &self.inner.client
    }

    pub fn store(&self) -> &Store {
        self.inner.client.store()
    }

    pub fn committer(&self) -> &Committer {
        &self.inner.committer
    }

    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.inner.event_bus
    }

    /// Site identity for JSON-LD builders.
    pub fn site(&self) -> Site<'_> {
        Site {
            base_url: &self.inner.config.public_base_url,
            name: &self.inner.config.site_name,
        }
    }
}

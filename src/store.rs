//! In-memory endpoint slots and the update cycle that refreshes them.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info, warn};
use ufm_streamer_adapters::ufm::UfmClient;
use ufm_streamer_adapters::AdapterError;
use ufm_streamer_types::{is_empty_value, EndpointKind, RefreshPolicy, SlotView};

use crate::cache::FileCache;

/// Something that can answer a GET for a UFM API path.
#[async_trait]
pub trait ApiSource: Send + Sync {
    async fn fetch(&self, path: &str) -> Result<Value, AdapterError>;
}

#[async_trait]
impl ApiSource for UfmClient {
    async fn fetch(&self, path: &str) -> Result<Value, AdapterError> {
        UfmClient::fetch(self, path).await
    }
}

/// Latest value per endpoint, backed by the file cache.
#[derive(Debug)]
pub struct ApiStore {
    slots: BTreeMap<EndpointKind, Value>,
    cache: FileCache,
}

impl ApiStore {
    /// Create a store with every slot empty.
    pub fn new(cache: FileCache) -> Self {
        Self {
            slots: BTreeMap::new(),
            cache,
        }
    }

    /// The current value of an endpoint's slot.
    pub fn get(&self, kind: EndpointKind) -> Option<&Value> {
        self.slots.get(&kind)
    }

    /// Whether an endpoint's slot holds nothing useful yet.
    pub fn is_empty_slot(&self, kind: EndpointKind) -> bool {
        self.slots.get(&kind).map_or(true, is_empty_value)
    }

    pub fn cache(&self) -> &FileCache {
        &self.cache
    }

    /// Run one update cycle against `source`.
    ///
    /// Endpoints are visited in fixed order. The first failure stops the
    /// cycle and is returned; slots refreshed before it keep their new
    /// values. Returns the endpoints that were fetched.
    pub async fn update<S>(&mut self, source: &S) -> Result<Vec<EndpointKind>, AdapterError>
    where
        S: ApiSource + ?Sized,
    {
        let mut fetched = Vec::with_capacity(EndpointKind::ALL.len());

        for kind in EndpointKind::ALL {
            let endpoint = kind.descriptor();
            if endpoint.refresh == RefreshPolicy::OncePerProcess && !self.is_empty_slot(kind) {
                debug!(endpoint = %kind, "already stored, skipping fetch");
                continue;
            }

            let value = match source.fetch(endpoint.path).await {
                Ok(value) => value,
                Err(e) => {
                    warn!(endpoint = %kind, path = endpoint.path, error = %e, "update cycle aborted");
                    return Err(e);
                }
            };

            if endpoint.persist {
                self.cache.save_endpoint(kind, &value);
            }
            self.slots.insert(kind, value);
            fetched.push(kind);
        }

        debug!(fetched = fetched.len(), "update cycle complete");
        Ok(fetched)
    }

    /// Fill empty slots from their cache files.
    ///
    /// Returns the number of slots that now hold a loaded value.
    pub fn load_from_cache(&mut self) -> usize {
        let mut loaded = 0;

        for kind in EndpointKind::ALL {
            if !self.is_empty_slot(kind) || !self.cache.contains(kind) {
                continue;
            }
            let value = self.cache.load_endpoint(kind);
            if is_empty_value(&value) {
                continue;
            }
            self.slots.insert(kind, value);
            loaded += 1;
        }

        if loaded > 0 {
            info!(loaded, dir = %self.cache.dir().display(), "warm cache loaded");
        }
        loaded
    }
}

impl SlotView for ApiStore {
    fn slot(&self, kind: EndpointKind) -> Option<&Value> {
        self.get(kind)
    }
}

use std::collections::HashMap;

use async_trait::async_trait;
use shared::protocol::ProfileSnapshot;
use tokio::sync::RwLock;
use tracing::debug;

use crate::ProfileCache;

/// Profile snapshots keyed by the actor string they were queried with
/// (a handle or a DID).
#[derive(Default)]
pub struct InMemoryProfileCache {
    entries: RwLock<HashMap<String, ProfileSnapshot>>,
}

impl InMemoryProfileCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, actor: &str) -> Option<ProfileSnapshot> {
        self.entries.read().await.get(actor).cloned()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl ProfileCache for InMemoryProfileCache {
    async fn overwrite(&self, actor: &str, snapshot: ProfileSnapshot) {
        debug!(actor, did = %snapshot.did, "cache: overwrite profile");
        self.entries
            .write()
            .await
            .insert(actor.to_string(), snapshot);
    }
}

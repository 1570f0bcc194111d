//! In-memory document store
//!
//! Backs tests and the demo binary. Documents live in a mutex'd map keyed
//! by collection path; every successful write or delete fans out a change
//! notification on a broadcast channel per collection.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::broadcast;

use super::{ChangeEvent, Document, DocumentStore, StoreError};

const FEED_CAPACITY: usize = 64;

#[derive(Default)]
pub struct MemoryStore {
    // collection path -> doc id -> fields; BTreeMap keeps reads deterministic
    collections: Mutex<HashMap<String, BTreeMap<String, Value>>>,
    feeds: Mutex<HashMap<String, broadcast::Sender<ChangeEvent>>>,
}

impl MemoryStore {
    pub fn new() -> Self { Self::default() }

    fn notify(&self, collection: &str) {
        let feeds = self.feeds.lock().expect("feed lock poisoned");
        if let Some(sender) = feeds.get(collection) {
            // A send error only means there are no live subscribers.
            let _ = sender.send(ChangeEvent { collection: collection.to_string() });
        }
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn read(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        let collections = self.collections.lock().expect("store lock poisoned");
        Ok(collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .map(|(id, fields)| Document { id: id.clone(), fields: fields.clone() })
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn write(&self, collection: &str, id: &str, fields: Value) -> Result<(), StoreError> {
        {
            let mut collections = self.collections.lock().expect("store lock poisoned");
            collections
                .entry(collection.to_string())
                .or_default()
                .insert(id.to_string(), fields);
        }
        self.notify(collection);
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        {
            let mut collections = self.collections.lock().expect("store lock poisoned");
            collections
                .get_mut(collection)
                .and_then(|docs| docs.remove(id))
                .ok_or_else(|| StoreError::Rejected(format!("no document {id} in {collection}")))?;
        }
        self.notify(collection);
        Ok(())
    }

    fn subscribe(&self, collection: &str) -> broadcast::Receiver<ChangeEvent> {
        let mut feeds = self.feeds.lock().expect("feed lock poisoned");
        feeds
            .entry(collection.to_string())
            .or_insert_with(|| broadcast::channel(FEED_CAPACITY).0)
            .subscribe()
    }
}

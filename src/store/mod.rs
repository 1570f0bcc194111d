//! Document store seam
//!
//! The engine is persistence-agnostic: it reads and writes collections of
//! JSON documents through this trait and observes changes through a
//! broadcast feed. Collections are namespaced per app and user session,
//! mirroring the `artifacts/<app>/users/<user>/<collection>` layout of the
//! hosted database the dashboard runs against.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::broadcast;

pub mod memory;

pub use memory::MemoryStore;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Collection {
    Items,
    Sales,
    Activities,
}

impl Collection {
    pub fn segment(&self) -> &'static str {
        match self {
            Self::Items => "items",
            Self::Sales => "sales",
            Self::Activities => "activities",
        }
    }
}

/// Tenant/session scope for all collections.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Namespace {
    app_id: String,
    user_id: String,
}

impl Namespace {
    pub fn new(app_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self { app_id: app_id.into(), user_id: user_id.into() }
    }

    pub fn user_id(&self) -> &str { &self.user_id }

    pub fn path(&self, collection: Collection) -> String {
        format!("artifacts/{}/users/{}/{}", self.app_id, self.user_id, collection.segment())
    }
}

#[derive(Clone, Debug)]
pub struct Document {
    pub id: String,
    pub fields: Value,
}

/// Notification that a collection changed. Consumers re-read the collection
/// and recompute derived state from the fresh snapshot; the event carries no
/// delta on purpose.
#[derive(Clone, Debug)]
pub struct ChangeEvent {
    pub collection: String,
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store rejected write: {0}")]
    Rejected(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn read(&self, collection: &str) -> Result<Vec<Document>, StoreError>;
    async fn write(&self, collection: &str, id: &str, fields: Value) -> Result<(), StoreError>;
    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError>;
    /// Subscribes to change notifications for a collection. Dropping the
    /// receiver unsubscribes.
    fn subscribe(&self, collection: &str) -> broadcast::Receiver<ChangeEvent>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespace_paths() {
        let ns = Namespace::new("parts-pos", "user-1");
        assert_eq!(ns.path(Collection::Items), "artifacts/parts-pos/users/user-1/items");
        assert_eq!(ns.path(Collection::Sales), "artifacts/parts-pos/users/user-1/sales");
        assert_eq!(
            ns.path(Collection::Activities),
            "artifacts/parts-pos/users/user-1/activities"
        );
    }
}

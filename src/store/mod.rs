//! Organization-scoped access to the remote document store.
//!
//! The calendar and the contacts table only see these traits; the
//! Firestore client and the in-memory store both implement all of them.

pub mod firestore;
pub mod memory;

use std::sync::Arc;

use async_trait::async_trait;
use color_eyre::eyre::Result;

use crate::config::{Backend, Config};
use crate::error::StoreResult;
use crate::model::{
    Contact, ContactPatch, Deal, Interaction, InteractionPatch, NewContact, NewInteraction, Task,
};

pub use firestore::FirestoreStore;
pub use memory::MemoryStore;

#[async_trait]
pub trait InteractionStore: Send + Sync {
    /// Persist a new interaction and return its id.
    async fn create_interaction(&self, new: NewInteraction) -> StoreResult<String>;

    async fn get_interaction(&self, id: &str) -> StoreResult<Interaction>;

    async fn interactions_by_org(&self, org_id: &str) -> StoreResult<Vec<Interaction>>;

    /// Write only the fields set in `patch`.
    async fn update_interaction(&self, id: &str, patch: InteractionPatch) -> StoreResult<()>;
}

#[async_trait]
pub trait ContactStore: Send + Sync {
    /// Returns `None` (or an empty id) when the store did not create the record.
    async fn create_contact(&self, org_id: &str, new: NewContact) -> StoreResult<Option<String>>;

    async fn get_contact(&self, id: &str) -> StoreResult<Contact>;

    async fn contacts_by_org(&self, org_id: &str) -> StoreResult<Vec<Contact>>;

    async fn update_contact(&self, id: &str, patch: ContactPatch) -> StoreResult<()>;

    async fn delete_contact(&self, id: &str) -> StoreResult<()>;
}

#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn tasks_by_org(&self, org_id: &str) -> StoreResult<Vec<Task>>;
}

#[async_trait]
pub trait DealStore: Send + Sync {
    async fn deals_by_org(&self, org_id: &str) -> StoreResult<Vec<Deal>>;
}

/// One handle per entity kind, shared by both screens.
#[derive(Clone)]
pub struct Stores {
    pub interactions: Arc<dyn InteractionStore>,
    pub contacts: Arc<dyn ContactStore>,
    pub tasks: Arc<dyn TaskStore>,
    pub deals: Arc<dyn DealStore>,
}

impl Stores {
    /// Use one backend for every entity kind.
    pub fn from_backend<S>(backend: Arc<S>) -> Self
    where
        S: InteractionStore + ContactStore + TaskStore + DealStore + 'static,
    {
        Self {
            interactions: backend.clone(),
            contacts: backend.clone(),
            tasks: backend.clone(),
            deals: backend,
        }
    }
}

pub fn connect(config: &Config) -> Result<Stores> {
    match config.backend {
        Backend::Firestore => {
            tracing::info!(
                project = %config.firestore.project_id,
                database = %config.firestore.database,
                "using firestore backend"
            );
            let store = FirestoreStore::new(&config.firestore)?;
            Ok(Stores::from_backend(Arc::new(store)))
        }
        Backend::Memory => {
            let store = match config.memory.fixture {
                Some(ref path) => MemoryStore::from_fixture(path)?,
                None => MemoryStore::new(),
            };
            tracing::info!("using in-memory backend");
            Ok(Stores::from_backend(Arc::new(store)))
        }
    }
}

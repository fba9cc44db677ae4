use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use color_eyre::eyre::{Result, WrapErr};
use serde::Deserialize;

use super::{ContactStore, DealStore, InteractionStore, TaskStore};
use crate::error::{StoreError, StoreResult};
use crate::model::{
    Contact, ContactPatch, Deal, Interaction, InteractionPatch, NewContact, NewInteraction, Task,
};

/// In-process document store. Records keep insertion order.
///
/// Besides local demos it backs the controller tests, so it can be told to
/// fail writes or to hand back no id from `create_contact`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

#[derive(Debug, Default)]
struct State {
    interactions: Vec<Interaction>,
    contacts: Vec<Contact>,
    tasks: Vec<Task>,
    deals: Vec<Deal>,
    next_id: u64,
    fail_writes: bool,
    withhold_contact_ids: bool,
    interaction_patches: Vec<(String, InteractionPatch)>,
}

impl State {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}-{:04}", prefix, self.next_id)
    }

    fn check_write(&self) -> StoreResult<()> {
        if self.fail_writes {
            Err(StoreError::Other("memory store is failing writes".to_string()))
        } else {
            Ok(())
        }
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_fixture(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("reading fixture {}", path.display()))?;
        let fixture: Fixture = toml::from_str(&content)
            .wrap_err_with(|| format!("parsing fixture {}", path.display()))?;
        Ok(fixture.into_store())
    }

    fn state(&self) -> MutexGuard<'_, State> {
        // A panic while holding the lock leaves plain data behind; keep going.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn insert_interaction(&self, interaction: Interaction) {
        self.state().interactions.push(interaction);
    }

    pub fn insert_contact(&self, contact: Contact) {
        self.state().contacts.push(contact);
    }

    pub fn insert_task(&self, task: Task) {
        self.state().tasks.push(task);
    }

    pub fn insert_deal(&self, deal: Deal) {
        self.state().deals.push(deal);
    }
}

#[cfg(test)]
impl MemoryStore {
    /// Make every create/update/delete return an error.
    pub fn fail_writes(&self, fail: bool) {
        self.state().fail_writes = fail;
    }

    /// Make `create_contact` succeed without returning an id.
    pub fn withhold_contact_ids(&self, withhold: bool) {
        self.state().withhold_contact_ids = withhold;
    }

    /// Every interaction patch received, in call order.
    pub fn interaction_patches(&self) -> Vec<(String, InteractionPatch)> {
        self.state().interaction_patches.clone()
    }

    pub fn interaction_count(&self) -> usize {
        self.state().interactions.len()
    }

    pub fn contact_count(&self) -> usize {
        self.state().contacts.len()
    }
}

#[async_trait]
impl InteractionStore for MemoryStore {
    async fn create_interaction(&self, new: NewInteraction) -> StoreResult<String> {
        let mut state = self.state();
        state.check_write()?;
        let id = state.next_id("interaction");
        state.interactions.push(new.with_id(id.clone()));
        Ok(id)
    }

    async fn get_interaction(&self, id: &str) -> StoreResult<Interaction> {
        self.state()
            .interactions
            .iter()
            .find(|i| i.id == id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("interactions", id))
    }

    async fn interactions_by_org(&self, org_id: &str) -> StoreResult<Vec<Interaction>> {
        Ok(self
            .state()
            .interactions
            .iter()
            .filter(|i| i.org_id == org_id)
            .cloned()
            .collect())
    }

    async fn update_interaction(&self, id: &str, patch: InteractionPatch) -> StoreResult<()> {
        let mut state = self.state();
        state.check_write()?;
        state.interaction_patches.push((id.to_string(), patch.clone()));
        let interaction = state
            .interactions
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or_else(|| StoreError::not_found("interactions", id))?;
        patch.apply_to(interaction);
        Ok(())
    }
}

#[async_trait]
impl ContactStore for MemoryStore {
    async fn create_contact(&self, org_id: &str, new: NewContact) -> StoreResult<Option<String>> {
        let mut state = self.state();
        state.check_write()?;
        if state.withhold_contact_ids {
            return Ok(None);
        }
        let id = state.next_id("contact");
        state
            .contacts
            .push(new.into_contact(id.clone(), org_id.to_string()));
        Ok(Some(id))
    }

    async fn get_contact(&self, id: &str) -> StoreResult<Contact> {
        self.state()
            .contacts
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("contacts", id))
    }

    async fn contacts_by_org(&self, org_id: &str) -> StoreResult<Vec<Contact>> {
        Ok(self
            .state()
            .contacts
            .iter()
            .filter(|c| c.org_id == org_id)
            .cloned()
            .collect())
    }

    async fn update_contact(&self, id: &str, patch: ContactPatch) -> StoreResult<()> {
        let mut state = self.state();
        state.check_write()?;
        let contact = state
            .contacts
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| StoreError::not_found("contacts", id))?;
        patch.apply_to(contact);
        Ok(())
    }

    async fn delete_contact(&self, id: &str) -> StoreResult<()> {
        let mut state = self.state();
        state.check_write()?;
        let before = state.contacts.len();
        state.contacts.retain(|c| c.id != id);
        if state.contacts.len() == before {
            return Err(StoreError::not_found("contacts", id));
        }
        Ok(())
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn tasks_by_org(&self, org_id: &str) -> StoreResult<Vec<Task>> {
        Ok(self
            .state()
            .tasks
            .iter()
            .filter(|t| t.org_id == org_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl DealStore for MemoryStore {
    async fn deals_by_org(&self, org_id: &str) -> StoreResult<Vec<Deal>> {
        Ok(self
            .state()
            .deals
            .iter()
            .filter(|d| d.org_id == org_id)
            .cloned()
            .collect())
    }
}

// ── TOML fixture types ──

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct Fixture {
    interactions: Vec<InteractionFixture>,
    contacts: Vec<ContactFixture>,
    tasks: Vec<NamedFixture>,
    deals: Vec<NamedFixture>,
}

#[derive(Debug, Deserialize)]
struct InteractionFixture {
    id: String,
    org: String,
    #[serde(default)]
    contact: String,
    #[serde(default)]
    owner: String,
    #[serde(default)]
    deal: String,
    #[serde(default)]
    task: String,
    start: DateTime<Utc>,
    end: Option<DateTime<Utc>>,
    #[serde(default, rename = "type")]
    kind: String,
    #[serde(default)]
    notes: String,
    #[serde(default)]
    name: String,
    #[serde(default = "default_remind_me")]
    remind_me: bool,
    #[serde(default)]
    participants: Vec<String>,
}

fn default_remind_me() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct ContactFixture {
    id: String,
    org: String,
    name: String,
    #[serde(default)]
    company: String,
    #[serde(default)]
    position: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    phone: String,
    #[serde(default)]
    notes: String,
}

#[derive(Debug, Deserialize)]
struct NamedFixture {
    id: String,
    org: String,
    name: String,
}

impl Fixture {
    fn into_store(self) -> MemoryStore {
        let store = MemoryStore::new();
        for i in self.interactions {
            store.insert_interaction(Interaction {
                id: i.id,
                org_id: i.org,
                contact_id: i.contact,
                owner_id: i.owner,
                deal_id: i.deal,
                task_id: i.task,
                start: i.start,
                end: i.end,
                kind: i.kind,
                notes: i.notes,
                title: i.name,
                remind_me: i.remind_me,
                participants: i.participants,
            });
        }
        for c in self.contacts {
            store.insert_contact(Contact {
                id: c.id,
                org_id: c.org,
                name: c.name,
                company: c.company,
                position: c.position,
                email: c.email,
                phone: c.phone,
                notes: c.notes,
            });
        }
        for t in self.tasks {
            store.insert_task(Task {
                id: t.id,
                org_id: t.org,
                name: t.name,
            });
        }
        for d in self.deals {
            store.insert_deal(Deal {
                id: d.id,
                org_id: d.org,
                name: d.name,
            });
        }
        store
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixture_seeds_every_collection() {
        let fixture: Fixture = toml::from_str(
            r#"
            [[interactions]]
            id = "i1"
            org = "acme"
            contact = "c1"
            start = "2024-01-10T09:00:00Z"
            end = "2024-01-10T10:00:00Z"
            type = "Call"

            [[contacts]]
            id = "c1"
            org = "acme"
            name = "Grace Hopper"

            [[deals]]
            id = "d1"
            org = "acme"
            name = "Renewal"
            "#,
        )
        .unwrap();
        let store = fixture.into_store();
        assert_eq!(store.interaction_count(), 1);
        assert_eq!(store.contact_count(), 1);

        let state = store.state();
        assert!(state.interactions[0].remind_me);
        assert_eq!(state.interactions[0].kind, "Call");
        assert_eq!(state.deals[0].name, "Renewal");
    }

    #[tokio::test]
    async fn withheld_contact_id_creates_nothing() {
        let store = MemoryStore::new();
        store.withhold_contact_ids(true);
        let id = store
            .create_contact("acme", NewContact::default())
            .await
            .unwrap();
        assert_eq!(id, None);
        assert_eq!(store.contact_count(), 0);
    }

    #[tokio::test]
    async fn failing_writes_leave_records_untouched() {
        let store = MemoryStore::new();
        store.insert_contact(Contact {
            id: "c1".into(),
            org_id: "acme".into(),
            ..Default::default()
        });
        store.fail_writes(true);
        assert!(store.delete_contact("c1").await.is_err());
        assert_eq!(store.contact_count(), 1);
    }
}

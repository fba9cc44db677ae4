//! Contacts table state.
//!
//! The local list is loaded once and then edited in place; it is never
//! re-fetched after a mutation. Row add and row delete wait a fixed delay
//! before calling the store. Rows are always addressed by record id.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt};
use tracing::{debug, info, warn};

use crate::error::StoreResult;
use crate::model::{Contact, ContactPatch, NewContact};
use crate::notify::Notification;
use crate::store::ContactStore;

#[derive(Debug)]
pub enum ContactsUpdate {
    Loaded(StoreResult<Vec<Contact>>),
    Added {
        ticket: u64,
        record: NewContact,
        result: StoreResult<Option<String>>,
    },
    Deleted {
        id: String,
        result: StoreResult<()>,
    },
    Edited {
        id: String,
        patch: ContactPatch,
        result: StoreResult<()>,
    },
}

/// A row added in the table that the store has not confirmed yet.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingRow {
    pub ticket: u64,
    pub record: NewContact,
}

pub struct ContactsController {
    org_id: String,
    store: Arc<dyn ContactStore>,
    delay: Duration,
    contacts: Vec<Contact>,
    pending_adds: Vec<PendingRow>,
    pending_deletes: HashSet<String>,
    next_ticket: u64,
    filter: String,
}

impl ContactsController {
    pub fn new(org_id: impl Into<String>, store: Arc<dyn ContactStore>, delay: Duration) -> Self {
        Self {
            org_id: org_id.into(),
            store,
            delay,
            contacts: Vec::new(),
            pending_adds: Vec::new(),
            pending_deletes: HashSet::new(),
            next_ticket: 0,
            filter: String::new(),
        }
    }

    pub fn contacts(&self) -> &[Contact] {
        &self.contacts
    }

    pub fn pending_adds(&self) -> &[PendingRow] {
        &self.pending_adds
    }

    pub fn is_deleting(&self, id: &str) -> bool {
        self.pending_deletes.contains(id)
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    pub fn set_filter(&mut self, filter: impl Into<String>) {
        self.filter = filter.into();
    }

    /// Rows matching the current filter, in list order.
    pub fn visible(&self) -> Vec<&Contact> {
        self.contacts
            .iter()
            .filter(|c| c.matches(&self.filter))
            .collect()
    }

    pub fn get(&self, id: &str) -> Option<&Contact> {
        self.contacts.iter().find(|c| c.id == id)
    }

    pub fn begin_load(&self) -> BoxFuture<'static, ContactsUpdate> {
        let store = self.store.clone();
        let org_id = self.org_id.clone();
        async move { ContactsUpdate::Loaded(store.contacts_by_org(&org_id).await) }.boxed()
    }

    /// Queue a new row; the store is called once the delay has passed.
    pub fn begin_add(&mut self, record: NewContact) -> BoxFuture<'static, ContactsUpdate> {
        self.next_ticket += 1;
        let ticket = self.next_ticket;
        self.pending_adds.push(PendingRow {
            ticket,
            record: record.clone(),
        });

        let store = self.store.clone();
        let org_id = self.org_id.clone();
        let delay = self.delay;
        async move {
            tokio::time::sleep(delay).await;
            let result = store.create_contact(&org_id, record.clone()).await;
            ContactsUpdate::Added {
                ticket,
                record,
                result,
            }
        }
        .boxed()
    }

    /// Queue removal of the row with `id`. `None` if there is no such row or
    /// it is already being deleted.
    pub fn begin_delete(&mut self, id: &str) -> Option<BoxFuture<'static, ContactsUpdate>> {
        if self.get(id).is_none() || !self.pending_deletes.insert(id.to_string()) {
            return None;
        }
        let store = self.store.clone();
        let id = id.to_string();
        let delay = self.delay;
        Some(
            async move {
                tokio::time::sleep(delay).await;
                let result = store.delete_contact(&id).await;
                ContactsUpdate::Deleted { id, result }
            }
            .boxed(),
        )
    }

    /// Persist the edit popup's changes.
    pub fn begin_edit(&self, id: &str, patch: ContactPatch) -> BoxFuture<'static, ContactsUpdate> {
        let store = self.store.clone();
        let id = id.to_string();
        async move {
            let result = if patch.is_empty() {
                Ok(())
            } else {
                store.update_contact(&id, patch.clone()).await
            };
            ContactsUpdate::Edited { id, patch, result }
        }
        .boxed()
    }

    pub fn apply(&mut self, update: ContactsUpdate) -> Option<Notification> {
        match update {
            ContactsUpdate::Loaded(Ok(contacts)) => {
                info!(count = contacts.len(), "contacts loaded");
                self.contacts = contacts;
                None
            }
            ContactsUpdate::Loaded(Err(e)) => {
                warn!(error = %e, "loading contacts");
                Some(Notification::error(format!("Could not load contacts: {e}")))
            }
            ContactsUpdate::Added {
                ticket,
                record,
                result,
            } => {
                self.pending_adds.retain(|p| p.ticket != ticket);
                match result {
                    Ok(Some(id)) if !id.is_empty() => {
                        info!(%id, "contact added");
                        self.contacts
                            .push(record.into_contact(id, self.org_id.clone()));
                        Some(Notification::success("New Contact Added"))
                    }
                    Ok(_) => {
                        debug!("store returned no id, row rejected");
                        None
                    }
                    Err(e) => {
                        warn!(error = %e, "adding contact");
                        Some(Notification::error(format!("Could not add contact: {e}")))
                    }
                }
            }
            ContactsUpdate::Deleted { id, result } => {
                self.pending_deletes.remove(&id);
                match result {
                    Ok(()) => {
                        if let Some(idx) = self.contacts.iter().position(|c| c.id == id) {
                            self.contacts.remove(idx);
                        }
                        info!(%id, "contact deleted");
                        Some(Notification::success("Contact Successfully Deleted"))
                    }
                    Err(e) => {
                        warn!(%id, error = %e, "deleting contact");
                        Some(Notification::error(format!("Could not delete contact: {e}")))
                    }
                }
            }
            ContactsUpdate::Edited { id, patch, result } => match result {
                Ok(()) => {
                    if let Some(contact) = self.contacts.iter_mut().find(|c| c.id == id) {
                        patch.apply_to(contact);
                    }
                    Some(Notification::success("Contact Successfully Updated"))
                }
                Err(e) => {
                    warn!(%id, error = %e, "updating contact");
                    Some(Notification::error(format!("Could not update contact: {e}")))
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::Level;
    use crate::store::MemoryStore;
    use pretty_assertions::assert_eq;

    const ORG: &str = "acme";

    fn contact(id: &str, name: &str) -> Contact {
        Contact {
            id: id.into(),
            org_id: ORG.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    fn row(name: &str) -> NewContact {
        NewContact {
            name: name.into(),
            company: "Navy".into(),
            email: "grace@example.com".into(),
            ..Default::default()
        }
    }

    async fn loaded(store: &Arc<MemoryStore>) -> ContactsController {
        let mut ctl = ContactsController::new(ORG, store.clone(), Duration::ZERO);
        let update = ctl.begin_load().await;
        ctl.apply(update);
        ctl
    }

    fn seeded() -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        store.insert_contact(contact("c1", "Ada Lovelace"));
        store.insert_contact(contact("c2", "Charles Babbage"));
        store.insert_contact(contact("x1", "Elsewhere"));
        store
    }

    #[tokio::test]
    async fn add_with_id_appends_submitted_fields() {
        let store = seeded();
        let mut ctl = loaded(&store).await;
        assert_eq!(ctl.contacts().len(), 3);

        let pending = ctl.begin_add(row("Grace Hopper"));
        assert_eq!(ctl.pending_adds().len(), 1);
        let update = pending.await;
        let note = ctl.apply(update);

        assert_eq!(note, Some(Notification::success("New Contact Added")));
        assert!(ctl.pending_adds().is_empty());
        assert_eq!(ctl.contacts().len(), 4);
        let added = ctl.contacts().last().unwrap();
        assert_eq!(added.name, "Grace Hopper");
        assert_eq!(added.company, "Navy");
        assert_eq!(added.email, "grace@example.com");
        assert!(!added.id.is_empty());
    }

    #[tokio::test]
    async fn add_without_id_is_rejected_silently() {
        let store = seeded();
        let mut ctl = loaded(&store).await;
        store.withhold_contact_ids(true);

        let update = ctl.begin_add(row("Grace Hopper")).await;
        assert_eq!(ctl.apply(update), None);
        assert_eq!(ctl.contacts().len(), 3);
        assert!(ctl.pending_adds().is_empty());
    }

    #[tokio::test]
    async fn add_waits_for_the_row_delay() {
        let store = seeded();
        let mut ctl = ContactsController::new(ORG, store.clone(), Duration::from_millis(30));
        let started = std::time::Instant::now();
        let update = ctl.begin_add(row("Grace")).await;
        assert!(started.elapsed() >= Duration::from_millis(30));
        ctl.apply(update);
        assert_eq!(store.contact_count(), 4);
    }

    #[tokio::test]
    async fn delete_goes_by_id_not_position() {
        let store = seeded();
        let mut ctl = loaded(&store).await;
        ctl.set_filter("babbage");
        assert_eq!(ctl.visible().len(), 1);

        let pending = ctl.begin_delete("c2").unwrap();
        assert!(ctl.is_deleting("c2"));
        assert!(ctl.begin_delete("c2").is_none());
        let update = pending.await;
        let note = ctl.apply(update);

        assert_eq!(note, Some(Notification::success("Contact Successfully Deleted")));
        let names: Vec<&str> = ctl.contacts().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Ada Lovelace", "Elsewhere"]);
        assert_eq!(store.contact_count(), 2);
        assert!(!ctl.is_deleting("c2"));
    }

    #[tokio::test]
    async fn failed_delete_keeps_the_row() {
        let store = seeded();
        let mut ctl = loaded(&store).await;
        store.fail_writes(true);

        let update = ctl.begin_delete("c1").unwrap().await;
        let note = ctl.apply(update).unwrap();
        assert_eq!(note.level, Level::Error);
        assert_eq!(ctl.contacts().len(), 3);
        assert!(!ctl.is_deleting("c1"));
    }

    #[tokio::test]
    async fn unknown_row_cannot_be_deleted() {
        let store = seeded();
        let mut ctl = loaded(&store).await;
        assert!(ctl.begin_delete("nope").is_none());
    }

    #[tokio::test]
    async fn edit_updates_the_local_row() {
        let store = seeded();
        let mut ctl = loaded(&store).await;
        let original = ctl.get("c1").unwrap().clone();
        let mut edited = original.clone();
        edited.position = "Analyst".into();

        let update = ctl
            .begin_edit("c1", ContactPatch::diff(&original, &edited))
            .await;
        assert!(ctl.apply(update).is_some());
        assert_eq!(ctl.get("c1").unwrap(), &edited);
        assert_eq!(
            crate::store::ContactStore::get_contact(&*store, "c1")
                .await
                .unwrap()
                .position,
            "Analyst"
        );
    }
}

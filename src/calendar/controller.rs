//! Keeps the calendar's events in line with the organization's interactions.
//!
//! Every operation changes the projection cache synchronously where the
//! gesture demands it and hands back a future for the remote side. The
//! future resolves to a [`CalendarUpdate`] that the UI thread feeds into
//! [`CalendarController::apply`]. A failed remote call undoes the local
//! change and produces an error notification.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Local, NaiveDate, Utc};
use futures::future::{join_all, BoxFuture, FutureExt};
use tracing::{debug, info, warn};

use super::{time, CalendarEvent, ProjectionCache};
use crate::error::{FormError, StoreResult};
use crate::model::{
    options, Interaction, InteractionPatch, LabeledOption, Lifecycle, NewInteraction,
};
use crate::notify::Notification;
use crate::store::Stores;

/// Autocomplete sources for the interaction forms.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PickerOptions {
    pub contacts: Vec<LabeledOption>,
    pub deals: Vec<LabeledOption>,
    pub tasks: Vec<LabeledOption>,
}

/// Start and end of an event, as displayed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Schedule {
    pub start: DateTime<Local>,
    pub end: Option<DateTime<Local>>,
}

/// What the creation form submits.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventDraft {
    pub title: String,
    pub date: Option<NaiveDate>,
    pub start_time: String,
    pub end_time: String,
    pub all_day: bool,
    pub contact_id: String,
    pub deal_id: String,
    pub task_id: String,
    pub kind: String,
    pub notes: String,
}

/// Outcome of a remote call started by the controller.
#[derive(Debug)]
pub enum CalendarUpdate {
    Loaded(StoreResult<Vec<CalendarEvent>>),
    OptionsLoaded(PickerOptions),
    Created(StoreResult<CalendarEvent>),
    Moved {
        id: String,
        generation: u64,
        target: Schedule,
        result: StoreResult<()>,
    },
    Dismissed {
        position: usize,
        event: CalendarEvent,
        result: StoreResult<()>,
    },
    EditReady(StoreResult<Interaction>),
    /// The edit popup saved; `None` when the interaction is no longer active.
    Refreshed {
        id: String,
        result: StoreResult<Option<CalendarEvent>>,
    },
}

/// Moves of one event that the store has not answered yet.
#[derive(Debug)]
struct PendingMoves {
    latest: u64,
    in_flight: usize,
    /// Times the store is known to hold.
    settled: Schedule,
    settled_generation: u64,
    latest_failed: bool,
}

pub struct CalendarController {
    org_id: String,
    user_id: String,
    stores: Stores,
    events: ProjectionCache,
    options: PickerOptions,
    moves: HashMap<String, PendingMoves>,
    next_move: u64,
}

impl CalendarController {
    pub fn new(org_id: impl Into<String>, user_id: impl Into<String>, stores: Stores) -> Self {
        Self {
            org_id: org_id.into(),
            user_id: user_id.into(),
            stores,
            events: ProjectionCache::new(),
            options: PickerOptions::default(),
            moves: HashMap::new(),
            next_move: 0,
        }
    }

    pub fn events(&self) -> &ProjectionCache {
        &self.events
    }

    pub fn options(&self) -> &PickerOptions {
        &self.options
    }

    /// Replace the contact picker source after the contact list changed.
    pub fn set_contact_options(&mut self, contacts: Vec<LabeledOption>) {
        debug!(contacts = contacts.len(), "contact options refreshed");
        self.options.contacts = contacts;
    }

    /// Drop every displayed event and fetch the organization's interactions.
    pub fn begin_load(&mut self) -> BoxFuture<'static, CalendarUpdate> {
        self.events.clear();
        self.moves.clear();
        let stores = self.stores.clone();
        let org_id = self.org_id.clone();
        async move { CalendarUpdate::Loaded(fetch_projection(&stores, &org_id).await) }.boxed()
    }

    /// Fetch contacts, deals and tasks for the form pickers. A failing
    /// source leaves its list empty.
    pub fn load_options(&self) -> BoxFuture<'static, CalendarUpdate> {
        let stores = self.stores.clone();
        let org_id = self.org_id.clone();
        async move {
            let (contacts, deals, tasks) = futures::join!(
                stores.contacts.contacts_by_org(&org_id),
                stores.deals.deals_by_org(&org_id),
                stores.tasks.tasks_by_org(&org_id),
            );
            let contacts = contacts
                .map(|c| options(&c))
                .unwrap_or_else(|e| {
                    warn!(error = %e, "loading contacts for autocomplete");
                    Vec::new()
                });
            let deals = deals.map(|d| options(&d)).unwrap_or_else(|e| {
                warn!(error = %e, "loading deals for autocomplete");
                Vec::new()
            });
            let tasks = tasks.map(|t| options(&t)).unwrap_or_else(|e| {
                warn!(error = %e, "loading tasks for autocomplete");
                Vec::new()
            });
            CalendarUpdate::OptionsLoaded(PickerOptions {
                contacts,
                deals,
                tasks,
            })
        }
        .boxed()
    }

    /// Validate the draft and persist it as a new active interaction owned
    /// by the current user. The event is shown once the store answers.
    pub fn begin_create(
        &self,
        draft: EventDraft,
    ) -> Result<BoxFuture<'static, CalendarUpdate>, FormError> {
        let date = draft
            .date
            .ok_or_else(|| FormError::InvalidDate(String::new()))?;
        let (start, end) = time::schedule(date, &draft.start_time, &draft.end_time, draft.all_day)?;

        let new = NewInteraction {
            org_id: self.org_id.clone(),
            contact_id: draft.contact_id,
            owner_id: self.user_id.clone(),
            deal_id: draft.deal_id,
            task_id: draft.task_id,
            start: start.with_timezone(&Utc),
            end: end.map(|e| e.with_timezone(&Utc)),
            kind: draft.kind,
            notes: draft.notes,
            title: draft.title,
            remind_me: true,
            participants: vec![self.user_id.clone()],
        };
        let contact_name = label_of(&self.options.contacts, &new.contact_id);
        let stores = self.stores.clone();

        Ok(async move {
            let result = stores
                .interactions
                .create_interaction(new.clone())
                .await
                .map(|id| CalendarEvent::project(&new.with_id(id), contact_name.as_deref()));
            CalendarUpdate::Created(result)
        }
        .boxed())
    }

    /// Show the event at its new times right away and write only start and
    /// end to the store. Several moves of one event may be in flight; the
    /// display falls back to what the store holds once the latest one fails.
    pub fn begin_move(
        &mut self,
        id: &str,
        start: DateTime<Local>,
        end: Option<DateTime<Local>>,
    ) -> Option<BoxFuture<'static, CalendarUpdate>> {
        let event = self.events.get_mut(id)?;
        let previous = Schedule {
            start: event.start,
            end: event.end,
        };
        if previous.start == start && previous.end == end {
            return None;
        }
        event.start = start;
        event.end = end;
        let target = Schedule { start, end };

        self.next_move += 1;
        let generation = self.next_move;
        let pending = self
            .moves
            .entry(id.to_string())
            .or_insert_with(|| PendingMoves {
                latest: 0,
                in_flight: 0,
                settled: previous,
                settled_generation: 0,
                latest_failed: false,
            });
        pending.latest = generation;
        pending.in_flight += 1;
        pending.latest_failed = false;

        let stores = self.stores.clone();
        let id = id.to_string();
        let patch = InteractionPatch::reschedule(
            start.with_timezone(&Utc),
            end.map(|e| e.with_timezone(&Utc)),
        );
        Some(
            async move {
                let result = stores.interactions.update_interaction(&id, patch).await;
                CalendarUpdate::Moved {
                    id,
                    generation,
                    target,
                    result,
                }
            }
            .boxed(),
        )
    }

    /// Drag the whole event by `delta`.
    pub fn begin_shift(
        &mut self,
        id: &str,
        delta: Duration,
    ) -> Option<BoxFuture<'static, CalendarUpdate>> {
        let event = self.events.get(id)?;
        let start = event.start + delta;
        let end = event.end.map(|e| e + delta);
        self.begin_move(id, start, end)
    }

    /// Drag the end of a timed event by `delta`; it never ends before it
    /// starts. All-day events have no end to drag.
    pub fn begin_resize(
        &mut self,
        id: &str,
        delta: Duration,
    ) -> Option<BoxFuture<'static, CalendarUpdate>> {
        let event = self.events.get(id)?;
        let end = event.end? + delta;
        if end < event.start {
            return None;
        }
        let start = event.start;
        self.begin_move(id, start, Some(end))
    }

    /// Take the event off the calendar now and dismiss the interaction
    /// remotely. The record itself is kept.
    pub fn begin_dismiss(&mut self, id: &str) -> Option<BoxFuture<'static, CalendarUpdate>> {
        let (position, event) = self.events.remove(id)?;
        let stores = self.stores.clone();
        Some(
            async move {
                let result = stores
                    .interactions
                    .update_interaction(&event.id, InteractionPatch::dismiss())
                    .await;
                CalendarUpdate::Dismissed {
                    position,
                    event,
                    result,
                }
            }
            .boxed(),
        )
    }

    /// Fetch the full interaction for the edit popup.
    pub fn begin_edit(&self, id: &str) -> BoxFuture<'static, CalendarUpdate> {
        let stores = self.stores.clone();
        let id = id.to_string();
        async move { CalendarUpdate::EditReady(stores.interactions.get_interaction(&id).await) }
            .boxed()
    }

    /// Save the edit popup, then refresh that single event from the store.
    pub fn begin_update(
        &self,
        id: &str,
        patch: InteractionPatch,
    ) -> BoxFuture<'static, CalendarUpdate> {
        let stores = self.stores.clone();
        let id = id.to_string();
        async move {
            let result: StoreResult<Option<CalendarEvent>> = async {
                stores.interactions.update_interaction(&id, patch).await?;
                let interaction = stores.interactions.get_interaction(&id).await?;
                if interaction.lifecycle() != Lifecycle::Active {
                    return Ok(None);
                }
                let contact = resolve_contact(&stores, &interaction.contact_id).await;
                Ok(Some(CalendarEvent::project(&interaction, contact.as_deref())))
            }
            .await;
            CalendarUpdate::Refreshed { id, result }
        }
        .boxed()
    }

    /// Fold a finished remote call back into the displayed events.
    pub fn apply(&mut self, update: CalendarUpdate) -> Option<Notification> {
        match update {
            CalendarUpdate::Loaded(Ok(events)) => {
                info!(count = events.len(), "calendar loaded");
                for event in events {
                    self.events.upsert(event);
                }
                None
            }
            CalendarUpdate::Loaded(Err(e)) => {
                warn!(error = %e, "loading interactions");
                Some(Notification::error(format!("Could not load interactions: {e}")))
            }
            CalendarUpdate::OptionsLoaded(options) => {
                debug!(
                    contacts = options.contacts.len(),
                    deals = options.deals.len(),
                    tasks = options.tasks.len(),
                    "autocomplete options loaded"
                );
                self.options = options;
                None
            }
            CalendarUpdate::Created(Ok(event)) => {
                info!(id = %event.id, "interaction created");
                self.events.upsert(event);
                Some(Notification::success("Interaction Successfully Added"))
            }
            CalendarUpdate::Created(Err(e)) => {
                warn!(error = %e, "creating interaction");
                Some(Notification::error(format!("Could not add interaction: {e}")))
            }
            CalendarUpdate::Moved {
                id,
                generation,
                target,
                result,
            } => {
                let notification = match &result {
                    Ok(()) => {
                        debug!(%id, generation, "interaction rescheduled");
                        None
                    }
                    Err(e) => {
                        warn!(%id, generation, error = %e, "rescheduling interaction");
                        Some(Notification::error(format!("Could not move event: {e}")))
                    }
                };
                if let Some(settled) = self.settle_move(&id, generation, target, result.is_ok()) {
                    if let Some(event) = self.events.get_mut(&id) {
                        debug!(%id, "reverting event to stored times");
                        event.start = settled.start;
                        event.end = settled.end;
                    }
                }
                notification
            }
            CalendarUpdate::Dismissed { result: Ok(()), event, .. } => {
                info!(id = %event.id, "interaction dismissed");
                None
            }
            CalendarUpdate::Dismissed {
                position,
                event,
                result: Err(e),
            } => {
                warn!(id = %event.id, error = %e, "dismissing interaction, restoring event");
                self.events.restore(position, event);
                Some(Notification::error(format!("Could not delete event: {e}")))
            }
            // Opening the popup is the caller's business.
            CalendarUpdate::EditReady(_) => None,
            CalendarUpdate::Refreshed { id, result: Ok(event) } => {
                self.events.remove(&id);
                if let Some(event) = event {
                    self.events.upsert(event);
                }
                Some(Notification::success("Interaction Successfully Updated"))
            }
            CalendarUpdate::Refreshed { id, result: Err(e) } => {
                warn!(%id, error = %e, "updating interaction");
                Some(Notification::error(format!("Could not update interaction: {e}")))
            }
        }
    }
}

impl CalendarController {
    /// Record the outcome of one move. Returns the times to show when the
    /// latest move of the event has failed.
    fn settle_move(
        &mut self,
        id: &str,
        generation: u64,
        target: Schedule,
        accepted: bool,
    ) -> Option<Schedule> {
        let pending = self.moves.get_mut(id)?;
        pending.in_flight = pending.in_flight.saturating_sub(1);
        if accepted && generation > pending.settled_generation {
            pending.settled = target;
            pending.settled_generation = generation;
        }
        if !accepted && generation == pending.latest {
            pending.latest_failed = true;
        }
        let revert = pending.latest_failed.then_some(pending.settled);
        if pending.in_flight == 0 {
            self.moves.remove(id);
        }
        revert
    }
}

fn label_of(options: &[LabeledOption], id: &str) -> Option<String> {
    options
        .iter()
        .find(|o| o.id == id)
        .map(|o| o.label.clone())
}

async fn resolve_contact(stores: &Stores, contact_id: &str) -> Option<String> {
    if contact_id.is_empty() {
        return None;
    }
    match stores.contacts.get_contact(contact_id).await {
        Ok(contact) => Some(contact.name),
        Err(e) => {
            warn!(contact = contact_id, error = %e, "resolving contact for event title");
            None
        }
    }
}

/// Active interactions of `org_id` as events, in fetch order. Each distinct
/// contact is looked up once.
async fn fetch_projection(stores: &Stores, org_id: &str) -> StoreResult<Vec<CalendarEvent>> {
    let active: Vec<Interaction> = stores
        .interactions
        .interactions_by_org(org_id)
        .await?
        .into_iter()
        .filter(|i| i.lifecycle() == Lifecycle::Active)
        .collect();

    let mut contact_ids: Vec<&str> = active.iter().map(|i| i.contact_id.as_str()).collect();
    contact_ids.sort_unstable();
    contact_ids.dedup();

    let names = join_all(
        contact_ids
            .iter()
            .map(|id| async move { (*id, resolve_contact(stores, id).await) }),
    )
    .await;
    let names: HashMap<&str, Option<String>> = names.into_iter().collect();

    Ok(active
        .iter()
        .map(|i| {
            let name = names.get(i.contact_id.as_str()).cloned().flatten();
            CalendarEvent::project(i, name.as_deref())
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Contact;
    use crate::store::{InteractionStore, MemoryStore};
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    const ORG: &str = "acme";
    const USER: &str = "u1";

    fn jan10() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 10).unwrap()
    }

    fn seeded() -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        store.insert_contact(Contact {
            id: "c1".into(),
            org_id: ORG.into(),
            name: "Grace Hopper".into(),
            ..Default::default()
        });
        let start = Local
            .with_ymd_and_hms(2024, 1, 10, 9, 0, 0)
            .unwrap()
            .with_timezone(&Utc);
        for (id, org, remind_me, end) in [
            ("i1", ORG, true, Some(start + Duration::hours(1))),
            ("i2", ORG, false, None),
            ("i3", ORG, true, None),
            ("i4", "other-org", true, None),
        ] {
            store.insert_interaction(
                NewInteraction {
                    org_id: org.into(),
                    contact_id: "c1".into(),
                    owner_id: USER.into(),
                    deal_id: String::new(),
                    task_id: String::new(),
                    start,
                    end,
                    kind: "Meeting".into(),
                    notes: String::new(),
                    title: String::new(),
                    remind_me,
                    participants: vec![USER.into()],
                }
                .with_id(id.into()),
            );
        }
        store
    }

    async fn loaded(store: &Arc<MemoryStore>) -> CalendarController {
        let mut ctl = CalendarController::new(ORG, USER, Stores::from_backend(store.clone()));
        let update = ctl.begin_load().await;
        ctl.apply(update);
        let update = ctl.load_options().await;
        ctl.apply(update);
        ctl
    }

    fn ids(ctl: &CalendarController) -> Vec<String> {
        ctl.events().iter().map(|e| e.id.clone()).collect()
    }

    #[tokio::test]
    async fn load_projects_only_active_interactions() {
        let store = seeded();
        let ctl = loaded(&store).await;

        assert_eq!(ids(&ctl), vec!["i1", "i3"]);
        let i1 = ctl.events().get("i1").unwrap();
        assert_eq!(i1.title, "Meeting with Grace Hopper");
        assert!(!i1.is_all_day);
        assert!(ctl.events().get("i3").unwrap().is_all_day);
        assert_eq!(ctl.options().contacts[0].label, "Grace Hopper");
    }

    #[tokio::test]
    async fn load_clears_before_repopulating() {
        let store = seeded();
        let mut ctl = loaded(&store).await;
        let pending = ctl.begin_load();
        assert!(ctl.events().is_empty());
        let update = pending.await;
        ctl.apply(update);
        assert_eq!(ctl.events().len(), 2);
    }

    #[tokio::test]
    async fn create_timed_event() {
        let store = seeded();
        let mut ctl = loaded(&store).await;
        let before = store.interaction_count();

        let draft = EventDraft {
            title: "Kickoff".into(),
            date: Some(jan10()),
            start_time: "09:00".into(),
            end_time: "10:00".into(),
            contact_id: "c1".into(),
            kind: "Call".into(),
            ..Default::default()
        };
        let update = ctl.begin_create(draft).unwrap().await;
        let note = ctl.apply(update).unwrap();
        assert_eq!(note, Notification::success("Interaction Successfully Added"));

        assert_eq!(store.interaction_count(), before + 1);
        let ev = ctl.events().iter().last().unwrap().clone();
        assert_eq!(ev.start.naive_local(), jan10().and_hms_opt(9, 0, 0).unwrap());
        assert_eq!(ev.end.unwrap().naive_local(), jan10().and_hms_opt(10, 0, 0).unwrap());
        assert!(!ev.is_all_day);

        let saved = store.get_interaction(&ev.id).await.unwrap();
        assert!(saved.remind_me);
        assert_eq!(saved.title, "Kickoff");
        assert_eq!(saved.kind, "Call");
        assert_eq!(saved.contact_id, "c1");
        assert_eq!(saved.owner_id, USER);
        assert_eq!(saved.participants, vec![USER.to_string()]);
        assert_eq!(saved.start, ev.start.with_timezone(&Utc));
    }

    #[tokio::test]
    async fn create_all_day_event_without_end() {
        let store = seeded();
        let mut ctl = loaded(&store).await;

        let draft = EventDraft {
            date: Some(jan10()),
            start_time: "09:00".into(),
            all_day: true,
            contact_id: "c1".into(),
            ..Default::default()
        };
        let update = ctl.begin_create(draft).unwrap().await;
        ctl.apply(update);

        let ev = ctl.events().iter().last().unwrap().clone();
        assert!(ev.is_all_day);
        assert_eq!(ev.title, "Meeting with Grace Hopper");
        assert_eq!(store.get_interaction(&ev.id).await.unwrap().end, None);
    }

    #[tokio::test]
    async fn malformed_time_is_a_form_error() {
        let store = seeded();
        let ctl = loaded(&store).await;
        let draft = EventDraft {
            date: Some(jan10()),
            start_time: "nine".into(),
            ..Default::default()
        };
        assert_eq!(
            ctl.begin_create(draft).err(),
            Some(FormError::InvalidTime("nine".into()))
        );
    }

    #[tokio::test]
    async fn failed_create_shows_error_and_adds_nothing() {
        let store = seeded();
        let mut ctl = loaded(&store).await;
        store.fail_writes(true);
        let draft = EventDraft {
            date: Some(jan10()),
            start_time: "09:00".into(),
            ..Default::default()
        };
        let update = ctl.begin_create(draft).unwrap().await;
        let note = ctl.apply(update).unwrap();
        assert_eq!(note.level, crate::notify::Level::Error);
        assert_eq!(ctl.events().len(), 2);
    }

    #[tokio::test]
    async fn dismiss_removes_now_and_keeps_the_record() {
        let store = seeded();
        let mut ctl = loaded(&store).await;

        let pending = ctl.begin_dismiss("i1").unwrap();
        assert!(ctl.events().get("i1").is_none());
        let update = pending.await;
        assert_eq!(ctl.apply(update), None);

        let record = store.get_interaction("i1").await.unwrap();
        assert!(!record.remind_me);

        let update = ctl.begin_load().await;
        ctl.apply(update);
        assert_eq!(ids(&ctl), vec!["i3"]);
    }

    #[tokio::test]
    async fn failed_dismiss_restores_the_event() {
        let store = seeded();
        let mut ctl = loaded(&store).await;
        store.fail_writes(true);

        let update = ctl.begin_dismiss("i1").unwrap().await;
        let note = ctl.apply(update).unwrap();
        assert_eq!(note.level, crate::notify::Level::Error);
        assert_eq!(ids(&ctl), vec!["i1", "i3"]);
        assert!(store.get_interaction("i1").await.unwrap().remind_me);
    }

    #[tokio::test]
    async fn move_sends_only_start_and_end() {
        let store = seeded();
        let mut ctl = loaded(&store).await;
        let original = store.get_interaction("i1").await.unwrap();

        let update = ctl.begin_shift("i1", Duration::days(1)).unwrap().await;
        assert_eq!(ctl.apply(update), None);

        let patches = store.interaction_patches();
        assert_eq!(patches.len(), 1);
        let (id, patch) = &patches[0];
        assert_eq!(id, "i1");
        assert_eq!(
            patch,
            &InteractionPatch::reschedule(
                original.start + Duration::days(1),
                original.end.map(|e| e + Duration::days(1)),
            )
        );

        let saved = store.get_interaction("i1").await.unwrap();
        assert_eq!(saved.kind, original.kind);
        assert_eq!(saved.contact_id, original.contact_id);
        assert_eq!(saved.remind_me, original.remind_me);
        assert_eq!(
            ctl.events().get("i1").unwrap().start,
            saved.start.with_timezone(&Local)
        );
    }

    #[tokio::test]
    async fn failed_move_reverts_times() {
        let store = seeded();
        let mut ctl = loaded(&store).await;
        let before = ctl.events().get("i1").unwrap().clone();
        store.fail_writes(true);

        let pending = ctl.begin_resize("i1", Duration::minutes(30)).unwrap();
        assert_eq!(
            ctl.events().get("i1").unwrap().end,
            before.end.map(|e| e + Duration::minutes(30))
        );
        let update = pending.await;
        assert!(ctl.apply(update).is_some());
        assert_eq!(ctl.events().get("i1").unwrap(), &before);
    }

    async fn shown_and_stored(
        store: &MemoryStore,
        ctl: &CalendarController,
    ) -> (DateTime<Local>, DateTime<Local>) {
        let shown = ctl.events().get("i1").unwrap().start;
        let stored = store.get_interaction("i1").await.unwrap().start;
        (shown, stored.with_timezone(&Local))
    }

    #[tokio::test]
    async fn stacked_failed_moves_return_to_stored_times() {
        let store = seeded();
        let mut ctl = loaded(&store).await;
        let before = ctl.events().get("i1").unwrap().clone();
        store.fail_writes(true);

        let first = ctl.begin_shift("i1", Duration::days(1)).unwrap();
        let second = ctl.begin_shift("i1", Duration::days(1)).unwrap();
        assert_eq!(
            ctl.events().get("i1").unwrap().start,
            before.start + Duration::days(2)
        );
        let (first, second) = (first.await, second.await);

        assert!(ctl.apply(first).is_some());
        assert!(ctl.apply(second).is_some());
        let (shown, stored) = shown_and_stored(&store, &ctl).await;
        assert_eq!(shown, stored);
        assert_eq!(ctl.events().get("i1").unwrap(), &before);
    }

    #[tokio::test]
    async fn earlier_failure_keeps_a_later_accepted_move() {
        let store = seeded();
        let mut ctl = loaded(&store).await;
        let before = ctl.events().get("i1").unwrap().clone();

        let first = ctl.begin_shift("i1", Duration::days(1)).unwrap();
        let second = ctl.begin_shift("i1", Duration::days(1)).unwrap();
        store.fail_writes(true);
        let first = first.await;
        store.fail_writes(false);
        let second = second.await;

        assert!(ctl.apply(first).is_some());
        assert_eq!(ctl.apply(second), None);
        let (shown, stored) = shown_and_stored(&store, &ctl).await;
        assert_eq!(shown, stored);
        assert_eq!(shown, before.start + Duration::days(2));
    }

    #[tokio::test]
    async fn late_success_after_latest_failure_shows_stored_times() {
        let store = seeded();
        let mut ctl = loaded(&store).await;
        let before = ctl.events().get("i1").unwrap().clone();

        let first = ctl.begin_shift("i1", Duration::days(1)).unwrap();
        let second = ctl.begin_shift("i1", Duration::days(1)).unwrap();
        let first = first.await;
        store.fail_writes(true);
        let second = second.await;

        assert!(ctl.apply(second).is_some());
        assert_eq!(ctl.apply(first), None);
        let (shown, stored) = shown_and_stored(&store, &ctl).await;
        assert_eq!(shown, stored);
        assert_eq!(shown, before.start + Duration::days(1));
    }

    #[tokio::test]
    async fn all_day_events_cannot_be_resized() {
        let store = seeded();
        let mut ctl = loaded(&store).await;
        assert!(ctl.begin_resize("i3", Duration::minutes(15)).is_none());
        assert!(ctl.begin_resize("i1", Duration::hours(-2)).is_none());
    }

    #[tokio::test]
    async fn edit_refreshes_a_single_event() {
        let store = seeded();
        let mut ctl = loaded(&store).await;

        match ctl.begin_edit("i3").await {
            CalendarUpdate::EditReady(Ok(i)) => assert_eq!(i.id, "i3"),
            other => panic!("unexpected {other:?}"),
        }

        let patch = InteractionPatch {
            title: Some("Contract signing".into()),
            ..Default::default()
        };
        let update = ctl.begin_update("i3", patch).await;
        assert!(ctl.apply(update).is_some());

        assert_eq!(ids(&ctl), vec!["i1", "i3"]);
        assert_eq!(ctl.events().get("i3").unwrap().title, "Contract signing");
    }

    #[tokio::test]
    async fn edit_that_dismisses_drops_the_event() {
        let store = seeded();
        let mut ctl = loaded(&store).await;
        let update = ctl.begin_update("i3", InteractionPatch::dismiss()).await;
        ctl.apply(update);
        assert_eq!(ids(&ctl), vec!["i1"]);
    }
}

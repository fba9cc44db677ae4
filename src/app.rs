use std::path::PathBuf;
use std::time::{Duration, Instant};

use chrono::{Datelike, Local, NaiveDate};
use futures::future::BoxFuture;
use tokio::runtime::Handle;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tracing::warn;

use crate::calendar::{CalendarController, CalendarEvent, CalendarUpdate};
use crate::components::{ContactFormState, EventFormState};
use crate::config::Config;
use crate::contacts::{export, ContactsController, ContactsUpdate};
use crate::model::options;
use crate::notify::{Notification, Toast};
use crate::store::Stores;

/// One step of a drag gesture in the timed views.
pub const NUDGE_MINUTES: i64 = 15;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Screen {
    Calendar,
    Contacts,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewMode {
    Month,
    Week,
    Day,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputMode {
    Normal,
    EventForm,
    ContactForm,
    Filter,
}

/// Result of a remote call, sent back to the UI thread.
#[derive(Debug)]
pub enum AppMessage {
    Calendar(CalendarUpdate),
    Contacts(ContactsUpdate),
}

pub struct App {
    pub running: bool,
    pub screen: Screen,
    pub view_mode: ViewMode,
    pub input_mode: InputMode,
    pub selected_date: NaiveDate,
    pub today: NaiveDate,
    /// Index into the selected day's events.
    pub day_selection: usize,
    pub show_detail: bool,
    pub show_help: bool,
    /// Index into the filtered contact rows.
    pub contact_selection: usize,
    pub calendar: CalendarController,
    pub contacts: ContactsController,
    pub event_form: Option<EventFormState>,
    pub contact_form: Option<ContactFormState>,
    pub toast: Option<Toast>,
    org_id: String,
    toast_ttl: Duration,
    export_dir: PathBuf,
    runtime: Handle,
    tx: UnboundedSender<AppMessage>,
    rx: UnboundedReceiver<AppMessage>,
}

impl App {
    pub fn new(config: &Config, stores: Stores, runtime: Handle) -> Self {
        let (tx, rx) = unbounded_channel();
        let today = Local::now().date_naive();
        Self {
            running: true,
            screen: Screen::Calendar,
            view_mode: ViewMode::Month,
            input_mode: InputMode::Normal,
            selected_date: today,
            today,
            day_selection: 0,
            show_detail: false,
            show_help: false,
            contact_selection: 0,
            calendar: CalendarController::new(
                config.org_id.clone(),
                config.user_id.clone(),
                stores.clone(),
            ),
            contacts: ContactsController::new(
                config.org_id.clone(),
                stores.contacts.clone(),
                config.row_delay(),
            ),
            event_form: None,
            contact_form: None,
            toast: None,
            org_id: config.org_id.clone(),
            toast_ttl: config.notification_ttl(),
            export_dir: config.export_dir(),
            runtime,
            tx,
            rx,
        }
    }

    /// Kick off the initial loads for both screens.
    pub fn start(&mut self) {
        self.reload_calendar();
        self.reload_contacts();
    }

    pub fn reload_calendar(&mut self) {
        let load = self.calendar.begin_load();
        self.spawn(load, AppMessage::Calendar);
        let options = self.calendar.load_options();
        self.spawn(options, AppMessage::Calendar);
    }

    pub fn reload_contacts(&mut self) {
        let load = self.contacts.begin_load();
        self.spawn(load, AppMessage::Contacts);
    }

    fn spawn<T: Send + 'static>(&self, work: BoxFuture<'static, T>, wrap: fn(T) -> AppMessage) {
        let tx = self.tx.clone();
        self.runtime.spawn(async move {
            // The receiver only goes away on shutdown
            let _ = tx.send(wrap(work.await));
        });
    }

    /// Fold every finished remote call into the screens. Called once per tick.
    pub fn drain_messages(&mut self) {
        while let Ok(msg) = self.rx.try_recv() {
            self.handle(msg);
        }
        if self.toast.as_ref().is_some_and(|t| t.is_expired(Instant::now())) {
            self.toast = None;
        }
    }

    fn handle(&mut self, msg: AppMessage) {
        let note = match msg {
            AppMessage::Calendar(CalendarUpdate::EditReady(result)) => match result {
                Ok(interaction) => {
                    let form = EventFormState::edit(interaction, self.calendar.options());
                    self.event_form = Some(form);
                    self.input_mode = InputMode::EventForm;
                    self.show_detail = false;
                    None
                }
                Err(e) => {
                    warn!(error = %e, "fetching interaction for edit");
                    Some(Notification::error(format!("Could not open interaction: {e}")))
                }
            },
            AppMessage::Calendar(update) => {
                let note = self.calendar.apply(update);
                self.clamp_day_selection();
                note
            }
            AppMessage::Contacts(update) => {
                let changed = matches!(
                    &update,
                    ContactsUpdate::Added { result: Ok(Some(_)), .. }
                        | ContactsUpdate::Edited { result: Ok(()), .. }
                        | ContactsUpdate::Deleted { result: Ok(()), .. }
                );
                let note = self.contacts.apply(update);
                if changed {
                    self.calendar
                        .set_contact_options(options(self.contacts.contacts()));
                }
                self.clamp_contact_selection();
                note
            }
        };
        if let Some(note) = note {
            self.notify(note);
        }
    }

    pub fn notify(&mut self, notification: Notification) {
        self.toast = Some(Toast::new(notification, self.toast_ttl));
    }

    pub fn toggle_screen(&mut self) {
        self.screen = match self.screen {
            Screen::Calendar => Screen::Contacts,
            Screen::Contacts => Screen::Calendar,
        };
        self.show_detail = false;
    }

    // Calendar

    /// Events of the selected day in display order.
    pub fn day_events(&self) -> Vec<&CalendarEvent> {
        self.calendar.events().events_on(self.selected_date)
    }

    pub fn week_events(&self) -> Vec<&CalendarEvent> {
        let start = self.week_start();
        self.calendar
            .events()
            .events_between(start, start + chrono::Duration::days(6))
    }

    pub fn selected_event(&self) -> Option<&CalendarEvent> {
        self.day_events().get(self.day_selection).copied()
    }

    fn selected_event_id(&self) -> Option<String> {
        self.selected_event().map(|e| e.id.clone())
    }

    pub fn week_start(&self) -> NaiveDate {
        let offset = self.selected_date.weekday().num_days_from_sunday() as i64;
        self.selected_date - chrono::Duration::days(offset)
    }

    pub fn select_next_event(&mut self) {
        if self.day_selection + 1 < self.day_events().len() {
            self.day_selection += 1;
        }
    }

    pub fn select_prev_event(&mut self) {
        self.day_selection = self.day_selection.saturating_sub(1);
    }

    fn clamp_day_selection(&mut self) {
        let n = self.day_events().len();
        self.day_selection = self.day_selection.min(n.saturating_sub(1));
        if n == 0 {
            self.show_detail = false;
        }
    }

    pub fn open_detail(&mut self) {
        self.show_detail = self.selected_event().is_some();
    }

    pub fn close_detail(&mut self) {
        self.show_detail = false;
    }

    /// Drag the selected event; the selection follows it.
    pub fn shift_selected(&mut self, delta: chrono::Duration) {
        let Some(id) = self.selected_event_id() else {
            return;
        };
        if let Some(work) = self.calendar.begin_shift(&id, delta) {
            self.spawn(work, AppMessage::Calendar);
        }
        // Keep the moved event selected when it lands on another day
        if let Some(date) = self.calendar.events().get(&id).map(|e| e.date()) {
            self.selected_date = date;
            if let Some(pos) = self.day_events().iter().position(|e| e.id == id) {
                self.day_selection = pos;
            }
        }
    }

    pub fn resize_selected(&mut self, delta: chrono::Duration) {
        let Some(id) = self.selected_event_id() else {
            return;
        };
        if let Some(work) = self.calendar.begin_resize(&id, delta) {
            self.spawn(work, AppMessage::Calendar);
        }
    }

    pub fn dismiss_selected(&mut self) {
        let Some(id) = self.selected_event_id() else {
            return;
        };
        if let Some(work) = self.calendar.begin_dismiss(&id) {
            self.spawn(work, AppMessage::Calendar);
        }
        self.show_detail = false;
        self.clamp_day_selection();
    }

    pub fn edit_selected_event(&mut self) {
        if let Some(id) = self.selected_event_id() {
            let work = self.calendar.begin_edit(&id);
            self.spawn(work, AppMessage::Calendar);
        }
    }

    pub fn open_event_form(&mut self) {
        self.event_form = Some(EventFormState::new(self.selected_date));
        self.input_mode = InputMode::EventForm;
    }

    pub fn close_event_form(&mut self) {
        self.event_form = None;
        self.input_mode = InputMode::Normal;
    }

    /// Validate and save the interaction form. Invalid input keeps the form
    /// open with the error shown.
    pub fn submit_event_form(&mut self) {
        let Some(form) = self.event_form.as_mut() else {
            return;
        };
        let options = self.calendar.options();
        let work = match form.editing_id().map(str::to_string) {
            Some(id) => form
                .patch(options)
                .map(|patch| self.calendar.begin_update(&id, patch)),
            None => form
                .draft(options)
                .and_then(|draft| self.calendar.begin_create(draft)),
        };
        match work {
            Ok(work) => {
                if let Some(date) = form.parsed_date() {
                    self.selected_date = date;
                }
                self.spawn(work, AppMessage::Calendar);
                self.close_event_form();
            }
            Err(e) => form.error = Some(e.to_string()),
        }
    }

    // Contacts

    pub fn selected_contact_id(&self) -> Option<String> {
        self.contacts
            .visible()
            .get(self.contact_selection)
            .map(|c| c.id.clone())
    }

    pub fn select_next_contact(&mut self) {
        if self.contact_selection + 1 < self.contacts.visible().len() {
            self.contact_selection += 1;
        }
    }

    pub fn select_prev_contact(&mut self) {
        self.contact_selection = self.contact_selection.saturating_sub(1);
    }

    fn clamp_contact_selection(&mut self) {
        let n = self.contacts.visible().len();
        self.contact_selection = self.contact_selection.min(n.saturating_sub(1));
    }

    pub fn filter_push(&mut self, c: char) {
        let mut filter = self.contacts.filter().to_string();
        filter.push(c);
        self.contacts.set_filter(filter);
        self.contact_selection = 0;
    }

    pub fn filter_pop(&mut self) {
        let mut filter = self.contacts.filter().to_string();
        filter.pop();
        self.contacts.set_filter(filter);
        self.contact_selection = 0;
    }

    pub fn clear_filter(&mut self) {
        self.contacts.set_filter("");
        self.contact_selection = 0;
    }

    pub fn delete_selected_contact(&mut self) {
        let Some(id) = self.selected_contact_id() else {
            return;
        };
        if let Some(work) = self.contacts.begin_delete(&id) {
            self.spawn(work, AppMessage::Contacts);
        }
    }

    pub fn open_add_contact(&mut self) {
        self.contact_form = Some(ContactFormState::add());
        self.input_mode = InputMode::ContactForm;
    }

    pub fn open_edit_contact(&mut self) {
        let Some(id) = self.selected_contact_id() else {
            return;
        };
        if let Some(contact) = self.contacts.get(&id) {
            self.contact_form = Some(ContactFormState::edit(contact));
            self.input_mode = InputMode::ContactForm;
        }
    }

    pub fn close_contact_form(&mut self) {
        self.contact_form = None;
        self.input_mode = InputMode::Normal;
    }

    pub fn submit_contact_form(&mut self) {
        let Some(form) = self.contact_form.as_mut() else {
            return;
        };
        let result = match form.patch() {
            Ok(Some((id, patch))) => Ok(self.contacts.begin_edit(&id, patch)),
            Ok(None) => form.record().map(|record| self.contacts.begin_add(record)),
            Err(e) => Err(e),
        };
        match result {
            Ok(work) => {
                self.spawn(work, AppMessage::Contacts);
                self.close_contact_form();
            }
            Err(e) => form.error = Some(e.to_string()),
        }
    }

    /// Write the rows currently shown to a CSV file.
    pub fn export_contacts(&mut self) {
        let rows = self.contacts.visible();
        let note = match export::export_to_dir(&self.export_dir, &self.org_id, &rows) {
            Ok(path) => Notification::success(format!(
                "Exported {} contacts to {}",
                rows.len(),
                path.display()
            )),
            Err(e) => {
                warn!(error = %e, "exporting contacts");
                Notification::error(format!("Export failed: {e}"))
            }
        };
        self.notify(note);
    }

    // Date navigation

    pub fn next_day(&mut self) {
        self.selected_date = self.selected_date.succ_opt().unwrap_or(self.selected_date);
        self.on_date_changed();
    }

    pub fn prev_day(&mut self) {
        self.selected_date = self.selected_date.pred_opt().unwrap_or(self.selected_date);
        self.on_date_changed();
    }

    pub fn next_week(&mut self) {
        self.selected_date += chrono::Duration::weeks(1);
        self.on_date_changed();
    }

    pub fn prev_week(&mut self) {
        self.selected_date -= chrono::Duration::weeks(1);
        self.on_date_changed();
    }

    pub fn next_month(&mut self) {
        let (year, month) = match self.selected_date.month() {
            12 => (self.selected_date.year() + 1, 1),
            m => (self.selected_date.year(), m + 1),
        };
        self.jump_to_month(year, month);
    }

    pub fn prev_month(&mut self) {
        let (year, month) = match self.selected_date.month() {
            1 => (self.selected_date.year() - 1, 12),
            m => (self.selected_date.year(), m - 1),
        };
        self.jump_to_month(year, month);
    }

    fn jump_to_month(&mut self, year: i32, month: u32) {
        let day = self.selected_date.day().min(days_in_month(year, month));
        if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
            self.selected_date = date;
        }
        self.on_date_changed();
    }

    pub fn go_to_today(&mut self) {
        self.today = Local::now().date_naive();
        self.selected_date = self.today;
        self.on_date_changed();
    }

    fn on_date_changed(&mut self) {
        self.day_selection = 0;
        self.show_detail = false;
    }
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    match (next, NaiveDate::from_ymd_opt(year, month, 1)) {
        (Some(next), Some(first)) => next.signed_duration_since(first).num_days() as u32,
        _ => 30,
    }
}

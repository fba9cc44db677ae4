use chrono::{Local, NaiveDate};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use super::autocomplete::Autocomplete;
use crate::calendar::{time, EventDraft, PickerOptions};
use crate::error::FormError;
use crate::model::{Interaction, InteractionPatch};
use crate::theme;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FormField {
    Title,
    Date,
    StartTime,
    EndTime,
    AllDay,
    Contact,
    Deal,
    Task,
    Kind,
    Notes,
}

impl FormField {
    const ORDER: [FormField; 10] = [
        FormField::Title,
        FormField::Date,
        FormField::StartTime,
        FormField::EndTime,
        FormField::AllDay,
        FormField::Contact,
        FormField::Deal,
        FormField::Task,
        FormField::Kind,
        FormField::Notes,
    ];

    fn index(&self) -> usize {
        Self::ORDER.iter().position(|f| f == self).unwrap_or(0)
    }

    pub fn next(&self) -> Self {
        Self::ORDER[(self.index() + 1) % Self::ORDER.len()]
    }

    pub fn prev(&self) -> Self {
        Self::ORDER[(self.index() + Self::ORDER.len() - 1) % Self::ORDER.len()]
    }

    pub fn is_picker(&self) -> bool {
        matches!(self, FormField::Contact | FormField::Deal | FormField::Task)
    }
}

/// Date and clock fields as typed.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleFields {
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    pub is_all_day: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FormMode {
    Create,
    /// Editing an existing interaction; `initial` and `pickers` are what the
    /// form opened with.
    Edit {
        original: Box<Interaction>,
        initial: ScheduleFields,
        pickers: Box<[Autocomplete; 3]>,
    },
}

/// State of the popup used both to create an interaction and to edit one.
#[derive(Debug, Clone)]
pub struct EventFormState {
    pub mode: FormMode,
    pub title: String,
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    pub is_all_day: bool,
    pub contact: Autocomplete,
    pub deal: Autocomplete,
    pub task: Autocomplete,
    pub kind: String,
    pub notes: String,
    pub active_field: FormField,
    pub error: Option<String>,
}

impl EventFormState {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            mode: FormMode::Create,
            title: String::new(),
            date: date.format("%Y-%m-%d").to_string(),
            start_time: "09:00".to_string(),
            end_time: "10:00".to_string(),
            is_all_day: false,
            contact: Autocomplete::default(),
            deal: Autocomplete::default(),
            task: Autocomplete::default(),
            kind: String::new(),
            notes: String::new(),
            active_field: FormField::Title,
            error: None,
        }
    }

    /// Pre-fill the popup from a fetched interaction.
    pub fn edit(interaction: Interaction, options: &PickerOptions) -> Self {
        let start = interaction.start.with_timezone(&Local);
        let schedule = ScheduleFields {
            date: start.format("%Y-%m-%d").to_string(),
            start_time: start.format("%H:%M").to_string(),
            end_time: interaction
                .end
                .map(|e| e.with_timezone(&Local).format("%H:%M").to_string())
                .unwrap_or_default(),
            is_all_day: interaction.end.is_none(),
        };
        let contact = Autocomplete::preset(&options.contacts, &interaction.contact_id);
        let deal = Autocomplete::preset(&options.deals, &interaction.deal_id);
        let task = Autocomplete::preset(&options.tasks, &interaction.task_id);
        let pickers = Box::new([contact.clone(), deal.clone(), task.clone()]);
        Self {
            title: interaction.title.clone(),
            date: schedule.date.clone(),
            start_time: schedule.start_time.clone(),
            end_time: schedule.end_time.clone(),
            is_all_day: schedule.is_all_day,
            contact,
            deal,
            task,
            kind: interaction.kind.clone(),
            notes: interaction.notes.clone(),
            active_field: FormField::Title,
            error: None,
            mode: FormMode::Edit {
                original: Box::new(interaction),
                initial: schedule,
                pickers,
            },
        }
    }

    pub fn editing_id(&self) -> Option<&str> {
        match self.mode {
            FormMode::Edit { ref original, .. } => Some(&original.id),
            FormMode::Create => None,
        }
    }

    pub fn parsed_date(&self) -> Option<NaiveDate> {
        time::parse_date(&self.date).ok()
    }

    fn schedule_fields(&self) -> ScheduleFields {
        ScheduleFields {
            date: self.date.clone(),
            start_time: self.start_time.clone(),
            end_time: self.end_time.clone(),
            is_all_day: self.is_all_day,
        }
    }

    pub fn input_char(&mut self, c: char) {
        match self.active_field {
            FormField::Title => self.title.push(c),
            FormField::Date => self.date.push(c),
            FormField::StartTime => self.start_time.push(c),
            FormField::EndTime => self.end_time.push(c),
            FormField::Contact => self.contact.push(c),
            FormField::Deal => self.deal.push(c),
            FormField::Task => self.task.push(c),
            FormField::Kind => self.kind.push(c),
            FormField::Notes => self.notes.push(c),
            FormField::AllDay => {}
        }
    }

    pub fn backspace(&mut self) {
        match self.active_field {
            FormField::Title => { self.title.pop(); }
            FormField::Date => { self.date.pop(); }
            FormField::StartTime => { self.start_time.pop(); }
            FormField::EndTime => { self.end_time.pop(); }
            FormField::Contact => self.contact.pop(),
            FormField::Deal => self.deal.pop(),
            FormField::Task => self.task.pop(),
            FormField::Kind => { self.kind.pop(); }
            FormField::Notes => { self.notes.pop(); }
            FormField::AllDay => {}
        }
    }

    pub fn toggle_all_day(&mut self) {
        self.is_all_day = !self.is_all_day;
    }

    /// Step the active picker to its next match.
    pub fn cycle_option(&mut self, options: &PickerOptions) {
        match self.active_field {
            FormField::Contact => self.contact.cycle(&options.contacts),
            FormField::Deal => self.deal.cycle(&options.deals),
            FormField::Task => self.task.cycle(&options.tasks),
            _ => {}
        }
    }

    pub fn draft(&self, options: &PickerOptions) -> Result<EventDraft, FormError> {
        let date = time::parse_date(&self.date)?;
        Ok(EventDraft {
            title: self.title.trim().to_string(),
            date: Some(date),
            start_time: self.start_time.clone(),
            end_time: self.end_time.clone(),
            all_day: self.is_all_day,
            contact_id: self.contact.selected_id(&options.contacts),
            deal_id: self.deal.selected_id(&options.deals),
            task_id: self.task.selected_id(&options.tasks),
            kind: self.kind.trim().to_string(),
            notes: self.notes.clone(),
        })
    }

    /// Changes made in edit mode. Untouched pickers keep their stored id
    /// even when the autocomplete list does not know it or was reloaded
    /// while the popup was open.
    pub fn patch(&self, options: &PickerOptions) -> Result<InteractionPatch, FormError> {
        let FormMode::Edit {
            ref original,
            ref initial,
            ref pickers,
        } = self.mode
        else {
            return Ok(InteractionPatch::default());
        };
        let mut patch = InteractionPatch::default();

        if self.schedule_fields() != *initial {
            let date = time::parse_date(&self.date)?;
            let (start, end) =
                time::schedule(date, &self.start_time, &self.end_time, self.is_all_day)?;
            patch.start = Some(start.with_timezone(&chrono::Utc));
            patch.end = Some(end.map(|e| e.with_timezone(&chrono::Utc)));
        }

        let title = self.title.trim();
        if title != original.title {
            patch.title = Some(title.to_string());
        }
        let kind = self.kind.trim();
        if kind != original.kind {
            patch.kind = Some(kind.to_string());
        }
        if self.notes != original.notes {
            patch.notes = Some(self.notes.clone());
        }

        let [opened_contact, opened_deal, opened_task] = &**pickers;
        let fields = [
            (
                &self.contact,
                opened_contact,
                &options.contacts,
                &original.contact_id,
                &mut patch.contact_id,
            ),
            (
                &self.deal,
                opened_deal,
                &options.deals,
                &original.deal_id,
                &mut patch.deal_id,
            ),
            (
                &self.task,
                opened_task,
                &options.tasks,
                &original.task_id,
                &mut patch.task_id,
            ),
        ];
        for (picker, opened, opts, stored, slot) in fields {
            if picker == opened {
                continue;
            }
            let id = picker.selected_id(opts);
            if id != *stored {
                *slot = Some(id);
            }
        }

        Ok(patch)
    }
}

pub struct EventForm;

impl EventForm {
    pub fn render(frame: &mut Frame, area: Rect, state: &EventFormState, options: &PickerOptions) {
        // Center the form popup
        let form_w = area.width.min(60).max(34);
        let form_h = area.height.min(17).max(14);
        let x = area.x + (area.width.saturating_sub(form_w)) / 2;
        let y = area.y + (area.height.saturating_sub(form_h)) / 2;
        let form_area = Rect::new(x, y, form_w, form_h);

        frame.render_widget(Clear, form_area);

        let title = match state.mode {
            FormMode::Create => " New Interaction ",
            FormMode::Edit { .. } => " Edit Interaction ",
        };
        let block = Block::default()
            .title(title)
            .title_style(Style::default().fg(ratatui::style::Color::Green).add_modifier(Modifier::BOLD))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(ratatui::style::Color::Green));

        let inner = block.inner(form_area);
        frame.render_widget(block, form_area);

        let mut constraints = vec![Constraint::Length(1); 12];
        constraints.push(Constraint::Length(1)); // help
        constraints.push(Constraint::Min(0));
        let rows = Layout::vertical(constraints).split(inner);

        let active = state.active_field;
        render_field(frame, rows[0], "Title:", &state.title, active == FormField::Title);
        render_field(frame, rows[1], "Date:", &state.date, active == FormField::Date);

        if state.is_all_day {
            render_field(frame, rows[2], "Start:", "--:--", false);
            render_field(frame, rows[3], "End:", "--:--", false);
        } else {
            render_field(frame, rows[2], "Start:", &state.start_time, active == FormField::StartTime);
            render_field(frame, rows[3], "End:", &state.end_time, active == FormField::EndTime);
        }

        let all_day_val = if state.is_all_day { "[x] All Day" } else { "[ ] All Day" };
        render_field(frame, rows[4], "", all_day_val, active == FormField::AllDay);

        render_field(frame, rows[5], "Contact:", &state.contact.display(&options.contacts), active == FormField::Contact);
        render_field(frame, rows[6], "Deal:", &state.deal.display(&options.deals), active == FormField::Deal);
        render_field(frame, rows[7], "Task:", &state.task.display(&options.tasks), active == FormField::Task);
        render_field(frame, rows[8], "Type:", &state.kind, active == FormField::Kind);
        render_field(frame, rows[9], "Notes:", &state.notes, active == FormField::Notes);

        if let Some(ref err) = state.error {
            frame.render_widget(
                Paragraph::new(Span::styled(err.as_str(), theme::current().error)),
                rows[11],
            );
        }

        let mut help = vec![
            Span::styled("Tab", Style::default().add_modifier(Modifier::BOLD)),
            Span::styled(":Next ", theme::current().dim),
        ];
        if active.is_picker() {
            help.push(Span::styled("\u{2193}", Style::default().add_modifier(Modifier::BOLD)));
            help.push(Span::styled(":Match ", theme::current().dim));
        }
        help.extend([
            Span::styled("Enter", Style::default().add_modifier(Modifier::BOLD)),
            Span::styled(":Save ", theme::current().dim),
            Span::styled("Esc", Style::default().add_modifier(Modifier::BOLD)),
            Span::styled(":Cancel", theme::current().dim),
        ]);
        frame.render_widget(Paragraph::new(Line::from(help)), rows[12]);
    }
}

pub(crate) fn render_field(frame: &mut Frame, area: Rect, label: &str, value: &str, active: bool) {
    let label_w = if label.is_empty() { 0 } else { 9 };
    let cursor = if active { "_" } else { "" };

    let style = if active {
        Style::default().fg(ratatui::style::Color::Cyan)
    } else {
        Style::default()
    };

    let mut spans = Vec::new();
    if !label.is_empty() {
        spans.push(Span::styled(
            format!("{:<width$}", label, width = label_w),
            theme::current().dim,
        ));
    }
    spans.push(Span::styled(format!("{}{}", value, cursor), style));

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{LabeledOption, NewInteraction};
    use chrono::{Duration, TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn options() -> PickerOptions {
        PickerOptions {
            contacts: vec![
                LabeledOption { id: "c1".into(), label: "Ada Lovelace".into() },
                LabeledOption { id: "c2".into(), label: "Grace Hopper".into() },
            ],
            ..Default::default()
        }
    }

    fn stored() -> Interaction {
        let start = Local
            .with_ymd_and_hms(2024, 1, 10, 9, 0, 0)
            .unwrap()
            .with_timezone(&Utc);
        NewInteraction {
            org_id: "acme".into(),
            contact_id: "c1".into(),
            owner_id: "u1".into(),
            deal_id: "d-unknown".into(),
            task_id: String::new(),
            start,
            end: Some(start + Duration::hours(1)),
            kind: "Call".into(),
            notes: String::new(),
            title: "Kickoff".into(),
            remind_me: true,
            participants: vec!["u1".into()],
        }
        .with_id("i1".into())
    }

    #[test]
    fn tab_order_wraps() {
        assert_eq!(FormField::Notes.next(), FormField::Title);
        assert_eq!(FormField::Title.prev(), FormField::Notes);
        assert_eq!(FormField::AllDay.next(), FormField::Contact);
    }

    #[test]
    fn draft_resolves_picker_ids() {
        let mut form = EventFormState::new(NaiveDate::from_ymd_opt(2024, 1, 10).unwrap());
        form.active_field = FormField::Contact;
        for c in "grace".chars() {
            form.input_char(c);
        }
        form.title = "  Sync ".into();
        let draft = form.draft(&options()).unwrap();
        assert_eq!(draft.contact_id, "c2");
        assert_eq!(draft.title, "Sync");
        assert_eq!(draft.date, NaiveDate::from_ymd_opt(2024, 1, 10));
    }

    #[test]
    fn bad_date_is_reported() {
        let mut form = EventFormState::new(NaiveDate::from_ymd_opt(2024, 1, 10).unwrap());
        form.date = "10/01/2024".into();
        assert_eq!(
            form.draft(&options()),
            Err(FormError::InvalidDate("10/01/2024".into()))
        );
    }

    #[test]
    fn untouched_edit_form_yields_empty_patch() {
        let form = EventFormState::edit(stored(), &options());
        assert_eq!(form.editing_id(), Some("i1"));
        assert_eq!(form.contact.query, "Ada Lovelace");
        assert!(form.patch(&options()).unwrap().is_empty());
    }

    #[test]
    fn options_arriving_mid_edit_keep_the_contact() {
        let form = EventFormState::edit(stored(), &PickerOptions::default());
        assert_eq!(form.contact.query, "");
        assert!(form.patch(&options()).unwrap().is_empty());
    }

    #[test]
    fn edit_patch_carries_only_changes() {
        let mut form = EventFormState::edit(stored(), &options());
        form.title = "Kickoff (moved)".into();
        form.end_time = "11:30".into();
        form.active_field = FormField::Contact;
        form.contact = Autocomplete::default();
        for c in "hopper".chars() {
            form.input_char(c);
        }

        let patch = form.patch(&options()).unwrap();
        assert_eq!(
            patch.field_paths(),
            vec!["contact", "meetingStart", "meetingEnd", "name"]
        );
        assert_eq!(patch.contact_id.as_deref(), Some("c2"));
        assert_eq!(patch.start, Some(stored().start));
        assert_eq!(
            patch.end,
            Some(Some(stored().start + Duration::minutes(150)))
        );
    }
}

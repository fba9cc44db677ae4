use chrono::{DateTime, Local, NaiveDate};

use crate::model::Interaction;

/// An interaction as shown on the calendar.
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarEvent {
    /// Id of the backing interaction.
    pub id: String,
    pub title: String,
    pub start: DateTime<Local>,
    pub end: Option<DateTime<Local>>,
    pub is_all_day: bool,
    pub kind: String,
    pub notes: String,
    pub contact_name: Option<String>,
}

impl CalendarEvent {
    /// Project an interaction. The title falls back to "Meeting with <contact>"
    /// and an interaction without an end time is all-day.
    pub fn project(interaction: &Interaction, contact_name: Option<&str>) -> Self {
        let title = if interaction.title.is_empty() {
            default_title(contact_name)
        } else {
            interaction.title.clone()
        };
        Self {
            id: interaction.id.clone(),
            title,
            start: interaction.start.with_timezone(&Local),
            end: interaction.end.map(|e| e.with_timezone(&Local)),
            is_all_day: interaction.end.is_none(),
            kind: interaction.kind.clone(),
            notes: interaction.notes.clone(),
            contact_name: contact_name.map(str::to_string),
        }
    }

    pub fn duration_display(&self) -> String {
        match self.end {
            Some(end) if !self.is_all_day => {
                format!("{} - {}", self.start.format("%H:%M"), end.format("%H:%M"))
            }
            _ => "All day".to_string(),
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.start.date_naive()
    }

    /// True when the event covers any part of `date`.
    pub fn occurs_on(&self, date: NaiveDate) -> bool {
        let first = self.start.date_naive();
        let last = self.end.map(|e| e.date_naive()).unwrap_or(first).max(first);
        first <= date && date <= last
    }
}

pub fn default_title(contact_name: Option<&str>) -> String {
    match contact_name {
        Some(name) if !name.trim().is_empty() => format!("Meeting with {}", name),
        _ => "Meeting".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NewInteraction;
    use chrono::{Duration, TimeZone, Utc};

    fn interaction(title: &str, end: Option<i64>) -> Interaction {
        let start = Utc.with_ymd_and_hms(2024, 1, 10, 9, 0, 0).unwrap();
        NewInteraction {
            org_id: "acme".into(),
            contact_id: "c1".into(),
            owner_id: "u1".into(),
            deal_id: String::new(),
            task_id: String::new(),
            start,
            end: end.map(|h| start + Duration::hours(h)),
            kind: String::new(),
            notes: String::new(),
            title: title.into(),
            remind_me: true,
            participants: vec![],
        }
        .with_id("i1".into())
    }

    #[test]
    fn untitled_interaction_is_named_after_contact() {
        let ev = CalendarEvent::project(&interaction("", Some(1)), Some("Grace Hopper"));
        assert_eq!(ev.title, "Meeting with Grace Hopper");
        assert_eq!(ev.id, "i1");
        assert!(!ev.is_all_day);
    }

    #[test]
    fn explicit_title_wins() {
        let ev = CalendarEvent::project(&interaction("Quarterly review", Some(1)), Some("Grace"));
        assert_eq!(ev.title, "Quarterly review");
    }

    #[test]
    fn blank_but_present_title_is_kept() {
        let ev = CalendarEvent::project(&interaction("  ", Some(1)), Some("Grace Hopper"));
        assert_eq!(ev.title, "  ");
    }

    #[test]
    fn missing_end_means_all_day() {
        let ev = CalendarEvent::project(&interaction("", None), None);
        assert!(ev.is_all_day);
        assert_eq!(ev.title, "Meeting");
        assert_eq!(ev.duration_display(), "All day");
        assert!(ev.occurs_on(ev.date()));
        assert!(!ev.occurs_on(ev.date().succ_opt().unwrap()));
    }
}

use chrono::{DateTime, Utc};

/// Whether an interaction still shows on the calendar.
///
/// Stored remotely as the `remindMe` flag; "deleting" an event from the
/// calendar moves it to `Dismissed` and keeps the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Active,
    Dismissed,
}

impl From<bool> for Lifecycle {
    fn from(remind_me: bool) -> Self {
        if remind_me {
            Lifecycle::Active
        } else {
            Lifecycle::Dismissed
        }
    }
}

/// A scheduled meeting or call with a contact.
#[derive(Debug, Clone, PartialEq)]
pub struct Interaction {
    pub id: String,
    pub org_id: String,
    pub contact_id: String,
    pub owner_id: String,
    pub deal_id: String,
    pub task_id: String,
    pub start: DateTime<Utc>,
    /// `None` marks an all-day interaction.
    pub end: Option<DateTime<Utc>>,
    pub kind: String,
    pub notes: String,
    pub title: String,
    pub remind_me: bool,
    pub participants: Vec<String>,
}

impl Interaction {
    pub fn lifecycle(&self) -> Lifecycle {
        Lifecycle::from(self.remind_me)
    }

    pub fn is_all_day(&self) -> bool {
        self.end.is_none()
    }
}

/// Fields of an interaction about to be created; the store assigns the id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewInteraction {
    pub org_id: String,
    pub contact_id: String,
    pub owner_id: String,
    pub deal_id: String,
    pub task_id: String,
    pub start: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
    pub kind: String,
    pub notes: String,
    pub title: String,
    pub remind_me: bool,
    pub participants: Vec<String>,
}

impl NewInteraction {
    pub fn with_id(self, id: String) -> Interaction {
        Interaction {
            id,
            org_id: self.org_id,
            contact_id: self.contact_id,
            owner_id: self.owner_id,
            deal_id: self.deal_id,
            task_id: self.task_id,
            start: self.start,
            end: self.end,
            kind: self.kind,
            notes: self.notes,
            title: self.title,
            remind_me: self.remind_me,
            participants: self.participants,
        }
    }
}

/// Partial update of an interaction. Only `Some` fields are written.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InteractionPatch {
    pub start: Option<DateTime<Utc>>,
    /// `Some(None)` clears the end time, turning the interaction all-day.
    pub end: Option<Option<DateTime<Utc>>>,
    pub title: Option<String>,
    pub kind: Option<String>,
    pub notes: Option<String>,
    pub contact_id: Option<String>,
    pub deal_id: Option<String>,
    pub task_id: Option<String>,
    pub remind_me: Option<bool>,
}

impl InteractionPatch {
    /// New start/end and nothing else, as produced by a move or resize.
    pub fn reschedule(start: DateTime<Utc>, end: Option<DateTime<Utc>>) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
            ..Default::default()
        }
    }

    /// Soft delete: hide from the calendar but keep the record.
    pub fn dismiss() -> Self {
        Self {
            remind_me: Some(false),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.field_paths().is_empty()
    }

    /// Remote field names touched by this patch.
    pub fn field_paths(&self) -> Vec<&'static str> {
        let mut paths = Vec::new();
        if self.contact_id.is_some() {
            paths.push("contact");
        }
        if self.deal_id.is_some() {
            paths.push("deal");
        }
        if self.task_id.is_some() {
            paths.push("task");
        }
        if self.start.is_some() {
            paths.push("meetingStart");
        }
        if self.end.is_some() {
            paths.push("meetingEnd");
        }
        if self.kind.is_some() {
            paths.push("type");
        }
        if self.notes.is_some() {
            paths.push("notes");
        }
        if self.title.is_some() {
            paths.push("name");
        }
        if self.remind_me.is_some() {
            paths.push("remindMe");
        }
        paths
    }

    pub fn apply_to(&self, interaction: &mut Interaction) {
        if let Some(ref v) = self.contact_id {
            interaction.contact_id = v.clone();
        }
        if let Some(ref v) = self.deal_id {
            interaction.deal_id = v.clone();
        }
        if let Some(ref v) = self.task_id {
            interaction.task_id = v.clone();
        }
        if let Some(v) = self.start {
            interaction.start = v;
        }
        if let Some(v) = self.end {
            interaction.end = v;
        }
        if let Some(ref v) = self.kind {
            interaction.kind = v.clone();
        }
        if let Some(ref v) = self.notes {
            interaction.notes = v.clone();
        }
        if let Some(ref v) = self.title {
            interaction.title = v.clone();
        }
        if let Some(v) = self.remind_me {
            interaction.remind_me = v;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> Interaction {
        NewInteraction {
            org_id: "org".into(),
            contact_id: "c1".into(),
            owner_id: "u1".into(),
            deal_id: String::new(),
            task_id: String::new(),
            start: Utc.with_ymd_and_hms(2024, 1, 10, 9, 0, 0).unwrap(),
            end: None,
            kind: "Call".into(),
            notes: String::new(),
            title: String::new(),
            remind_me: true,
            participants: vec!["u1".into()],
        }
        .with_id("i1".into())
    }

    #[test]
    fn reschedule_touches_only_start_and_end() {
        let start = Utc.with_ymd_and_hms(2024, 1, 11, 9, 0, 0).unwrap();
        let patch = InteractionPatch::reschedule(start, None);
        assert_eq!(patch.field_paths(), vec!["meetingStart", "meetingEnd"]);

        let mut i = sample();
        let before = i.clone();
        patch.apply_to(&mut i);
        assert_eq!(i.start, start);
        assert_eq!(i.kind, before.kind);
        assert_eq!(i.remind_me, before.remind_me);
    }

    #[test]
    fn dismiss_flips_lifecycle() {
        let mut i = sample();
        assert_eq!(i.lifecycle(), Lifecycle::Active);
        InteractionPatch::dismiss().apply_to(&mut i);
        assert_eq!(i.lifecycle(), Lifecycle::Dismissed);
    }

    #[test]
    fn empty_patch_has_no_paths() {
        assert!(InteractionPatch::default().is_empty());
    }
}

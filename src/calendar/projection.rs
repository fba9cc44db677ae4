use std::collections::HashSet;

use chrono::{Datelike, NaiveDate};

use super::CalendarEvent;

/// The events currently on the calendar, keyed by interaction id and kept
/// in insertion order.
#[derive(Debug, Default)]
pub struct ProjectionCache {
    events: Vec<CalendarEvent>,
}

impl ProjectionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Replace the event with the same id in place, or append it.
    pub fn upsert(&mut self, event: CalendarEvent) {
        match self.position(&event.id) {
            Some(idx) => self.events[idx] = event,
            None => self.events.push(event),
        }
    }

    /// Remove by id, returning the old position for a later `restore`.
    pub fn remove(&mut self, id: &str) -> Option<(usize, CalendarEvent)> {
        let idx = self.position(id)?;
        Some((idx, self.events.remove(idx)))
    }

    /// Put a removed event back where it was. No-op if the id came back
    /// in the meantime.
    pub fn restore(&mut self, position: usize, event: CalendarEvent) {
        if self.position(&event.id).is_some() {
            return;
        }
        let idx = position.min(self.events.len());
        self.events.insert(idx, event);
    }

    pub fn get(&self, id: &str) -> Option<&CalendarEvent> {
        self.events.iter().find(|e| e.id == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut CalendarEvent> {
        self.events.iter_mut().find(|e| e.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CalendarEvent> {
        self.events.iter()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Events touching `date`, all-day first, then by start time.
    pub fn events_on(&self, date: NaiveDate) -> Vec<&CalendarEvent> {
        let mut out: Vec<&CalendarEvent> =
            self.events.iter().filter(|e| e.occurs_on(date)).collect();
        out.sort_by_key(|e| (!e.is_all_day, e.start));
        out
    }

    /// Events touching any day in `first..=last`, ordered by start.
    pub fn events_between(&self, first: NaiveDate, last: NaiveDate) -> Vec<&CalendarEvent> {
        let mut out: Vec<&CalendarEvent> = self
            .events
            .iter()
            .filter(|e| {
                let start = e.start.date_naive();
                let end = e.end.map(|d| d.date_naive()).unwrap_or(start).max(start);
                start <= last && end >= first
            })
            .collect();
        out.sort_by_key(|e| e.start);
        out
    }

    /// Days of `year`/`month` that have at least one event starting on them.
    pub fn days_with_events(&self, year: i32, month: u32) -> HashSet<u32> {
        self.events
            .iter()
            .map(|e| e.start.date_naive())
            .filter(|d| d.year() == year && d.month() == month)
            .map(|d| d.day())
            .collect()
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.events.iter().position(|e| e.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Local, TimeZone};

    fn event(id: &str, day: u32, hour: u32, all_day: bool) -> CalendarEvent {
        let start = Local.with_ymd_and_hms(2024, 1, day, hour, 0, 0).unwrap();
        CalendarEvent {
            id: id.into(),
            title: id.into(),
            start,
            end: (!all_day).then(|| start + chrono::Duration::hours(1)),
            is_all_day: all_day,
            kind: String::new(),
            notes: String::new(),
            contact_name: None,
        }
    }

    #[test]
    fn upsert_replaces_in_place() {
        let mut cache = ProjectionCache::new();
        cache.upsert(event("a", 10, 9, false));
        cache.upsert(event("b", 10, 8, false));
        let mut renamed = event("a", 10, 9, false);
        renamed.title = "renamed".into();
        cache.upsert(renamed);

        let ids: Vec<&str> = cache.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(cache.get("a").unwrap().title, "renamed");
    }

    #[test]
    fn restore_returns_event_to_its_slot() {
        let mut cache = ProjectionCache::new();
        for id in ["a", "b", "c"] {
            cache.upsert(event(id, 10, 9, false));
        }
        let (pos, removed) = cache.remove("b").unwrap();
        assert_eq!(cache.len(), 2);
        cache.restore(pos, removed.clone());
        let ids: Vec<&str> = cache.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);

        cache.restore(pos, removed);
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn day_listing_puts_all_day_first() {
        let mut cache = ProjectionCache::new();
        cache.upsert(event("late", 10, 15, false));
        cache.upsert(event("early", 10, 8, false));
        cache.upsert(event("holiday", 10, 0, true));
        cache.upsert(event("other-day", 11, 8, false));

        let date = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        let ids: Vec<&str> = cache.events_on(date).iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["holiday", "early", "late"]);
        assert_eq!(cache.days_with_events(2024, 1), [10, 11].into_iter().collect());
    }
}

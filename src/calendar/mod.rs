pub mod controller;
pub mod event;
pub mod projection;
pub mod time;

pub use controller::{CalendarController, CalendarUpdate, EventDraft, PickerOptions};
pub use event::CalendarEvent;
pub use projection::ProjectionCache;

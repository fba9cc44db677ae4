pub mod autocomplete;
pub mod contact_form;
pub mod contact_table;
pub mod day_view;
pub mod event_form;
pub mod month_view;
pub mod status_bar;
pub mod week_view;

pub use contact_form::{ContactForm, ContactFormState};
pub use contact_table::ContactTable;
pub use day_view::DayView;
pub use event_form::{EventForm, EventFormState};
pub use month_view::MonthView;
pub use status_bar::StatusBar;
pub use week_view::WeekView;

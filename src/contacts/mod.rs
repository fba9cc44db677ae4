pub mod controller;
pub mod export;

pub use controller::{ContactsController, ContactsUpdate, PendingRow};

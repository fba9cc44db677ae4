pub mod contact;
pub mod directory;
pub mod interaction;

pub use contact::{Contact, ContactPatch, NewContact};
pub use directory::{options, Deal, LabeledOption, Labeled, Task};
pub use interaction::{Interaction, InteractionPatch, Lifecycle, NewInteraction};

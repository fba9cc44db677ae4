use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use super::event_form::render_field;
use crate::error::FormError;
use crate::model::{Contact, ContactPatch, NewContact};
use crate::theme;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ContactField {
    Name,
    Company,
    Position,
    Email,
    Phone,
    Notes,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ContactFormMode {
    /// New table row. Notes are only editable on existing contacts.
    Add,
    Edit(Box<Contact>),
}

#[derive(Debug, Clone)]
pub struct ContactFormState {
    pub mode: ContactFormMode,
    pub name: String,
    pub company: String,
    pub position: String,
    pub email: String,
    pub phone: String,
    pub notes: String,
    pub active_field: ContactField,
    pub error: Option<String>,
}

impl ContactFormState {
    pub fn add() -> Self {
        Self {
            mode: ContactFormMode::Add,
            name: String::new(),
            company: String::new(),
            position: String::new(),
            email: String::new(),
            phone: String::new(),
            notes: String::new(),
            active_field: ContactField::Name,
            error: None,
        }
    }

    pub fn edit(contact: &Contact) -> Self {
        Self {
            name: contact.name.clone(),
            company: contact.company.clone(),
            position: contact.position.clone(),
            email: contact.email.clone(),
            phone: contact.phone.clone(),
            notes: contact.notes.clone(),
            active_field: ContactField::Name,
            error: None,
            mode: ContactFormMode::Edit(Box::new(contact.clone())),
        }
    }

    fn fields(&self) -> &'static [ContactField] {
        use ContactField::*;
        match self.mode {
            ContactFormMode::Add => &[Name, Company, Position, Email, Phone],
            ContactFormMode::Edit(_) => &[Name, Company, Position, Email, Phone, Notes],
        }
    }

    pub fn next_field(&mut self) {
        let fields = self.fields();
        let idx = fields.iter().position(|f| *f == self.active_field).unwrap_or(0);
        self.active_field = fields[(idx + 1) % fields.len()];
    }

    pub fn prev_field(&mut self) {
        let fields = self.fields();
        let idx = fields.iter().position(|f| *f == self.active_field).unwrap_or(0);
        self.active_field = fields[(idx + fields.len() - 1) % fields.len()];
    }

    fn active_value(&mut self) -> &mut String {
        match self.active_field {
            ContactField::Name => &mut self.name,
            ContactField::Company => &mut self.company,
            ContactField::Position => &mut self.position,
            ContactField::Email => &mut self.email,
            ContactField::Phone => &mut self.phone,
            ContactField::Notes => &mut self.notes,
        }
    }

    pub fn input_char(&mut self, c: char) {
        self.active_value().push(c);
    }

    pub fn backspace(&mut self) {
        self.active_value().pop();
    }

    /// Row to add. A contact needs at least a name.
    pub fn record(&self) -> Result<NewContact, FormError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(FormError::MissingName);
        }
        Ok(NewContact {
            name: name.to_string(),
            company: self.company.trim().to_string(),
            position: self.position.trim().to_string(),
            email: self.email.trim().to_string(),
            phone: self.phone.trim().to_string(),
        })
    }

    /// Id of the contact being edited and the fields that changed.
    pub fn patch(&self) -> Result<Option<(String, ContactPatch)>, FormError> {
        let ContactFormMode::Edit(ref original) = self.mode else {
            return Ok(None);
        };
        let record = self.record()?;
        let edited = Contact {
            notes: self.notes.clone(),
            ..record.into_contact(original.id.clone(), original.org_id.clone())
        };
        Ok(Some((original.id.clone(), ContactPatch::diff(original, &edited))))
    }
}

pub struct ContactForm;

impl ContactForm {
    pub fn render(frame: &mut Frame, area: Rect, state: &ContactFormState) {
        let form_w = area.width.min(56).max(30);
        let form_h = area.height.min(12).max(10);
        let x = area.x + (area.width.saturating_sub(form_w)) / 2;
        let y = area.y + (area.height.saturating_sub(form_h)) / 2;
        let form_area = Rect::new(x, y, form_w, form_h);

        frame.render_widget(Clear, form_area);

        let title = match state.mode {
            ContactFormMode::Add => " New Contact ",
            ContactFormMode::Edit(_) => " Edit Contact ",
        };
        let block = Block::default()
            .title(title)
            .title_style(Style::default().fg(Color::Green).add_modifier(Modifier::BOLD))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Green));

        let inner = block.inner(form_area);
        frame.render_widget(block, form_area);

        let rows = Layout::vertical([Constraint::Length(1); 9]).split(inner);

        let fields = [
            (ContactField::Name, "Name:", &state.name),
            (ContactField::Company, "Company:", &state.company),
            (ContactField::Position, "Position:", &state.position),
            (ContactField::Email, "Email:", &state.email),
            (ContactField::Phone, "Phone:", &state.phone),
            (ContactField::Notes, "Notes:", &state.notes),
        ];
        for (i, field) in state.fields().iter().enumerate() {
            if let Some((_, label, value)) = fields.iter().find(|(f, _, _)| f == field) {
                render_field(frame, rows[i], label, value, state.active_field == *field);
            }
        }

        if let Some(ref err) = state.error {
            frame.render_widget(
                Paragraph::new(Span::styled(err.as_str(), theme::current().error)),
                rows[7],
            );
        }

        let help = Line::from(vec![
            Span::styled("Tab", Style::default().add_modifier(Modifier::BOLD)),
            Span::styled(":Next ", theme::current().dim),
            Span::styled("Enter", Style::default().add_modifier(Modifier::BOLD)),
            Span::styled(":Save ", theme::current().dim),
            Span::styled("Esc", Style::default().add_modifier(Modifier::BOLD)),
            Span::styled(":Cancel", theme::current().dim),
        ]);
        frame.render_widget(Paragraph::new(help), rows[8]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn add_requires_a_name() {
        let mut form = ContactFormState::add();
        form.active_field = ContactField::Company;
        form.input_char('X');
        assert_eq!(form.record(), Err(FormError::MissingName));

        form.name = "  Grace Hopper ".into();
        let record = form.record().unwrap();
        assert_eq!(record.name, "Grace Hopper");
        assert_eq!(record.company, "X");
    }

    #[test]
    fn add_form_skips_notes() {
        let mut form = ContactFormState::add();
        form.active_field = ContactField::Phone;
        form.next_field();
        assert_eq!(form.active_field, ContactField::Name);
        form.prev_field();
        assert_eq!(form.active_field, ContactField::Phone);
    }

    #[test]
    fn edit_patch_holds_changed_fields() {
        let contact = Contact {
            id: "c1".into(),
            org_id: "acme".into(),
            name: "Ada Lovelace".into(),
            email: "ada@example.com".into(),
            notes: "met at the fair".into(),
            ..Default::default()
        };
        let mut form = ContactFormState::edit(&contact);
        form.active_field = ContactField::Notes;
        form.backspace();
        form.phone = "555-0100".into();

        let (id, patch) = form.patch().unwrap().unwrap();
        assert_eq!(id, "c1");
        assert_eq!(patch.field_paths(), vec!["phoneNumber", "notes"]);
        assert_eq!(patch.notes.as_deref(), Some("met at the fai"));
    }
}

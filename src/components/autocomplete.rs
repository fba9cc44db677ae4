use crate::model::LabeledOption;

/// Type-to-filter picker over a list of options. An empty query means
/// nothing is chosen.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Autocomplete {
    pub query: String,
    cursor: usize,
}

impl Autocomplete {
    /// Start with `id` chosen, if it is among `options`.
    pub fn preset(options: &[LabeledOption], id: &str) -> Self {
        let query = options
            .iter()
            .find(|o| o.id == id)
            .map(|o| o.label.clone())
            .unwrap_or_default();
        let mut picker = Self { query, cursor: 0 };
        if let Some(pos) = picker.matches(options).iter().position(|o| o.id == id) {
            picker.cursor = pos;
        }
        picker
    }

    pub fn matches<'a>(&self, options: &'a [LabeledOption]) -> Vec<&'a LabeledOption> {
        let query = self.query.trim().to_lowercase();
        if query.is_empty() {
            return Vec::new();
        }
        options
            .iter()
            .filter(|o| o.label.to_lowercase().contains(&query))
            .collect()
    }

    pub fn selected<'a>(&self, options: &'a [LabeledOption]) -> Option<&'a LabeledOption> {
        let matches = self.matches(options);
        matches.get(self.cursor.min(matches.len().saturating_sub(1))).copied()
    }

    pub fn selected_id(&self, options: &[LabeledOption]) -> String {
        self.selected(options)
            .map(|o| o.id.clone())
            .unwrap_or_default()
    }

    pub fn push(&mut self, c: char) {
        self.query.push(c);
        self.cursor = 0;
    }

    pub fn pop(&mut self) {
        self.query.pop();
        self.cursor = 0;
    }

    /// Move to the next match, wrapping around.
    pub fn cycle(&mut self, options: &[LabeledOption]) {
        let n = self.matches(options).len();
        if n > 0 {
            self.cursor = (self.cursor + 1) % n;
        }
    }

    /// What the form shows: the query and the option it resolves to.
    pub fn display(&self, options: &[LabeledOption]) -> String {
        match self.selected(options) {
            Some(o) if o.label == self.query => o.label.clone(),
            Some(o) => format!("{} \u{2192} {}", self.query, o.label),
            None if self.query.is_empty() => String::new(),
            None => format!("{} (no match)", self.query),
        }
    }
}

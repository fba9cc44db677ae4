use super::Contact;

#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    pub id: String,
    pub org_id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Deal {
    pub id: String,
    pub org_id: String,
    pub name: String,
}

/// Autocomplete entry for the interaction forms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabeledOption {
    pub id: String,
    pub label: String,
}

/// Records that can be offered in an autocomplete picker.
pub trait Labeled {
    fn id(&self) -> &str;
    fn label(&self) -> &str;
}

impl Labeled for Contact {
    fn id(&self) -> &str {
        &self.id
    }
    fn label(&self) -> &str {
        &self.name
    }
}

impl Labeled for Task {
    fn id(&self) -> &str {
        &self.id
    }
    fn label(&self) -> &str {
        &self.name
    }
}

impl Labeled for Deal {
    fn id(&self) -> &str {
        &self.id
    }
    fn label(&self) -> &str {
        &self.name
    }
}

/// Build picker options from fetched records without touching them.
pub fn options<T: Labeled>(items: &[T]) -> Vec<LabeledOption> {
    items
        .iter()
        .map(|item| LabeledOption {
            id: item.id().to_string(),
            label: item.label().to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_copy_name_into_label() {
        let deals = vec![Deal {
            id: "d1".into(),
            org_id: "org".into(),
            name: "Renewal".into(),
        }];
        let opts = options(&deals);
        assert_eq!(
            opts,
            vec![LabeledOption {
                id: "d1".into(),
                label: "Renewal".into()
            }]
        );
        assert_eq!(deals[0].name, "Renewal");
    }
}

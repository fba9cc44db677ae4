/// A person the organization deals with.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Contact {
    pub id: String,
    pub org_id: String,
    pub name: String,
    pub company: String,
    pub position: String,
    pub email: String,
    pub phone: String,
    pub notes: String,
}

impl Contact {
    /// Case-insensitive substring match over the visible columns.
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return true;
        }
        [
            &self.name,
            &self.company,
            &self.position,
            &self.email,
            &self.phone,
        ]
        .iter()
        .any(|field| field.to_lowercase().contains(&query))
    }
}

/// Row entered in the contacts table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewContact {
    pub name: String,
    pub company: String,
    pub position: String,
    pub email: String,
    pub phone: String,
}

impl NewContact {
    pub fn into_contact(self, id: String, org_id: String) -> Contact {
        Contact {
            id,
            org_id,
            name: self.name,
            company: self.company,
            position: self.position,
            email: self.email,
            phone: self.phone,
            notes: String::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContactPatch {
    pub name: Option<String>,
    pub company: Option<String>,
    pub position: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub notes: Option<String>,
}

impl ContactPatch {
    /// Patch holding every field of `edited` that differs from `original`.
    pub fn diff(original: &Contact, edited: &Contact) -> Self {
        fn changed(a: &str, b: &str) -> Option<String> {
            (a != b).then(|| b.to_string())
        }
        Self {
            name: changed(&original.name, &edited.name),
            company: changed(&original.company, &edited.company),
            position: changed(&original.position, &edited.position),
            email: changed(&original.email, &edited.email),
            phone: changed(&original.phone, &edited.phone),
            notes: changed(&original.notes, &edited.notes),
        }
    }

    pub fn field_paths(&self) -> Vec<&'static str> {
        let mut paths = Vec::new();
        if self.name.is_some() {
            paths.push("name");
        }
        if self.company.is_some() {
            paths.push("company");
        }
        if self.position.is_some() {
            paths.push("position");
        }
        if self.email.is_some() {
            paths.push("email");
        }
        if self.phone.is_some() {
            paths.push("phoneNumber");
        }
        if self.notes.is_some() {
            paths.push("notes");
        }
        paths
    }

    pub fn is_empty(&self) -> bool {
        self.field_paths().is_empty()
    }

    pub fn apply_to(&self, contact: &mut Contact) {
        let fields = [
            (&self.name, &mut contact.name),
            (&self.company, &mut contact.company),
            (&self.position, &mut contact.position),
            (&self.email, &mut contact.email),
            (&self.phone, &mut contact.phone),
            (&self.notes, &mut contact.notes),
        ];
        for (value, slot) in fields {
            if let Some(v) = value {
                *slot = v.clone();
            }
        }
    }
}

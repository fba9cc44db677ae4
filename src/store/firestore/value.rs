//! Typed Firestore REST values and the document <-> model mapping.

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{StoreError, StoreResult};
use crate::model::{
    Contact, ContactPatch, Deal, Interaction, InteractionPatch, NewContact, NewInteraction, Task,
};

/// A single field value in the REST encoding, e.g. `{"stringValue": "x"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Value {
    NullValue(()),
    BooleanValue(bool),
    /// int64 travels as a decimal string.
    IntegerValue(String),
    DoubleValue(f64),
    TimestampValue(String),
    StringValue(String),
    BytesValue(String),
    ReferenceValue(String),
    GeoPointValue(serde_json::Value),
    ArrayValue(ArrayValue),
    MapValue(MapValue),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArrayValue {
    #[serde(default)]
    pub values: Vec<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MapValue {
    #[serde(default)]
    pub fields: BTreeMap<String, Value>,
}

impl Value {
    pub fn string(s: impl Into<String>) -> Self {
        Value::StringValue(s.into())
    }

    pub fn timestamp(t: DateTime<Utc>) -> Self {
        Value::TimestampValue(t.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn optional_timestamp(t: Option<DateTime<Utc>>) -> Self {
        t.map(Value::timestamp).unwrap_or(Value::NullValue(()))
    }

    pub fn strings(items: &[String]) -> Self {
        Value::ArrayValue(ArrayValue {
            values: items.iter().cloned().map(Value::StringValue).collect(),
        })
    }
}

pub type Fields = BTreeMap<String, Value>;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Full resource name, `projects/../documents/<collection>/<id>`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default)]
    pub fields: Fields,
}

impl Document {
    pub fn id(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or_default()
    }

    /// Text field; missing, null and non-string values read as empty.
    /// Document references read as the referenced id.
    fn text(&self, key: &str) -> String {
        match self.fields.get(key) {
            Some(Value::StringValue(s)) => s.clone(),
            Some(Value::ReferenceValue(r)) => r.rsplit('/').next().unwrap_or_default().to_string(),
            Some(Value::IntegerValue(n)) => n.clone(),
            _ => String::new(),
        }
    }

    fn flag(&self, key: &str) -> bool {
        matches!(self.fields.get(key), Some(Value::BooleanValue(true)))
    }

    fn instant(&self, key: &str) -> StoreResult<Option<DateTime<Utc>>> {
        match self.fields.get(key) {
            None | Some(Value::NullValue(())) => Ok(None),
            Some(Value::TimestampValue(s)) => DateTime::parse_from_rfc3339(s)
                .map(|t| Some(t.with_timezone(&Utc)))
                .map_err(|e| StoreError::malformed(&self.name, format!("{key}: {e}"))),
            Some(other) => Err(StoreError::malformed(
                &self.name,
                format!("{key}: expected timestamp, got {other:?}"),
            )),
        }
    }

    fn text_list(&self, key: &str) -> Vec<String> {
        match self.fields.get(key) {
            Some(Value::ArrayValue(a)) => a
                .values
                .iter()
                .filter_map(|v| match v {
                    Value::StringValue(s) => Some(s.clone()),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        }
    }
}

pub fn interaction_fields(new: &NewInteraction) -> Fields {
    let mut f = Fields::new();
    f.insert("org".into(), Value::string(&new.org_id));
    f.insert("contact".into(), Value::string(&new.contact_id));
    f.insert("owner".into(), Value::string(&new.owner_id));
    f.insert("deal".into(), Value::string(&new.deal_id));
    f.insert("task".into(), Value::string(&new.task_id));
    f.insert("meetingStart".into(), Value::timestamp(new.start));
    f.insert("meetingEnd".into(), Value::optional_timestamp(new.end));
    f.insert("type".into(), Value::string(&new.kind));
    f.insert("notes".into(), Value::string(&new.notes));
    f.insert("name".into(), Value::string(&new.title));
    f.insert("remindMe".into(), Value::BooleanValue(new.remind_me));
    f.insert("participants".into(), Value::strings(&new.participants));
    f
}

/// Values for the fields set in `patch`; keys match `patch.field_paths()`.
pub fn interaction_patch_fields(patch: &InteractionPatch) -> Fields {
    let mut f = Fields::new();
    if let Some(ref v) = patch.contact_id {
        f.insert("contact".into(), Value::string(v));
    }
    if let Some(ref v) = patch.deal_id {
        f.insert("deal".into(), Value::string(v));
    }
    if let Some(ref v) = patch.task_id {
        f.insert("task".into(), Value::string(v));
    }
    if let Some(v) = patch.start {
        f.insert("meetingStart".into(), Value::timestamp(v));
    }
    if let Some(v) = patch.end {
        f.insert("meetingEnd".into(), Value::optional_timestamp(v));
    }
    if let Some(ref v) = patch.kind {
        f.insert("type".into(), Value::string(v));
    }
    if let Some(ref v) = patch.notes {
        f.insert("notes".into(), Value::string(v));
    }
    if let Some(ref v) = patch.title {
        f.insert("name".into(), Value::string(v));
    }
    if let Some(v) = patch.remind_me {
        f.insert("remindMe".into(), Value::BooleanValue(v));
    }
    f
}

pub fn interaction_from(doc: &Document) -> StoreResult<Interaction> {
    let start = doc
        .instant("meetingStart")?
        .ok_or_else(|| StoreError::malformed(&doc.name, "missing meetingStart"))?;
    Ok(Interaction {
        id: doc.id().to_string(),
        org_id: doc.text("org"),
        contact_id: doc.text("contact"),
        owner_id: doc.text("owner"),
        deal_id: doc.text("deal"),
        task_id: doc.text("task"),
        start,
        end: doc.instant("meetingEnd")?,
        kind: doc.text("type"),
        notes: doc.text("notes"),
        title: doc.text("name"),
        remind_me: doc.flag("remindMe"),
        participants: doc.text_list("participants"),
    })
}

/// Decode a query result. A malformed document is logged and left out so
/// the rest of the organization's interactions still load.
pub fn interactions_from(docs: &[Document]) -> Vec<Interaction> {
    docs.iter()
        .filter_map(|doc| match interaction_from(doc) {
            Ok(interaction) => Some(interaction),
            Err(e) => {
                warn!(doc = %doc.name, error = %e, "skipping malformed interaction");
                None
            }
        })
        .collect()
}

pub fn contact_fields(org_id: &str, new: &NewContact) -> Fields {
    let mut f = Fields::new();
    f.insert("org".into(), Value::string(org_id));
    f.insert("name".into(), Value::string(&new.name));
    f.insert("company".into(), Value::string(&new.company));
    f.insert("position".into(), Value::string(&new.position));
    f.insert("email".into(), Value::string(&new.email));
    f.insert("phoneNumber".into(), Value::string(&new.phone));
    f
}

pub fn contact_patch_fields(patch: &ContactPatch) -> Fields {
    let entries = [
        ("name", &patch.name),
        ("company", &patch.company),
        ("position", &patch.position),
        ("email", &patch.email),
        ("phoneNumber", &patch.phone),
        ("notes", &patch.notes),
    ];
    entries
        .into_iter()
        .filter_map(|(key, value)| value.as_ref().map(|v| (key.to_string(), Value::string(v))))
        .collect()
}

pub fn contact_from(doc: &Document) -> Contact {
    Contact {
        id: doc.id().to_string(),
        org_id: doc.text("org"),
        name: doc.text("name"),
        company: doc.text("company"),
        position: doc.text("position"),
        email: doc.text("email"),
        phone: doc.text("phoneNumber"),
        notes: doc.text("notes"),
    }
}

pub fn task_from(doc: &Document) -> Task {
    Task {
        id: doc.id().to_string(),
        org_id: doc.text("org"),
        name: doc.text("name"),
    }
}

pub fn deal_from(doc: &Document) -> Deal {
    Deal {
        id: doc.id().to_string(),
        org_id: doc.text("org"),
        name: doc.text("name"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn decodes_interaction_document() {
        let doc: Document = serde_json::from_value(json!({
            "name": "projects/ripple/databases/(default)/documents/interactions/abc123",
            "fields": {
                "org": {"stringValue": "acme"},
                "contact": {"stringValue": "c1"},
                "owner": {"stringValue": "u1"},
                "meetingStart": {"timestampValue": "2024-01-10T09:00:00Z"},
                "meetingEnd": {"nullValue": null},
                "type": {"stringValue": "Call"},
                "remindMe": {"booleanValue": true},
                "participants": {"arrayValue": {"values": [{"stringValue": "u1"}]}},
                "createdBy": {"mapValue": {"fields": {"uid": {"stringValue": "u1"}}}}
            },
            "createTime": "2024-01-01T00:00:00Z"
        }))
        .unwrap();

        let i = interaction_from(&doc).unwrap();
        assert_eq!(i.id, "abc123");
        assert_eq!(i.start, Utc.with_ymd_and_hms(2024, 1, 10, 9, 0, 0).unwrap());
        assert_eq!(i.end, None);
        assert!(i.remind_me);
        assert_eq!(i.title, "");
        assert_eq!(i.participants, vec!["u1".to_string()]);
    }

    #[test]
    fn missing_start_is_malformed() {
        let doc = Document {
            name: "x/interactions/i1".into(),
            fields: Fields::new(),
        };
        assert!(matches!(
            interaction_from(&doc),
            Err(StoreError::Malformed(..))
        ));
    }

    #[test]
    fn malformed_document_does_not_sink_the_query() {
        let docs: Vec<Document> = serde_json::from_value(json!([
            {
                "name": "x/interactions/good",
                "fields": {
                    "org": {"stringValue": "acme"},
                    "meetingStart": {"timestampValue": "2024-01-10T09:00:00Z"}
                }
            },
            {
                "name": "x/interactions/no-start",
                "fields": {"org": {"stringValue": "acme"}}
            },
            {
                "name": "x/interactions/bad-end",
                "fields": {
                    "meetingStart": {"timestampValue": "2024-01-10T09:00:00Z"},
                    "meetingEnd": {"stringValue": "soon"}
                }
            },
            {
                "name": "x/interactions/also-good",
                "fields": {"meetingStart": {"timestampValue": "2024-01-11T09:00:00Z"}}
            }
        ]))
        .unwrap();

        let ids: Vec<String> = interactions_from(&docs).into_iter().map(|i| i.id).collect();
        assert_eq!(ids, vec!["good", "also-good"]);
    }

    #[test]
    fn encodes_null_end_and_empty_array() {
        assert_eq!(
            serde_json::to_value(Value::optional_timestamp(None)).unwrap(),
            json!({"nullValue": null})
        );
        let empty: Value = serde_json::from_value(json!({"arrayValue": {}})).unwrap();
        assert_eq!(empty, Value::ArrayValue(ArrayValue::default()));
    }

    #[test]
    fn patch_fields_follow_field_paths() {
        let start = Utc.with_ymd_and_hms(2024, 1, 10, 9, 0, 0).unwrap();
        let patch = InteractionPatch::reschedule(start, None);
        let fields = interaction_patch_fields(&patch);
        let keys: Vec<&str> = fields.keys().map(String::as_str).collect();
        let mut paths = patch.field_paths();
        paths.sort();
        assert_eq!(keys, paths);
        assert_eq!(
            serde_json::to_value(&fields["meetingStart"]).unwrap(),
            json!({"timestampValue": "2024-01-10T09:00:00.000Z"})
        );
    }

    #[test]
    fn contact_phone_maps_to_phone_number() {
        let patch = ContactPatch {
            phone: Some("555".into()),
            ..Default::default()
        };
        let fields = contact_patch_fields(&patch);
        assert_eq!(fields.get("phoneNumber"), Some(&Value::string("555")));
        assert_eq!(fields.len(), 1);
    }
}

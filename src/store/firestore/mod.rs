//! Cloud Firestore over its REST API.

pub mod value;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, instrument};

use super::{ContactStore, DealStore, InteractionStore, TaskStore};
use crate::config::FirestoreConfig;
use crate::error::{StoreError, StoreResult};
use crate::model::{
    Contact, ContactPatch, Deal, Interaction, InteractionPatch, NewContact, NewInteraction, Task,
};
use value::{Document, Fields, Value};

const API_ROOT: &str = "https://firestore.googleapis.com/v1";

const INTERACTIONS: &str = "interactions";
const CONTACTS: &str = "contacts";
const TASKS: &str = "tasks";
const DEALS: &str = "deals";

/// Every record carries its organization in this field.
const ORG_FIELD: &str = "org";

pub struct FirestoreStore {
    http: Client,
    /// `projects/<p>/databases/<db>/documents`
    documents: String,
    api_key: Option<String>,
    id_token: Option<String>,
}

#[derive(Deserialize)]
struct RunQueryItem {
    document: Option<Document>,
}

impl FirestoreStore {
    pub fn new(config: &FirestoreConfig) -> StoreResult<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self {
            http,
            documents: format!(
                "projects/{}/databases/{}/documents",
                config.project_id, config.database
            ),
            api_key: config.api_key.clone(),
            id_token: config.id_token.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}/{}", API_ROOT, self.documents, path)
    }

    fn request(&self, method: Method, url: String) -> RequestBuilder {
        let mut req = self.http.request(method, url);
        if let Some(ref key) = self.api_key {
            req = req.query(&[("key", key)]);
        }
        if let Some(ref token) = self.id_token {
            req = req.bearer_auth(token);
        }
        req
    }

    async fn check(resp: Response, collection: &'static str, id: &str) -> StoreResult<Response> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        if status == StatusCode::NOT_FOUND {
            return Err(StoreError::not_found(collection, id));
        }
        let body = resp.text().await.unwrap_or_default();
        Err(StoreError::Status {
            status: status.as_u16(),
            body,
        })
    }

    #[instrument(skip(self, fields))]
    async fn create_document(&self, collection: &'static str, fields: Fields) -> StoreResult<String> {
        let resp = self
            .request(Method::POST, self.url(collection))
            .json(&Document {
                name: String::new(),
                fields,
            })
            .send()
            .await?;
        let doc: Document = Self::check(resp, collection, "").await?.json().await?;
        debug!(id = doc.id(), "created document");
        Ok(doc.id().to_string())
    }

    #[instrument(skip(self))]
    async fn get_document(&self, collection: &'static str, id: &str) -> StoreResult<Document> {
        let resp = self
            .request(Method::GET, self.url(&format!("{collection}/{id}")))
            .send()
            .await?;
        Ok(Self::check(resp, collection, id).await?.json().await?)
    }

    /// All documents of `collection` whose `org` equals `org_id`, in the
    /// order the query returns them.
    #[instrument(skip(self))]
    async fn query_by_org(&self, collection: &'static str, org_id: &str) -> StoreResult<Vec<Document>> {
        let body = json!({
            "structuredQuery": {
                "from": [{ "collectionId": collection }],
                "where": {
                    "fieldFilter": {
                        "field": { "fieldPath": ORG_FIELD },
                        "op": "EQUAL",
                        "value": Value::string(org_id),
                    }
                }
            }
        });
        let url = format!("{}/{}:runQuery", API_ROOT, self.documents);
        let resp = self.request(Method::POST, url).json(&body).send().await?;
        let items: Vec<RunQueryItem> = Self::check(resp, collection, "").await?.json().await?;
        let docs: Vec<Document> = items.into_iter().filter_map(|i| i.document).collect();
        debug!(count = docs.len(), "query returned");
        Ok(docs)
    }

    /// Partial update; fields outside `fields` keep their stored value.
    #[instrument(skip(self, fields))]
    async fn patch_document(
        &self,
        collection: &'static str,
        id: &str,
        fields: Fields,
    ) -> StoreResult<()> {
        let mut params: Vec<(&str, &str)> = fields
            .keys()
            .map(|k| ("updateMask.fieldPaths", k.as_str()))
            .collect();
        params.push(("currentDocument.exists", "true"));

        let resp = self
            .request(Method::PATCH, self.url(&format!("{collection}/{id}")))
            .query(&params)
            .json(&Document {
                name: String::new(),
                fields: fields.clone(),
            })
            .send()
            .await?;
        Self::check(resp, collection, id).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_document(&self, collection: &'static str, id: &str) -> StoreResult<()> {
        let resp = self
            .request(Method::DELETE, self.url(&format!("{collection}/{id}")))
            .send()
            .await?;
        Self::check(resp, collection, id).await?;
        Ok(())
    }
}

#[async_trait]
impl InteractionStore for FirestoreStore {
    async fn create_interaction(&self, new: NewInteraction) -> StoreResult<String> {
        self.create_document(INTERACTIONS, value::interaction_fields(&new))
            .await
    }

    async fn get_interaction(&self, id: &str) -> StoreResult<Interaction> {
        let doc = self.get_document(INTERACTIONS, id).await?;
        value::interaction_from(&doc)
    }

    async fn interactions_by_org(&self, org_id: &str) -> StoreResult<Vec<Interaction>> {
        let docs = self.query_by_org(INTERACTIONS, org_id).await?;
        Ok(value::interactions_from(&docs))
    }

    async fn update_interaction(&self, id: &str, patch: InteractionPatch) -> StoreResult<()> {
        if patch.is_empty() {
            return Ok(());
        }
        self.patch_document(INTERACTIONS, id, value::interaction_patch_fields(&patch))
            .await
    }
}

#[async_trait]
impl ContactStore for FirestoreStore {
    async fn create_contact(&self, org_id: &str, new: NewContact) -> StoreResult<Option<String>> {
        let id = self
            .create_document(CONTACTS, value::contact_fields(org_id, &new))
            .await?;
        Ok(Some(id).filter(|id| !id.is_empty()))
    }

    async fn get_contact(&self, id: &str) -> StoreResult<Contact> {
        let doc = self.get_document(CONTACTS, id).await?;
        Ok(value::contact_from(&doc))
    }

    async fn contacts_by_org(&self, org_id: &str) -> StoreResult<Vec<Contact>> {
        Ok(self
            .query_by_org(CONTACTS, org_id)
            .await?
            .iter()
            .map(value::contact_from)
            .collect())
    }

    async fn update_contact(&self, id: &str, patch: ContactPatch) -> StoreResult<()> {
        if patch.is_empty() {
            return Ok(());
        }
        self.patch_document(CONTACTS, id, value::contact_patch_fields(&patch))
            .await
    }

    async fn delete_contact(&self, id: &str) -> StoreResult<()> {
        self.delete_document(CONTACTS, id).await
    }
}

#[async_trait]
impl TaskStore for FirestoreStore {
    async fn tasks_by_org(&self, org_id: &str) -> StoreResult<Vec<Task>> {
        Ok(self
            .query_by_org(TASKS, org_id)
            .await?
            .iter()
            .map(value::task_from)
            .collect())
    }
}

#[async_trait]
impl DealStore for FirestoreStore {
    async fn deals_by_org(&self, org_id: &str) -> StoreResult<Vec<Deal>> {
        Ok(self
            .query_by_org(DEALS, org_id)
            .await?
            .iter()
            .map(value::deal_from)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> FirestoreStore {
        FirestoreStore::new(&FirestoreConfig {
            project_id: "ripple".into(),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn document_urls_are_scoped_to_the_database() {
        assert_eq!(
            store().url("contacts/c1"),
            "https://firestore.googleapis.com/v1/projects/ripple/databases/(default)/documents/contacts/c1"
        );
    }

    #[test]
    fn run_query_skips_read_time_only_rows() {
        let items: Vec<RunQueryItem> = serde_json::from_str(
            r#"[{"readTime": "2024-01-01T00:00:00Z"},
                {"document": {"name": "p/documents/contacts/c1", "fields": {}}, "readTime": "2024-01-01T00:00:00Z"}]"#,
        )
        .unwrap();
        let docs: Vec<Document> = items.into_iter().filter_map(|i| i.document).collect();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].id(), "c1");
    }
}

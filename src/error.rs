use thiserror::Error;

/// Failure of a call against the remote document store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("store returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("{collection}/{id} not found")]
    NotFound { collection: &'static str, id: String },

    #[error("malformed document {0}: {1}")]
    Malformed(String, String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl StoreError {
    pub fn not_found(collection: &'static str, id: &str) -> Self {
        StoreError::NotFound {
            collection,
            id: id.to_string(),
        }
    }

    pub fn malformed(doc: &str, reason: impl Into<String>) -> Self {
        StoreError::Malformed(doc.to_string(), reason.into())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Validation failure of a popup form. Shown inline; the form stays open.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("name is required")]
    MissingName,
    #[error("invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),
    #[error("invalid time '{0}', expected HH:MM")]
    InvalidTime(String),
    #[error("{0} does not exist in the local time zone")]
    NonexistentLocalTime(String),
    #[error("end time is before start time")]
    EndBeforeStart,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offending_input() {
        assert_eq!(
            StoreError::not_found("interactions", "abc").to_string(),
            "interactions/abc not found"
        );
        assert_eq!(
            FormError::InvalidTime("9:x".into()).to_string(),
            "invalid time '9:x', expected HH:MM"
        );
    }
}

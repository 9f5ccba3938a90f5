//! The backing document.
//!
//! The wiki page is the only source of truth and its only write primitive is
//! "fetch the edit form, inject the full new body, submit". [`DocumentStore`]
//! captures exactly those three calls and nothing about reservations.
//!
//! There is no compare-and-swap: a submit overwrites the whole body with
//! text derived from whatever copy the caller fetched last.

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Name of the edit form field carrying the page body
pub const CONTENT_FIELD: &str = "content";

/// Errors talking to the backing document
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocumentError {
    /// The request never produced a response
    #[error("request failed: {0}")]
    Transport(String),

    /// A read returned something other than success
    #[error("unexpected status {status} from {url}")]
    Status {
        /// HTTP status code
        status: u16,
        /// The URL that was requested
        url: String,
    },

    /// The read endpoint answered with something we could not decode
    #[error("malformed document payload: {0}")]
    Malformed(String),

    /// The edit page did not contain a usable edit form
    #[error("edit form unusable: {0}")]
    EditForm(String),
}

/// Harvested edit form: every field's current value plus where to post it
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EditSession {
    /// Absolute submission URL
    pub action_url: String,
    /// Field name to current value, `cancel` excluded
    pub fields: BTreeMap<String, String>,
}

impl EditSession {
    /// Creates a session from a resolved action URL and harvested fields
    #[must_use]
    pub const fn new(action_url: String, fields: BTreeMap<String, String>) -> Self {
        Self { action_url, fields }
    }

    /// Replaces the content field with `body`
    #[must_use]
    pub fn with_content(mut self, body: String) -> Self {
        self.fields.insert(CONTENT_FIELD.to_string(), body);
        self
    }

    /// Current value of the content field
    #[must_use]
    pub fn content(&self) -> Option<&str> {
        self.fields.get(CONTENT_FIELD).map(String::as_str)
    }
}

/// The three network calls needed to read and overwrite the document
///
/// # Examples
///
/// ```no_run
/// use fe_slots_core::document::DocumentStore;
///
/// async fn touch<D: DocumentStore>(doc: &D) -> Result<bool, Box<dyn std::error::Error>> {
///     let body = doc.fetch_body().await?;
///     let session = doc.fetch_edit_session().await?;
///     Ok(doc.submit(session, body).await?)
/// }
/// ```
pub trait DocumentStore: Send + Sync {
    /// Fetches the current body text of the document.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError`] on transport failure, a non-success
    /// status, or an undecodable payload.
    fn fetch_body(&self) -> Pin<Box<dyn Future<Output = Result<String, DocumentError>> + Send + '_>>;

    /// Fetches the edit view and harvests its form.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError`] on transport failure or when the edit form
    /// or its action cannot be found.
    fn fetch_edit_session(
        &self,
    ) -> Pin<Box<dyn Future<Output = Result<EditSession, DocumentError>> + Send + '_>>;

    /// Submits `body` as the new full document through `session`.
    ///
    /// Resolves to `true` only when the store answered HTTP 200. The
    /// document is not re-read to confirm the change.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::Transport`] when no response was received.
    fn submit(
        &self,
        session: EditSession,
        body: String,
    ) -> Pin<Box<dyn Future<Output = Result<bool, DocumentError>> + Send + '_>>;
}

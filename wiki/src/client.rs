//! Wiki page client implementation

use crate::{error::WikiError, form::parse_edit_form};
use fe_slots_core::document::{DocumentError, DocumentStore, EditSession};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use url::Url;

/// Default per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// The parts of the page's JSON representation we read
#[derive(Debug, Deserialize)]
struct PageDocument {
    body: String,
}

/// Basic-auth client for one wiki page
///
/// Reads go to the page's JSON endpoint, writes go through its edit form.
#[derive(Clone)]
pub struct WikiClient {
    client: Client,
    json_url: Url,
    edit_url: Url,
    user: String,
    password: String,
}

impl WikiClient {
    /// Create a client for the page at `json_url` / `edit_url`
    ///
    /// # Errors
    ///
    /// Returns [`WikiError::InvalidUrl`] if either URL does not parse or is not
    /// http(s), and [`WikiError::RequestFailed`] if the HTTP client cannot be built.
    pub fn new(
        json_url: &str,
        edit_url: &str,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self, WikiError> {
        Self::with_timeout(json_url, edit_url, user, password, DEFAULT_TIMEOUT)
    }

    /// Same as [`WikiClient::new`] with an explicit per-request timeout
    ///
    /// # Errors
    ///
    /// See [`WikiClient::new`].
    pub fn with_timeout(
        json_url: &str,
        edit_url: &str,
        user: impl Into<String>,
        password: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, WikiError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| WikiError::RequestFailed(e.to_string()))?;

        Ok(Self {
            client,
            json_url: parse_http_url(json_url)?,
            edit_url: parse_http_url(edit_url)?,
            user: user.into(),
            password: password.into(),
        })
    }

    /// The page's JSON endpoint
    #[must_use]
    pub const fn json_url(&self) -> &Url {
        &self.json_url
    }

    /// The page's edit view
    #[must_use]
    pub const fn edit_url(&self) -> &Url {
        &self.edit_url
    }

    /// Fetch the page body from the JSON endpoint
    ///
    /// # Errors
    ///
    /// Returns errors for network failures, non-200 statuses, or a payload
    /// without a string `body` field.
    #[tracing::instrument(skip(self), fields(url = %self.json_url))]
    pub async fn body(&self) -> Result<String, WikiError> {
        let response = self
            .client
            .get(self.json_url.clone())
            .basic_auth(&self.user, Some(&self.password))
            .header("accept", "application/json")
            .send()
            .await
            .map_err(|e| WikiError::RequestFailed(e.to_string()))?;

        match response.status() {
            StatusCode::OK => {
                let text = response
                    .text()
                    .await
                    .map_err(|e| WikiError::RequestFailed(e.to_string()))?;
                let page: PageDocument = serde_json::from_str(&text)
                    .map_err(|e| WikiError::ResponseParseFailed(e.to_string()))?;
                tracing::debug!(bytes = page.body.len(), "Fetched page body");
                Ok(page.body)
            },
            status => Err(WikiError::ApiError {
                status: status.as_u16(),
                url: self.json_url.to_string(),
            }),
        }
    }

    /// Fetch the edit view and harvest its form
    ///
    /// # Errors
    ///
    /// Returns errors for network failures, non-200 statuses, or markup
    /// without a usable page-edit form.
    #[tracing::instrument(skip(self), fields(url = %self.edit_url))]
    pub async fn edit_session(&self) -> Result<EditSession, WikiError> {
        let response = self
            .client
            .get(self.edit_url.clone())
            .basic_auth(&self.user, Some(&self.password))
            .send()
            .await
            .map_err(|e| WikiError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(WikiError::ApiError {
                status: status.as_u16(),
                url: self.edit_url.to_string(),
            });
        }

        let html = response
            .text()
            .await
            .map_err(|e| WikiError::RequestFailed(e.to_string()))?;

        let session = parse_edit_form(&html, &self.edit_url)?;
        tracing::debug!(
            action = %session.action_url,
            fields = session.fields.len(),
            "Harvested edit form"
        );
        Ok(session)
    }

    /// Post every harvested field, with `content` replaced by `body`
    ///
    /// Returns `true` only for an HTTP 200; the page is not re-read.
    ///
    /// # Errors
    ///
    /// Returns [`WikiError::RequestFailed`] if no response was received.
    #[tracing::instrument(skip(self, session, body), fields(url = %session.action_url))]
    pub async fn post_edit(&self, session: EditSession, body: String) -> Result<bool, WikiError> {
        let session = session.with_content(body);

        let response = self
            .client
            .post(&session.action_url)
            .basic_auth(&self.user, Some(&self.password))
            .form(&session.fields)
            .send()
            .await
            .map_err(|e| WikiError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::OK {
            Ok(true)
        } else {
            tracing::warn!(status = status.as_u16(), "Edit submission rejected");
            Ok(false)
        }
    }
}

impl std::fmt::Debug for WikiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WikiClient")
            .field("json_url", &self.json_url.as_str())
            .field("edit_url", &self.edit_url.as_str())
            .field("user", &self.user)
            .finish_non_exhaustive()
    }
}

impl DocumentStore for WikiClient {
    fn fetch_body(&self) -> Pin<Box<dyn Future<Output = Result<String, DocumentError>> + Send + '_>> {
        Box::pin(async move { Ok(self.body().await?) })
    }

    fn fetch_edit_session(
        &self,
    ) -> Pin<Box<dyn Future<Output = Result<EditSession, DocumentError>> + Send + '_>> {
        Box::pin(async move { Ok(self.edit_session().await?) })
    }

    fn submit(
        &self,
        session: EditSession,
        body: String,
    ) -> Pin<Box<dyn Future<Output = Result<bool, DocumentError>> + Send + '_>> {
        Box::pin(async move { Ok(self.post_edit(session, body).await?) })
    }
}

/// Parse `raw` and require an http(s) scheme
///
/// # Errors
///
/// Returns [`WikiError::InvalidUrl`] otherwise.
pub fn parse_http_url(raw: &str) -> Result<Url, WikiError> {
    let url = Url::parse(raw).map_err(|e| WikiError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(WikiError::InvalidUrl {
            url: raw.to_string(),
            reason: format!("unsupported scheme {scheme}"),
        }),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_client_creation() {
        let client = WikiClient::new(
            "https://wiki.example.com/rest/api/content/42",
            "https://wiki.example.com/pages/editpage.action?pageId=42",
            "bot",
            "secret",
        )
        .unwrap();

        assert_eq!(client.json_url().path(), "/rest/api/content/42");
        assert_eq!(client.edit_url().query(), Some("pageId=42"));
    }

    #[test]
    fn debug_output_hides_password() {
        let client = WikiClient::new("http://w/json", "http://w/edit", "bot", "hunter2").unwrap();
        assert!(!format!("{client:?}").contains("hunter2"));
    }

    #[test]
    fn rejects_non_http_urls() {
        assert!(matches!(
            parse_http_url("ftp://wiki.example.com/page"),
            Err(WikiError::InvalidUrl { .. })
        ));
        assert!(matches!(parse_http_url("not a url"), Err(WikiError::InvalidUrl { .. })));
    }
}

//! # FE Slots Wiki Client
//!
//! HTTP access to the wiki page that holds the FE board. Implements
//! [`fe_slots_core::document::DocumentStore`] with three basic-auth calls:
//!
//! - GET the page's JSON representation and return its `body` field
//! - GET the edit view and harvest the `editpageform` fields
//! - POST every harvested field back, with `content` replaced by the new body
//!
//! ## Example
//!
//! ```no_run
//! use fe_slots_wiki::WikiClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = WikiClient::new(
//!         "https://wiki.example.com/rest/api/content/42?expand=body.storage",
//!         "https://wiki.example.com/pages/editpage.action?pageId=42",
//!         "fesbot",
//!         "secret",
//!     )?;
//!
//!     let body = client.body().await?;
//!     let session = client.edit_session().await?;
//!     let accepted = client.post_edit(session, body).await?;
//!
//!     println!("accepted: {accepted}");
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod error;
pub mod form;

pub use client::WikiClient;
pub use error::WikiError;

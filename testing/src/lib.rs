//! # FE Slots Testing
//!
//! Test doubles and helpers for the FE slot bot.
//!
//! This crate provides:
//! - [`FixedClock`]: deterministic dates for reservation stamps
//! - [`MockDocumentStore`]: an in-memory wiki page with scripted submit status
//! - [`RecordingReplies`]: captures every line the bot sends back
//! - [`ReducerTest`]: Given-When-Then reducer testing
//! - [`fixtures`]: sample documents
//!
//! ## Example
//!
//! ```
//! use fe_slots_testing::{MockDocumentStore, fixtures, test_clock};
//! use fe_slots_core::codec::RowCodec;
//! use fe_slots_core::registry::ReservationRegistry;
//! use fe_slots_core::slot::{Outcome, SlotId};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let document = Arc::new(MockDocumentStore::new(fixtures::BOARD));
//! let registry = ReservationRegistry::new(document.clone(), Arc::new(test_clock()), RowCodec::default());
//!
//! let outcome = registry.release(SlotId::new(1), "alice").await?;
//! assert_eq!(outcome, Outcome::Persisted);
//! assert_eq!(document.submissions().len(), 1);
//! # Ok(())
//! # }
//! ```

use chrono::{DateTime, Utc};
use fe_slots_core::document::{DocumentError, DocumentStore, EditSession};
use fe_slots_core::environment::{Clock, ReplySink};
use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicU16, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};


/// Mock implementations of environment traits
pub mod mocks {
    use super::{
        AtomicBool, AtomicU16, AtomicUsize, BTreeMap, Clock, DateTime, DocumentError,
        DocumentStore, EditSession, Future, Mutex, MutexGuard, Ordering, Pin, PoisonError,
        ReplySink, Utc,
    };

    /// Fixed clock for deterministic tests
    ///
    /// # Example
    ///
    /// ```
    /// use fe_slots_testing::mocks::FixedClock;
    /// use fe_slots_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// assert_eq!(clock.now(), clock.now());
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2024-01-01 09:00:00 UTC)
    ///
    /// # Panics
    ///
    /// Panics if the hardcoded timestamp fails to parse, which never happens.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2024-01-01T09:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }

    fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
        mutex.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Edit form action used by [`MockDocumentStore`]
    pub const MOCK_ACTION_URL: &str = "http://wiki.test/pages/doeditpage.action?pageId=42";

    /// In-memory wiki page.
    ///
    /// Reads return the current body. Submits are recorded; when the scripted
    /// status is 200 the submitted body becomes the current body, so a
    /// following read sees the change just like the real page.
    #[derive(Debug)]
    pub struct MockDocumentStore {
        body: Mutex<String>,
        submit_status: AtomicU16,
        transport_down: AtomicBool,
        body_fetches: AtomicUsize,
        session_fetches: AtomicUsize,
        submissions: Mutex<Vec<EditSession>>,
    }

    impl MockDocumentStore {
        /// A page holding `body` that accepts every submission
        #[must_use]
        pub fn new(body: impl Into<String>) -> Self {
            Self {
                body: Mutex::new(body.into()),
                submit_status: AtomicU16::new(200),
                transport_down: AtomicBool::new(false),
                body_fetches: AtomicUsize::new(0),
                session_fetches: AtomicUsize::new(0),
                submissions: Mutex::new(Vec::new()),
            }
        }

        /// Answer every submit with `status`
        #[must_use]
        pub fn with_submit_status(self, status: u16) -> Self {
            self.submit_status.store(status, Ordering::SeqCst);
            self
        }

        /// Fail every call as if the network were down
        #[must_use]
        pub fn with_transport_down(self) -> Self {
            self.transport_down.store(true, Ordering::SeqCst);
            self
        }

        /// Change the submit status mid-test
        pub fn set_submit_status(&self, status: u16) {
            self.submit_status.store(status, Ordering::SeqCst);
        }

        /// Replace the page body, as another writer would
        pub fn set_body(&self, body: impl Into<String>) {
            *lock(&self.body) = body.into();
        }

        /// The current page body
        #[must_use]
        pub fn body(&self) -> String {
            lock(&self.body).clone()
        }

        /// Every edit session submitted so far, accepted or not
        #[must_use]
        pub fn submissions(&self) -> Vec<EditSession> {
            lock(&self.submissions).clone()
        }

        /// Content of the last submission
        #[must_use]
        pub fn last_submitted_body(&self) -> Option<String> {
            lock(&self.submissions)
                .last()
                .and_then(|session| session.content().map(str::to_string))
        }

        /// How many times the body was read
        #[must_use]
        pub fn body_fetches(&self) -> usize {
            self.body_fetches.load(Ordering::SeqCst)
        }

        /// How many times the edit form was read
        #[must_use]
        pub fn session_fetches(&self) -> usize {
            self.session_fetches.load(Ordering::SeqCst)
        }

        fn check_transport(&self) -> Result<(), DocumentError> {
            if self.transport_down.load(Ordering::SeqCst) {
                return Err(DocumentError::Transport("connection refused".to_string()));
            }
            Ok(())
        }
    }

    impl DocumentStore for MockDocumentStore {
        fn fetch_body(
            &self,
        ) -> Pin<Box<dyn Future<Output = Result<String, DocumentError>> + Send + '_>> {
            Box::pin(async move {
                self.check_transport()?;
                self.body_fetches.fetch_add(1, Ordering::SeqCst);
                Ok(self.body())
            })
        }

        fn fetch_edit_session(
            &self,
        ) -> Pin<Box<dyn Future<Output = Result<EditSession, DocumentError>> + Send + '_>> {
            Box::pin(async move {
                self.check_transport()?;
                self.session_fetches.fetch_add(1, Ordering::SeqCst);

                let mut fields = BTreeMap::new();
                fields.insert("content".to_string(), self.body());
                fields.insert("title".to_string(), "FE Board".to_string());
                fields.insert("originalVersion".to_string(), "7".to_string());

                Ok(EditSession::new(MOCK_ACTION_URL.to_string(), fields))
            })
        }

        fn submit(
            &self,
            session: EditSession,
            body: String,
        ) -> Pin<Box<dyn Future<Output = Result<bool, DocumentError>> + Send + '_>> {
            Box::pin(async move {
                self.check_transport()?;

                let accepted = self.submit_status.load(Ordering::SeqCst) == 200;
                if accepted {
                    self.set_body(body.clone());
                }
                lock(&self.submissions).push(session.with_content(body));

                Ok(accepted)
            })
        }
    }

    /// Reply sink that records `(channel, line)` pairs
    #[derive(Debug, Default)]
    pub struct RecordingReplies {
        lines: Mutex<Vec<(String, String)>>,
    }

    impl RecordingReplies {
        /// An empty recorder
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Every recorded `(channel, line)` pair, in send order
        #[must_use]
        pub fn sent(&self) -> Vec<(String, String)> {
            lock(&self.lines).clone()
        }

        /// Just the recorded lines
        #[must_use]
        pub fn lines(&self) -> Vec<String> {
            lock(&self.lines).iter().map(|(_, line)| line.clone()).collect()
        }
    }

    impl ReplySink for RecordingReplies {
        fn reply(&self, channel: &str, line: &str) {
            lock(&self.lines).push((channel.to_string(), line.to_string()));
        }
    }
}

/// Sample wiki documents
pub mod fixtures {
    /// A board with two reserved and two free slots, surrounded by prose
    pub const BOARD: &str = "h1. Shared FE environments\n\
        Ask in the channel before grabbing one.\n\
        || FE || Owner || Ticket || Date || Notes ||\n\
        | [FE1|Shared FE 1] | alice | {ticket-macro:key=OPS-1} | 2023-12-20 | soak test |\n\
        | [FE2|Shared FE 2] | | {ticket-macro:key=} | | |\n\
        | [FE3|Shared FE 3] | bob | {ticket-macro:key=} | 2024-01-01 | |\n\
        | [FE4|Shared FE 4] | | {ticket-macro:key=} | | |\n\
        \n\
        Contact ops with questions.\n";

    /// A board holding only `FE7`, free
    pub const SINGLE_FREE: &str = "| [FE7|Shared FE 7] | | {ticket-macro:key=} | | |\n";
}

// Re-export commonly used items
pub use mocks::{FixedClock, MockDocumentStore, RecordingReplies, test_clock};
pub use reducer_test::{ReducerTest, assertions, run_effects};

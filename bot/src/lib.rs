//! # FE Slots Bot
//!
//! Chat front end for the FE board: users reserve, release and inspect
//! shared FE slots whose state lives in a wiki table.
//!
//! ## Commands
//!
//! - `fe` / `fes`: list every slot
//! - `fe available`: list free slots on one line
//! - `fe <slot>`: show one slot (`FE12`, `fe12` or `12`)
//! - `fe reserve <slot> [<ticket>] [<notes...>]`
//! - `fe release <slot>`
//!
//! ## Architecture
//!
//! [`router::CommandRouter`] validates input synchronously and sends an
//! action to the store. The [`reducer::FesReducer`] turns it into an effect
//! that performs the wiki round trips through
//! [`fe_slots_core::registry::ReservationRegistry`]; the result is fed back
//! and rendered into a reply through the environment's
//! [`fe_slots_core::environment::ReplySink`].
//!
//! ```no_run
//! use fe_slots_bot::{CommandRouter, FesEnvironment, FesReducer, FesState, Response};
//! use fe_slots_bot::transport::StdoutReplies;
//! use fe_slots_core::codec::RowCodec;
//! use fe_slots_core::environment::SystemClock;
//! use fe_slots_core::registry::ReservationRegistry;
//! use fe_slots_runtime::Store;
//! use fe_slots_wiki::WikiClient;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let wiki = WikiClient::new(
//!     "https://wiki.example.com/rest/api/content/42",
//!     "https://wiki.example.com/pages/editpage.action?pageId=42",
//!     "fesbot",
//!     "secret",
//! )?;
//! let registry = ReservationRegistry::new(Arc::new(wiki), Arc::new(SystemClock), RowCodec::default());
//! let env = FesEnvironment::new(registry, Arc::new(StdoutReplies::default()));
//! let router = CommandRouter::new(Store::new(FesState::default(), FesReducer::new(), env));
//!
//! if let Response::Pending(mut handle) = router.handle("#qa", "alice", &["available"]).await? {
//!     handle.wait().await;
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod reducer;
pub mod router;
pub mod transport;
pub mod types;

pub use config::{Config, ConfigError};
pub use reducer::FesReducer;
pub use router::{Command, CommandError, CommandRouter, FesStore, Response, parse_command};
pub use types::{FesAction, FesEnvironment, FesState, ReplyTarget};

//! Chat command parsing and dispatch.
//!
//! Parsing is synchronous and never touches the network. Anything that
//! needs the wiki is sent to the store and answered later through the reply
//! sink; the caller only learns that the answer is pending.

use crate::reducer::FesReducer;
use crate::types::{FesAction, FesEnvironment, FesState, ReplyTarget};
use fe_slots_core::slot::{Operation, SlotFilter, SlotId, SlotNameError};
use fe_slots_runtime::{EffectHandle, Store, StoreError};
use thiserror::Error;

/// The store type driving the bot
pub type FesStore = Store<FesState, FesAction, FesEnvironment, FesReducer>;

/// Command verbs the router answers to
pub const VERBS: [&str; 2] = ["fe", "fes"];

/// Usage text for unrecognised sub-commands
pub const USAGE: &str =
    "Usage: fe|fes [available | [fe]<num> | reserve fe<num> [<ticket>] [notes] | release fe<num>]";

/// A parsed command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Show slots
    List(SlotFilter),
    /// Reserve a slot
    Reserve {
        /// Target slot
        slot_id: SlotId,
        /// Upper-cased ticket, or empty
        ticket: String,
        /// Remaining words joined by single spaces
        notes: String,
    },
    /// Release a slot
    Release {
        /// Target slot
        slot_id: SlotId,
    },
    /// Show usage
    Help,
}

/// Input rejected before any network call
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    /// `reserve`/`release` without a slot name
    #[error("no slot name given to {verb}")]
    MissingSlotName {
        /// The sub-command that needed one
        verb: Operation,
    },

    /// A slot name that fails the grammar
    #[error(transparent)]
    InvalidSlotName(#[from] SlotNameError),
}

impl CommandError {
    /// The chat reply for this error, addressed to `nick`
    #[must_use]
    pub fn reply(&self, nick: &str) -> String {
        match self {
            Self::MissingSlotName { verb } => {
                format!("You must tell me what FE you want to {verb}, {nick}")
            },
            Self::InvalidSlotName(SlotNameError(token)) => {
                format!("{token} is not a valid FE name, {nick}")
            },
        }
    }
}

/// Parses the words following the command verb.
///
/// # Errors
///
/// Returns [`CommandError`] when `reserve`/`release` lacks a slot name or a
/// slot name fails the grammar. A first word that is neither a sub-command
/// nor shaped like a slot name parses as [`Command::Help`].
pub fn parse_command<S: AsRef<str>>(args: &[S]) -> Result<Command, CommandError> {
    let mut words = args.iter().map(AsRef::as_ref).filter(|w| !w.is_empty());

    let Some(subcommand) = words.next() else {
        return Ok(Command::List(SlotFilter::All));
    };

    match subcommand.to_ascii_lowercase().as_str() {
        "available" => Ok(Command::List(SlotFilter::Available)),
        "reserve" => {
            let slot_id = slot_argument(words.next(), Operation::Reserve)?;
            let ticket = words.next().map(str::to_ascii_uppercase).unwrap_or_default();
            let notes = words.collect::<Vec<_>>().join(" ");
            Ok(Command::Reserve {
                slot_id,
                ticket,
                notes,
            })
        },
        "release" => Ok(Command::Release {
            slot_id: slot_argument(words.next(), Operation::Release)?,
        }),
        _ if subcommand.bytes().any(|b| b.is_ascii_digit()) => {
            Ok(Command::List(SlotFilter::Single(SlotId::parse_token(subcommand)?)))
        },
        _ => Ok(Command::Help),
    }
}

fn slot_argument(word: Option<&str>, verb: Operation) -> Result<SlotId, CommandError> {
    let word = word.ok_or(CommandError::MissingSlotName { verb })?;
    Ok(SlotId::parse_token(word)?)
}

/// What the transport should do after handing over a command
#[derive(Debug)]
pub enum Response {
    /// Send this line now; nothing was scheduled
    Immediate(String),
    /// The answer will arrive through the reply sink
    Pending(EffectHandle),
}

/// Turns chat commands into store actions
#[derive(Clone)]
pub struct CommandRouter {
    store: FesStore,
}

impl CommandRouter {
    /// Creates a router feeding `store`
    #[must_use]
    pub const fn new(store: FesStore) -> Self {
        Self { store }
    }

    /// The store behind this router
    #[must_use]
    pub const fn store(&self) -> &FesStore {
        &self.store
    }

    /// Handles one command from `nick` in `channel`.
    ///
    /// Validation failures and help come back as [`Response::Immediate`];
    /// everything else is scheduled and comes back as [`Response::Pending`].
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] once the store is shutting down.
    #[tracing::instrument(skip(self, args))]
    pub async fn handle<S: AsRef<str>>(
        &self,
        channel: &str,
        nick: &str,
        args: &[S],
    ) -> Result<Response, StoreError> {
        let command = match parse_command(args) {
            Ok(Command::Help) => return Ok(Response::Immediate(USAGE.to_string())),
            Ok(command) => command,
            Err(error) => {
                tracing::debug!(%error, "Rejected command");
                return Ok(Response::Immediate(error.reply(nick)));
            },
        };

        let reply_to = ReplyTarget::new(channel, nick);
        let action = match command {
            Command::List(filter) => FesAction::List { reply_to, filter },
            Command::Reserve {
                slot_id,
                ticket,
                notes,
            } => FesAction::Reserve {
                reply_to,
                slot_id,
                ticket,
                notes,
            },
            Command::Release { slot_id } => FesAction::Release { reply_to, slot_id },
            Command::Help => return Ok(Response::Immediate(USAGE.to_string())),
        };

        let handle = self.store.send(action).await?;
        Ok(Response::Pending(handle))
    }
}

impl std::fmt::Debug for CommandRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandRouter").finish_non_exhaustive()
    }
}

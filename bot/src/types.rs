//! State, actions and environment of the FE bot

use fe_slots_core::document::DocumentError;
use fe_slots_core::environment::ReplySink;
use fe_slots_core::registry::ReservationRegistry;
use fe_slots_core::slot::{Operation, Outcome, ReservationRequest, SlotFilter, SlotId};
use std::sync::Arc;

/// Where a command came from, and so where its answer goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyTarget {
    /// Channel to answer in
    pub channel: String,
    /// Who asked
    pub nick: String,
}

impl ReplyTarget {
    /// Creates a reply target
    #[must_use]
    pub fn new(channel: impl Into<String>, nick: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            nick: nick.into(),
        }
    }
}

/// Bot observability counters
///
/// Never holds slot data: the wiki page is re-read for every command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FesState {
    /// Commands scheduled but not yet answered
    pub in_flight: usize,
    /// Reserves and releases accepted by the wiki
    pub persisted: u64,
    /// Reserves and releases that were rejected or found no row
    pub failed: u64,
    /// Commands that died on a transport fault
    pub faulted: u64,
    /// Message of the most recent transport fault
    pub last_fault: Option<String>,
}

/// Bot actions
///
/// The first three are commands from chat; the rest are results fed back by
/// the effects those commands schedule.
#[derive(Debug, Clone)]
pub enum FesAction {
    /// Show slots passing `filter`
    List {
        /// Requester
        reply_to: ReplyTarget,
        /// Which slots to show
        filter: SlotFilter,
    },
    /// Reserve a slot
    Reserve {
        /// Requester, who becomes the owner
        reply_to: ReplyTarget,
        /// Target slot
        slot_id: SlotId,
        /// Ticket reference, possibly empty
        ticket: String,
        /// Free-text notes, possibly empty
        notes: String,
    },
    /// Release a slot
    Release {
        /// Requester
        reply_to: ReplyTarget,
        /// Target slot
        slot_id: SlotId,
    },
    /// A listing was rendered
    Listed {
        /// Requester
        reply_to: ReplyTarget,
        /// Lines to send, in order
        lines: Vec<String>,
    },
    /// A reserve or release ran to an outcome
    OperationCompleted {
        /// Requester
        reply_to: ReplyTarget,
        /// What was attempted
        request: ReservationRequest,
        /// Whether the wiki accepted it
        outcome: Outcome,
    },
    /// A command died on a transport fault
    OperationFaulted {
        /// Requester
        reply_to: ReplyTarget,
        /// The mutating operation, or `None` for a listing
        operation: Option<Operation>,
        /// The fault
        error: DocumentError,
    },
}

/// Injected dependencies
#[derive(Clone)]
pub struct FesEnvironment {
    /// Reservation protocol against the wiki page
    pub registry: ReservationRegistry,
    /// Outbound chat lines
    pub replies: Arc<dyn ReplySink>,
}

impl FesEnvironment {
    /// Creates an environment
    #[must_use]
    pub fn new(registry: ReservationRegistry, replies: Arc<dyn ReplySink>) -> Self {
        Self { registry, replies }
    }
}

impl std::fmt::Debug for FesEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FesEnvironment")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

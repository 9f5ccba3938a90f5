//! Slot identifiers, slot records and reservation requests.
//!
//! A slot is never created by this crate: it is discovered by parsing the
//! backing document, and only its four mutable fields are ever rewritten.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Fixed name prefix of every slot (`FE12`)
pub const SLOT_PREFIX: &str = "FE";

/// Numeric identity of a slot, as embedded in its `FE<digits>` name
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SlotId(u32);

impl SlotId {
    /// Creates a slot id from its number
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the slot number
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }

    /// Parses a user-supplied slot token.
    ///
    /// Accepts `FE12`, `fe12` and the bare number `12`.
    ///
    /// # Errors
    ///
    /// Returns [`SlotNameError`] when the token has the wrong prefix, no
    /// digits, or a number that does not fit.
    pub fn parse_token(token: &str) -> Result<Self, SlotNameError> {
        let upper = token.trim().to_ascii_uppercase();
        let digits = upper.strip_prefix(SLOT_PREFIX).unwrap_or(upper.as_str());

        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(SlotNameError(upper));
        }

        digits.parse::<u32>().map(Self).map_err(|_| SlotNameError(upper))
    }

    /// The canonical display name (`FE12`)
    #[must_use]
    pub fn name(self) -> String {
        self.to_string()
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{SLOT_PREFIX}{}", self.0)
    }
}

impl FromStr for SlotId {
    type Err = SlotNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_token(s)
    }
}

/// A token that does not follow the slot-name grammar
///
/// Carries the upper-cased token so replies can echo it back.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0} is not a valid FE name")]
pub struct SlotNameError(pub String);

/// Reservation state of one slot, as read from its row
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    /// Reserving party; empty when the slot is available
    pub owner: String,
    /// Ticket references, in document order
    pub tickets: Vec<String>,
    /// Reservation date (`YYYY-MM-DD`) or empty
    pub reserved_on: String,
    /// Free-text annotation, normalized
    pub notes: String,
}

impl Slot {
    /// A slot is available iff nobody owns it
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.owner.is_empty()
    }
}

/// Which slots a listing should return
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlotFilter {
    /// Every slot on the board
    All,
    /// Only slots nobody owns
    Available,
    /// One slot by id
    Single(SlotId),
}

impl SlotFilter {
    /// Whether a parsed slot passes this filter
    #[must_use]
    pub fn matches(self, id: SlotId, slot: &Slot) -> bool {
        match self {
            Self::All => true,
            Self::Available => slot.is_available(),
            Self::Single(wanted) => wanted == id,
        }
    }
}

/// The two mutating operations
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    /// Assign the slot to the requester
    Reserve,
    /// Clear the slot back to available
    Release,
}

impl Operation {
    /// Verb used in replies (`reserve` / `release`)
    #[must_use]
    pub const fn verb(self) -> &'static str {
        match self {
            Self::Reserve => "reserve",
            Self::Release => "release",
        }
    }

    /// Past tense used in success replies
    #[must_use]
    pub const fn past_tense(self) -> &'static str {
        match self {
            Self::Reserve => "reserved",
            Self::Release => "released",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.verb())
    }
}

/// A validated request to change one slot, consumed once by the registry
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationRequest {
    /// Reserve or release
    pub operation: Operation,
    /// Target slot
    pub slot_id: SlotId,
    /// Who asked
    pub requester: String,
    /// Ticket reference (reserve only, may be empty)
    pub ticket: String,
    /// Free-text notes (reserve only, may be empty)
    pub notes: String,
}

impl ReservationRequest {
    /// Builds a reserve request
    #[must_use]
    pub fn reserve(
        slot_id: SlotId,
        requester: impl Into<String>,
        ticket: impl Into<String>,
        notes: impl Into<String>,
    ) -> Self {
        Self {
            operation: Operation::Reserve,
            slot_id,
            requester: requester.into(),
            ticket: ticket.into(),
            notes: notes.into(),
        }
    }

    /// Builds a release request
    #[must_use]
    pub fn release(slot_id: SlotId, requester: impl Into<String>) -> Self {
        Self {
            operation: Operation::Release,
            slot_id,
            requester: requester.into(),
            ticket: String::new(),
            notes: String::new(),
        }
    }
}

/// Result of a reserve or release
///
/// Writes are whole-document overwrites, so there is no partial success.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    /// The submission was accepted (HTTP 200)
    Persisted,
    /// The row was missing or the submission was rejected
    Failed,
}

impl Outcome {
    /// Whether the change was accepted by the document store
    #[must_use]
    pub const fn is_persisted(self) -> bool {
        matches!(self, Self::Persisted)
    }
}

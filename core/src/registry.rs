//! Reserve, release and list against the backing document.
//!
//! Every call re-reads the document; nothing is cached between calls. A
//! reserve or release is one fetch → rewrite → edit-session → submit cycle,
//! and the submit blindly overwrites the whole body. Two cycles that
//! interleave race under last-submit-wins. [`ReservationRegistry::with_serialized_writes`]
//! removes the race between operations of this process only.

use crate::codec::{CodecError, RowCodec, RowUpdate};
use crate::document::{DocumentError, DocumentStore};
use crate::environment::Clock;
use crate::slot::{Operation, Outcome, ReservationRequest, Slot, SlotFilter, SlotId};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Bot name used in the reserved-by annotation when none is configured
pub const DEFAULT_RESERVED_BY: &str = "fesbot";

/// The reservation state machine over a [`DocumentStore`]
#[derive(Clone)]
pub struct ReservationRegistry {
    document: Arc<dyn DocumentStore>,
    clock: Arc<dyn Clock>,
    codec: RowCodec,
    reserved_by: String,
    write_gate: Option<Arc<Mutex<()>>>,
}

impl ReservationRegistry {
    /// Creates a registry writing through `document`
    #[must_use]
    pub fn new(document: Arc<dyn DocumentStore>, clock: Arc<dyn Clock>, codec: RowCodec) -> Self {
        Self {
            document,
            clock,
            codec,
            reserved_by: DEFAULT_RESERVED_BY.to_string(),
            write_gate: None,
        }
    }

    /// Sets the name written into the reserved-by annotation
    #[must_use]
    pub fn with_reserved_by(mut self, name: impl Into<String>) -> Self {
        self.reserved_by = name.into();
        self
    }

    /// Runs reserve/release cycles of this registry (and its clones) one at a time.
    ///
    /// The lock is global, not per slot: every submit rewrites the whole
    /// document, so two cycles on different slots still lose each other's
    /// changes when they interleave. Writers in other processes are not
    /// covered.
    #[must_use]
    pub fn with_serialized_writes(mut self) -> Self {
        self.write_gate = Some(Arc::new(Mutex::new(())));
        self
    }

    /// Whether writes go through the in-process gate
    #[must_use]
    pub const fn serializes_writes(&self) -> bool {
        self.write_gate.is_some()
    }

    /// Notes as written into a reserved row
    #[must_use]
    pub fn annotate(&self, notes: &str) -> String {
        format!("{} (reserved by {})", notes.trim(), self.reserved_by)
            .trim_start()
            .to_string()
    }

    /// Runs a validated request.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError`] when a network call fails; see [`Self::reserve`].
    pub async fn execute(&self, request: &ReservationRequest) -> Result<Outcome, DocumentError> {
        match request.operation {
            Operation::Reserve => {
                self.reserve(request.slot_id, &request.requester, &request.ticket, &request.notes)
                    .await
            },
            Operation::Release => self.release(request.slot_id, &request.requester).await,
        }
    }

    /// Assigns `slot_id` to `requester`, stamped with today's date.
    ///
    /// The slot does not need to be available: reserving a reserved slot
    /// reassigns it, which is how owners and tickets get corrected.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError`] when fetching the body, fetching the edit
    /// session or posting the form fails at the transport level. A missing
    /// row or a rejected submission is `Ok(Outcome::Failed)`.
    #[tracing::instrument(skip(self, ticket, notes), fields(slot = %slot_id))]
    pub async fn reserve(
        &self,
        slot_id: SlotId,
        requester: &str,
        ticket: &str,
        notes: &str,
    ) -> Result<Outcome, DocumentError> {
        let update = RowUpdate::reserved(requester, ticket, self.clock.today(), self.annotate(notes));
        self.write(Operation::Reserve, slot_id, update).await
    }

    /// Clears `slot_id` back to available.
    ///
    /// Any requester may release any slot.
    ///
    /// # Errors
    ///
    /// Same as [`Self::reserve`].
    #[tracing::instrument(skip(self), fields(slot = %slot_id))]
    pub async fn release(&self, slot_id: SlotId, requester: &str) -> Result<Outcome, DocumentError> {
        self.write(Operation::Release, slot_id, RowUpdate::cleared()).await
    }

    /// Current slots passing `filter`, sorted by id.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError`] when the body cannot be fetched.
    #[tracing::instrument(skip(self))]
    pub async fn list(&self, filter: SlotFilter) -> Result<Vec<(SlotId, Slot)>, DocumentError> {
        let body = self.document.fetch_body().await?;

        Ok(self
            .codec
            .parse(&body)
            .into_iter()
            .filter(|(id, slot)| filter.matches(*id, slot))
            .collect())
    }

    async fn write(
        &self,
        operation: Operation,
        slot_id: SlotId,
        update: RowUpdate,
    ) -> Result<Outcome, DocumentError> {
        let _gate = match &self.write_gate {
            Some(gate) => Some(gate.lock().await),
            None => None,
        };

        let body = self.document.fetch_body().await?;

        let new_body = match self.codec.render_update(&body, slot_id, &update) {
            Ok(new_body) => new_body,
            Err(CodecError::RowNotFound(_)) => {
                tracing::warn!(%operation, "No row for slot in document, nothing submitted");
                record(operation, Outcome::Failed);
                return Ok(Outcome::Failed);
            },
        };

        let session = self.document.fetch_edit_session().await?;
        let outcome = if self.document.submit(session, new_body).await? {
            tracing::info!(%operation, "Document updated");
            Outcome::Persisted
        } else {
            tracing::warn!(%operation, "Document store rejected the submission");
            Outcome::Failed
        };

        record(operation, outcome);
        Ok(outcome)
    }
}

impl std::fmt::Debug for ReservationRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReservationRegistry")
            .field("codec", &self.codec)
            .field("reserved_by", &self.reserved_by)
            .field("serialized_writes", &self.serializes_writes())
            .finish_non_exhaustive()
    }
}

fn record(operation: Operation, outcome: Outcome) {
    let outcome = if outcome.is_persisted() { "persisted" } else { "failed" };
    metrics::counter!("fe_slots.operations", "operation" => operation.verb(), "outcome" => outcome)
        .increment(1);
}

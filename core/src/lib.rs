//! # FE Slots Core
//!
//! Reservation model and business logic for the shared FE slot board.
//!
//! The authoritative state of every slot lives as a row in a wiki table.
//! This crate knows how to read that table, how to rewrite a single row,
//! and how to drive a read-modify-write cycle against the document. It also
//! carries the small reducer/effect vocabulary the bot is built on.
//!
//! ## Core Concepts
//!
//! - **Slot**: one reservable FE, discovered by parsing the document
//! - **`RowCodec`**: the only component that understands the row grammar
//! - **`ReservationRegistry`**: reserve/release/list against a `DocumentStore`
//! - **Reducer / Effect**: pure decision making, with I/O described as effects
//!
//! ## Example
//!
//! ```
//! use fe_slots_core::codec::RowCodec;
//! use fe_slots_core::slot::SlotId;
//!
//! let body = "| [FE7|Env7] | alice | {ticket-macro:key=OPS-1} | 2024-01-01 | smoke |";
//! let slots = RowCodec::default().parse(body);
//!
//! let fe7 = &slots[&SlotId::new(7)];
//! assert_eq!(fe7.owner, "alice");
//! assert_eq!(fe7.tickets, vec!["OPS-1".to_string()]);
//! ```

// Re-export commonly used types
pub use chrono::{DateTime, NaiveDate, Utc};
pub use smallvec::{SmallVec, smallvec};

/// Slot identifiers, slot records and reservation requests
pub mod slot;

/// Wiki row grammar: parsing and in-place row rewriting
pub mod codec;

/// Human-readable rendering of slots for chat replies
pub mod format;

/// The backing document seam (`DocumentStore`) and edit sessions
pub mod document;

/// Reserve, release and list operations against the backing document
pub mod registry;

/// Reducer module - the core trait for business logic
///
/// Reducers are pure functions: `(State, Action, Environment) → (State, Effects)`.
/// They never touch the network; anything that needs I/O is returned as an
/// [`Effect`](crate::effect::Effect) for the runtime to execute.
pub mod reducer {
    use super::SmallVec;
    use super::effect::Effect;

    /// The Reducer trait - core abstraction for business logic
    ///
    /// # Example
    ///
    /// ```ignore
    /// impl Reducer for FesReducer {
    ///     type State = FesState;
    ///     type Action = FesAction;
    ///     type Environment = FesEnvironment;
    ///
    ///     fn reduce(
    ///         &self,
    ///         state: &mut FesState,
    ///         action: FesAction,
    ///         env: &FesEnvironment,
    ///     ) -> SmallVec<[Effect<FesAction>; 4]> {
    ///         match action {
    ///             FesAction::List { .. } => smallvec![/* fetch effect */],
    ///             _ => SmallVec::new(),
    ///         }
    ///     }
    /// }
    /// ```
    pub trait Reducer {
        /// The state type this reducer operates on
        type State;

        /// The action type this reducer processes
        type Action;

        /// The environment type with injected dependencies
        type Environment;

        /// Reduce an action into state changes and effects
        ///
        /// Updates state in place and returns effect descriptions to be
        /// executed by the runtime. Most actions produce zero or one effect,
        /// hence the inline capacity of four.
        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]>;
    }
}

/// Effect module - side effect descriptions
///
/// Effects are values, not execution. The runtime spawns them and feeds any
/// resulting action back into the reducer.
pub mod effect {
    use std::future::Future;
    use std::pin::Pin;

    /// Effect type - describes a side effect to be executed
    ///
    /// # Type Parameters
    ///
    /// - `Action`: The action type that effects can produce (feedback loop)
    pub enum Effect<Action> {
        /// No-op effect
        None,

        /// Run effects in parallel
        Parallel(Vec<Effect<Action>>),

        /// Run effects sequentially
        Sequential(Vec<Effect<Action>>),

        /// Arbitrary async computation
        ///
        /// Returns `Option<Action>` - if Some, the action is fed back into the reducer
        Future(Pin<Box<dyn Future<Output = Option<Action>> + Send>>),
    }

    // Manual Debug implementation since Future doesn't implement Debug
    impl<Action> std::fmt::Debug for Effect<Action>
    where
        Action: std::fmt::Debug,
    {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                Effect::None => write!(f, "Effect::None"),
                Effect::Parallel(effects) => {
                    f.debug_tuple("Effect::Parallel").field(effects).finish()
                },
                Effect::Sequential(effects) => {
                    f.debug_tuple("Effect::Sequential").field(effects).finish()
                },
                Effect::Future(_) => write!(f, "Effect::Future(<future>)"),
            }
        }
    }

    impl<Action> Effect<Action> {
        /// Wrap an async block as an effect
        pub fn future<F>(fut: F) -> Self
        where
            F: Future<Output = Option<Action>> + Send + 'static,
        {
            Effect::Future(Box::pin(fut))
        }

        /// Combine effects to run in parallel
        #[must_use]
        pub const fn merge(effects: Vec<Effect<Action>>) -> Effect<Action> {
            Effect::Parallel(effects)
        }

        /// Chain effects to run sequentially
        #[must_use]
        pub const fn chain(effects: Vec<Effect<Action>>) -> Effect<Action> {
            Effect::Sequential(effects)
        }
    }
}

/// Environment module - dependency injection traits
///
/// External dependencies are abstracted behind traits so reducers and the
/// registry can be exercised with deterministic fakes.
pub mod environment {
    use chrono::{DateTime, Local, NaiveDate, Utc};

    /// Clock trait - abstracts time operations for testability
    ///
    /// # Examples
    ///
    /// ```
    /// use fe_slots_core::environment::Clock;
    /// use fe_slots_core::{DateTime, Utc};
    ///
    /// struct Noon;
    ///
    /// impl Clock for Noon {
    ///     fn now(&self) -> DateTime<Utc> {
    ///         "2024-01-01T12:00:00Z".parse().unwrap()
    ///     }
    /// }
    ///
    /// assert_eq!(Noon.today().to_string(), "2024-01-01");
    /// ```
    pub trait Clock: Send + Sync {
        /// Get the current time
        fn now(&self) -> DateTime<Utc>;

        /// The calendar date stamped on new reservations
        fn today(&self) -> NaiveDate {
            self.now().date_naive()
        }
    }

    /// Production clock backed by the system time
    ///
    /// Reservations are stamped with the host's local calendar date.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }

        fn today(&self) -> NaiveDate {
            Local::now().date_naive()
        }
    }

    /// Outbound side of the chat transport
    ///
    /// Results of scheduled operations arrive here as new messages, never as
    /// return values to the code that scheduled them.
    pub trait ReplySink: Send + Sync {
        /// Sends one line to `channel`
        fn reply(&self, channel: &str, line: &str);
    }
}

//! The FE bot reducer.
//!
//! Commands schedule one `Effect::Future` each and return. The future runs
//! the wiki round trips and feeds a result action back; the result action
//! schedules the chat reply. Nothing here awaits the network.

use crate::types::{FesAction, FesEnvironment, FesState, ReplyTarget};
use fe_slots_core::format;
use fe_slots_core::slot::{Operation, Outcome, ReservationRequest};
use fe_slots_core::{SmallVec, effect::Effect, reducer::Reducer, smallvec};

/// Reply for a finished reserve or release
#[must_use]
pub fn outcome_line(request: &ReservationRequest, outcome: Outcome, nick: &str) -> String {
    match outcome {
        Outcome::Persisted => format!(
            "{} has been {}, {nick}",
            request.slot_id,
            request.operation.past_tense()
        ),
        Outcome::Failed => format!(
            "I was unable to {} {} for you {nick}",
            request.operation.verb(),
            request.slot_id
        ),
    }
}

/// Reducer for chat commands and their results
#[derive(Debug, Clone, Copy, Default)]
pub struct FesReducer;

impl FesReducer {
    /// Create a new reducer
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn execute(
        state: &mut FesState,
        reply_to: ReplyTarget,
        request: ReservationRequest,
        env: &FesEnvironment,
    ) -> SmallVec<[Effect<FesAction>; 4]> {
        state.in_flight += 1;
        let registry = env.registry.clone();

        smallvec![Effect::future(async move {
            match registry.execute(&request).await {
                Ok(outcome) => Some(FesAction::OperationCompleted {
                    reply_to,
                    request,
                    outcome,
                }),
                Err(error) => Some(FesAction::OperationFaulted {
                    reply_to,
                    operation: Some(request.operation),
                    error,
                }),
            }
        })]
    }

    fn reply(env: &FesEnvironment, channel: String, lines: Vec<String>) -> Effect<FesAction> {
        let replies = env.replies.clone();
        Effect::future(async move {
            for line in &lines {
                replies.reply(&channel, line);
            }
            None
        })
    }
}

impl Reducer for FesReducer {
    type State = FesState;
    type Action = FesAction;
    type Environment = FesEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            FesAction::List { reply_to, filter } => {
                state.in_flight += 1;
                let registry = env.registry.clone();

                smallvec![Effect::future(async move {
                    match registry.list(filter).await {
                        Ok(slots) => Some(FesAction::Listed {
                            reply_to,
                            lines: format::listing(filter, &slots),
                        }),
                        Err(error) => Some(FesAction::OperationFaulted {
                            reply_to,
                            operation: None,
                            error,
                        }),
                    }
                })]
            },

            FesAction::Reserve {
                reply_to,
                slot_id,
                ticket,
                notes,
            } => {
                let request = ReservationRequest::reserve(slot_id, &reply_to.nick, ticket, notes);
                Self::execute(state, reply_to, request, env)
            },

            FesAction::Release { reply_to, slot_id } => {
                let request = ReservationRequest::release(slot_id, &reply_to.nick);
                Self::execute(state, reply_to, request, env)
            },

            FesAction::Listed { reply_to, lines } => {
                state.in_flight = state.in_flight.saturating_sub(1);
                smallvec![Self::reply(env, reply_to.channel, lines)]
            },

            FesAction::OperationCompleted {
                reply_to,
                request,
                outcome,
            } => {
                state.in_flight = state.in_flight.saturating_sub(1);
                match outcome {
                    Outcome::Persisted => state.persisted += 1,
                    Outcome::Failed => state.failed += 1,
                }

                let line = outcome_line(&request, outcome, &reply_to.nick);
                smallvec![Self::reply(env, reply_to.channel, vec![line])]
            },

            FesAction::OperationFaulted {
                reply_to,
                operation,
                error,
            } => {
                state.in_flight = state.in_flight.saturating_sub(1);
                state.faulted += 1;
                state.last_fault = Some(error.to_string());

                let operation = operation.map_or("list", Operation::verb);
                tracing::error!(
                    %error,
                    operation,
                    channel = %reply_to.channel,
                    nick = %reply_to.nick,
                    "Command failed on a transport fault"
                );
                metrics::counter!("fe_slots.faults", "operation" => operation).increment(1);

                SmallVec::new()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::panic)]

    use super::*;
    use fe_slots_core::codec::RowCodec;
    use fe_slots_core::document::DocumentError;
    use fe_slots_core::registry::ReservationRegistry;
    use fe_slots_core::slot::{SlotFilter, SlotId};
    use fe_slots_testing::{
        MockDocumentStore, RecordingReplies, ReducerTest, assertions, fixtures, run_effects,
        test_clock,
    };
    use std::sync::Arc;

    fn env_with(document: Arc<MockDocumentStore>) -> (FesEnvironment, Arc<RecordingReplies>) {
        let replies = Arc::new(RecordingReplies::new());
        let registry =
            ReservationRegistry::new(document, Arc::new(test_clock()), RowCodec::default());
        (FesEnvironment::new(registry, replies.clone()), replies)
    }

    fn env() -> FesEnvironment {
        env_with(Arc::new(MockDocumentStore::new(fixtures::BOARD))).0
    }

    fn alice() -> ReplyTarget {
        ReplyTarget::new("#qa", "alice")
    }

    #[test]
    fn commands_schedule_one_future_and_count_in_flight() {
        ReducerTest::new(FesReducer::new())
            .with_env(env())
            .given_state(FesState::default())
            .when_action(FesAction::Release {
                reply_to: alice(),
                slot_id: SlotId::new(3),
            })
            .then_state(|state| assert_eq!(state.in_flight, 1))
            .then_effects(|effects| {
                assertions::assert_effects_count(effects, 1);
                assertions::assert_has_future_effect(effects);
            })
            .run();
    }

    #[test]
    fn completion_updates_counters() {
        let request = ReservationRequest::release(SlotId::new(3), "alice");

        ReducerTest::new(FesReducer::new())
            .with_env(env())
            .given_state(FesState {
                in_flight: 1,
                ..FesState::default()
            })
            .when_action(FesAction::OperationCompleted {
                reply_to: alice(),
                request,
                outcome: Outcome::Failed,
            })
            .then_state(|state| {
                assert_eq!(state.in_flight, 0);
                assert_eq!(state.failed, 1);
                assert_eq!(state.persisted, 0);
            })
            .then_effects(assertions::assert_has_future_effect)
            .run();
    }

    #[test]
    fn transport_faults_are_recorded_without_reply() {
        ReducerTest::new(FesReducer::new())
            .with_env(env())
            .given_state(FesState {
                in_flight: 1,
                ..FesState::default()
            })
            .when_action(FesAction::OperationFaulted {
                reply_to: alice(),
                operation: Some(Operation::Reserve),
                error: DocumentError::Transport("connection refused".into()),
            })
            .then_state(|state| {
                assert_eq!(state.in_flight, 0);
                assert_eq!(state.faulted, 1);
                assert_eq!(
                    state.last_fault.as_deref(),
                    Some("request failed: connection refused")
                );
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[tokio::test]
    async fn list_effect_feeds_back_rendered_lines() {
        let reducer = FesReducer::new();
        let env = env();
        let mut state = FesState::default();

        let effects = reducer.reduce(
            &mut state,
            FesAction::List {
                reply_to: alice(),
                filter: SlotFilter::Available,
            },
            &env,
        );
        let actions = run_effects(effects.into_vec()).await;

        match actions.as_slice() {
            [FesAction::Listed { lines, .. }] => {
                assert_eq!(lines, &vec!["Currently Available FEs: FE2, FE4".to_string()]);
            },
            other => panic!("unexpected actions: {other:?}"),
        }
    }

    #[tokio::test]
    async fn reserve_effect_reports_outcome_and_reply_reaches_channel() {
        let document = Arc::new(MockDocumentStore::new(fixtures::SINGLE_FREE));
        let (env, replies) = env_with(document.clone());
        let reducer = FesReducer::new();
        let mut state = FesState::default();

        let effects = reducer.reduce(
            &mut state,
            FesAction::Reserve {
                reply_to: alice(),
                slot_id: SlotId::new(7),
                ticket: "JIRA-9".into(),
                notes: "testing".into(),
            },
            &env,
        );
        let mut actions = run_effects(effects.into_vec()).await;
        assert_eq!(actions.len(), 1);

        let completed = actions.remove(0);
        assert!(matches!(
            completed,
            FesAction::OperationCompleted {
                outcome: Outcome::Persisted,
                ..
            }
        ));

        let effects = reducer.reduce(&mut state, completed, &env);
        assert!(run_effects(effects.into_vec()).await.is_empty());

        assert_eq!(state, FesState {
            persisted: 1,
            ..FesState::default()
        });
        assert_eq!(replies.sent(), vec![(
            "#qa".to_string(),
            "FE7 has been reserved, alice".to_string()
        )]);
    }

    #[test]
    fn outcome_lines_name_slot_and_requester() {
        let reserve = ReservationRequest::reserve(SlotId::new(7), "alice", "JIRA-9", "");
        let release = ReservationRequest::release(SlotId::new(7), "bob");

        assert_eq!(
            outcome_line(&reserve, Outcome::Persisted, "alice"),
            "FE7 has been reserved, alice"
        );
        assert_eq!(
            outcome_line(&reserve, Outcome::Failed, "alice"),
            "I was unable to reserve FE7 for you alice"
        );
        assert_eq!(
            outcome_line(&release, Outcome::Persisted, "bob"),
            "FE7 has been released, bob"
        );
        assert_eq!(
            outcome_line(&release, Outcome::Failed, "bob"),
            "I was unable to release FE7 for you bob"
        );
    }
}

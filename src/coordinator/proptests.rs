//! Property-based tests for the turn coordinator
//!
//! These verify the core invariants across arbitrary message
//! sequences: strict turn alternation, relay routing to the opposite
//! session, append-only logs, and failure isolation.

use super::*;
use crate::mediator::testing::MockMediator;
use crate::mediator::MediatorError;
use crate::store::{Party, Store};
use proptest::prelude::*;
use std::sync::Arc;

fn arb_party() -> impl Strategy<Value = Party> {
    prop_oneof![Just(Party::Party1), Just(Party::Party2)]
}

fn arb_content() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 .,!?']{1,60}"
}

fn arb_script() -> impl Strategy<Value = Vec<(Party, String)>> {
    proptest::collection::vec((arb_party(), arb_content()), 0..12)
}

fn arb_faulty_script() -> impl Strategy<Value = Vec<(Party, String, bool)>> {
    proptest::collection::vec((arb_party(), arb_content(), any::<bool>()), 0..12)
}

fn block_on<F: std::future::Future>(fut: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("runtime")
        .block_on(fut)
}

fn session_id(party: Party) -> String {
    format!("case_1_{party}")
}

proptest! {
    /// For every sequence of successful sends, `waiting_for` is always
    /// the counterpart of the last sender, every mediator message
    /// lands in the opposite session, and both logs grow append-only.
    #[test]
    fn successful_turns_alternate_and_route_correctly(script in arb_script()) {
        let store = Store::open_in_memory().unwrap();
        let mediator = Arc::new(MockMediator::new());
        let coordinator = Coordinator::new(store, mediator.clone());

        coordinator.create_case("case_1", "Alice", "Bob").unwrap();
        prop_assert_eq!(
            coordinator.case_status("case_1").unwrap().waiting_for,
            Party::Party2
        );

        let mut prev_ids: Vec<Vec<String>> = vec![vec![], vec![]];

        for (i, (sender, content)) in script.iter().enumerate() {
            mediator.queue_reply(format!("relay {i}"));

            let receipt = block_on(coordinator.handle_message(
                &session_id(*sender),
                "user",
                content,
            ))
            .unwrap();

            // Alternation: after a successful turn the other party holds it.
            prop_assert_eq!(receipt.waiting_for, sender.other());
            prop_assert_eq!(
                coordinator.case_status("case_1").unwrap().waiting_for,
                sender.other()
            );

            // Routing: the relay is in the opposite session, never the sender's.
            prop_assert_eq!(receipt.reply.session_id, session_id(sender.other()));
            prop_assert_eq!(receipt.message.session_id, session_id(*sender));

            // Append-only: earlier entries are a stable prefix of each log.
            for (idx, party) in [Party::Party1, Party::Party2].into_iter().enumerate() {
                let log = coordinator.list_messages(&session_id(party)).unwrap();
                let ids: Vec<String> = log.iter().map(|m| m.message_id.clone()).collect();
                prop_assert!(ids.starts_with(&prev_ids[idx]));
                prop_assert!(log.windows(2).all(|w| w[0].sequence_id < w[1].sequence_id));
                prev_ids[idx] = ids;
            }
        }

        // Every mediator-authored message in a session corresponds to a
        // send from the sibling session.
        for party in [Party::Party1, Party::Party2] {
            let log = coordinator.list_messages(&session_id(party)).unwrap();
            let relays = log.iter().filter(|m| m.is_mediator()).count();
            let own = log.iter().filter(|m| !m.is_mediator()).count();
            let sent_by_other = script.iter().filter(|(s, _)| *s == party.other()).count();
            let sent_by_me = script.iter().filter(|(s, _)| *s == party).count();
            prop_assert_eq!(relays, sent_by_other);
            prop_assert_eq!(own, sent_by_me);
        }
    }

    /// Mediator failures leave the sender's message persisted, append
    /// nothing to the sibling session, and never move the turn.
    #[test]
    fn mediator_failures_are_isolated(script in arb_faulty_script()) {
        let store = Store::open_in_memory().unwrap();
        let mediator = Arc::new(MockMediator::new());
        let coordinator = Coordinator::new(store, mediator.clone());

        coordinator.create_case("case_1", "Alice", "Bob").unwrap();

        for (sender, content, ok) in &script {
            if *ok {
                mediator.queue_reply("relay");
            } else {
                mediator.queue_error(MediatorError::network("down"));
            }

            let before_turn = coordinator.case_status("case_1").unwrap().waiting_for;
            let before_sender = coordinator.list_messages(&session_id(*sender)).unwrap().len();
            let before_other = coordinator
                .list_messages(&session_id(sender.other()))
                .unwrap()
                .len();

            let result = block_on(coordinator.handle_message(
                &session_id(*sender),
                "user",
                content,
            ));

            let after_sender = coordinator.list_messages(&session_id(*sender)).unwrap().len();
            let after_other = coordinator
                .list_messages(&session_id(sender.other()))
                .unwrap()
                .len();
            let after_turn = coordinator.case_status("case_1").unwrap().waiting_for;

            // The sender's message is kept either way.
            prop_assert_eq!(after_sender, before_sender + 1);

            if *ok {
                prop_assert!(result.is_ok());
                prop_assert_eq!(after_other, before_other + 1);
                prop_assert_eq!(after_turn, sender.other());
            } else {
                prop_assert!(matches!(result, Err(CoordinatorError::Mediator(_))));
                prop_assert_eq!(after_other, before_other);
                prop_assert_eq!(after_turn, before_turn);
            }
        }
    }
}

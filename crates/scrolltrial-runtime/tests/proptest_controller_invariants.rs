#![forbid(unsafe_code)]

//! Property-based tests for the controller state machine.
//!
//! ## Invariants
//!
//! 1. State tracking: after every command the controller is Running with the
//!    last started delta, or Idle after a stop
//! 2. Single job: the live job counter and its peak never exceed 1
//! 3. Idempotent stop: stopping an Idle controller returns nothing
//! 4. Drag is synchronous: a drag never changes the state and its event is
//!    delivered before `perform` returns
//!
//! Run:
//!   cargo test -p scrolltrial-runtime --test proptest_controller_invariants

use std::time::Duration;

use proptest::prelude::*;
use scrolltrial_runtime::{
    ContinuousScrollController, ControllerState, ScrollCommand, ScrollMsg, scroll_channel,
};

fn arb_command() -> impl Strategy<Value = ScrollCommand> {
    prop_oneof![
        (-3i64..=3).prop_map(ScrollCommand::Drag),
        (-3i64..=3).prop_map(ScrollCommand::RateBased),
        Just(ScrollCommand::Stop),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn command_sequences_keep_one_job(commands in prop::collection::vec(arb_command(), 1..16)) {
        let (injector, inbox) = scroll_channel();
        let mut controller = ContinuousScrollController::new(injector)
            .with_tick_period(Duration::from_micros(200));
        let stats = controller.stats();
        let mut expected: Option<i64> = None;

        for command in commands {
            match command {
                ScrollCommand::Drag(amount) => {
                    let _ = inbox.drain();
                    let before = controller.state();
                    controller.perform(command).unwrap();
                    // Queued before perform returns, possibly among ticks.
                    let msgs = inbox.drain();
                    if expected.is_none() {
                        prop_assert_eq!(msgs, vec![ScrollMsg::Wheel { delta: amount }]);
                    } else {
                        let delivered = msgs.contains(&ScrollMsg::Wheel { delta: amount });
                        prop_assert!(delivered, "drag of {} missing from {:?}", amount, msgs);
                    }
                    prop_assert_eq!(controller.state(), before);
                }
                ScrollCommand::RateBased(delta) => {
                    controller.perform(command).unwrap();
                    expected = Some(delta);
                }
                ScrollCommand::Stop => {
                    let was_idle = expected.is_none();
                    let exit = controller.stop();
                    prop_assert_eq!(exit.is_none(), was_idle);
                    expected = None;
                }
            }

            let state = controller.state();
            match expected {
                Some(delta) => {
                    let running = matches!(state, ControllerState::Running { delta: d, .. } if d == delta);
                    prop_assert!(running, "expected Running({}), got {:?}", delta, state);
                }
                None => prop_assert_eq!(state, ControllerState::Idle),
            }
            prop_assert!(stats.active_jobs() <= 1);
            prop_assert!(stats.peak_active_jobs() <= 1);
        }

        controller.stop();
        prop_assert_eq!(stats.active_jobs(), 0);
    }
}

//! Property and fuzz-style tests for robustness of the channel engines.
//!
//! Runs on host (x86_64) only — proptest is not available for ESP32
//! targets.

use iobank::{
    InputCode, InputEngine, InputEvent, InputType, OutputEngine, OutputEvent, OutputState,
};
use proptest::prelude::*;

const IDLE: u16 = 0xFFFF;

fn input_step(engine: &mut InputEngine, word: u16, now: u32) -> Vec<InputEvent> {
    let mut events = Vec::new();
    engine.process(1, word, now, &mut |e: &InputEvent| events.push(*e));
    events
}

// ── Debounce: sub-window glitches are always silent ───────────────

proptest! {
    /// Any single active pulse shorter than or equal to the 50ms switch
    /// debounce window produces no events at all.
    #[test]
    fn switch_glitch_never_emits(
        pulse_ms in 1u32..=50,
        settle_ms in 101u32..1000,
    ) {
        let mut engine = InputEngine::new(InputType::Switch);
        let mut events = input_step(&mut engine, IDLE, 0);

        events.extend(input_step(&mut engine, IDLE & !1, 10));
        events.extend(input_step(&mut engine, IDLE, 10 + pulse_ms));
        events.extend(input_step(&mut engine, IDLE, 10 + pulse_ms + settle_ms));

        prop_assert!(events.is_empty(), "glitch of {pulse_ms}ms emitted {events:?}");
    }

    /// Arbitrary sample/time walks never panic and only ever produce
    /// events with the documented wire codes.
    #[test]
    fn random_walk_codes_stay_in_contract(
        words in proptest::collection::vec(any::<u16>(), 1..200),
        steps in proptest::collection::vec(1u32..500, 1..200),
    ) {
        let mut engine = InputEngine::new(InputType::Switch);
        // A mixed bank: button, rotary pair, security loop, switches.
        engine.set_type(0, InputType::Button).unwrap();
        engine.set_type(1, InputType::Rotary).unwrap();
        engine.set_type(2, InputType::Rotary).unwrap();
        for ch in 4..8 {
            engine.set_type(ch, InputType::Security).unwrap();
        }

        let mut now = 0u32;
        for (word, step) in words.iter().zip(steps.iter().cycle()) {
            now = now.wrapping_add(*step);
            for event in input_step(&mut engine, *word, now) {
                let raw = event.code.code();
                prop_assert!(
                    InputCode::from_code(raw) == Some(event.code),
                    "event code {raw} is outside the wire contract"
                );
                prop_assert!((event.channel as usize) < iobank::CHANNEL_COUNT);
            }
        }
    }

    /// Multi-click counts never exceed the cap, whatever the press train
    /// looks like.
    #[test]
    fn click_counts_never_exceed_cap(presses in 1u8..12) {
        let mut engine = InputEngine::new(InputType::Button);
        let mut now = 0;
        input_step(&mut engine, IDLE, now);

        let mut events = Vec::new();
        for _ in 0..presses {
            now += 10;
            events.extend(input_step(&mut engine, IDLE & !1, now));
            now += 20;
            events.extend(input_step(&mut engine, IDLE & !1, now));
            now += 10;
            events.extend(input_step(&mut engine, IDLE, now));
            now += 40;
            events.extend(input_step(&mut engine, IDLE, now));
        }
        now += 210;
        events.extend(input_step(&mut engine, IDLE, now));

        prop_assert_eq!(events.len(), 1);
        prop_assert_eq!(events[0].code, InputCode::Clicks(presses.min(5)));
    }
}

// ── Output: interlock invariant under arbitrary command streams ───

#[derive(Debug, Clone)]
enum Op {
    Command { channel: u8, on: bool },
    Tick { ms: u32 },
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0u8..2, any::<bool>()).prop_map(|(channel, on)| Op::Command { channel, on }),
        (1u32..3000).prop_map(|ms| Op::Tick { ms }),
    ]
}

proptest! {
    /// Two interlocked channels are never on at the same time, no matter
    /// how commands and polls interleave.
    #[test]
    fn interlocked_pair_never_both_on(ops in proptest::collection::vec(arb_op(), 1..100)) {
        let mut engine = OutputEngine::default();
        engine.set_interlock(0, 1).unwrap();
        engine.set_interlock(1, 0).unwrap();

        let mut sink = |_: &OutputEvent| {};
        let mut now = 0u32;
        engine.process(now, &mut sink);

        for op in ops {
            match op {
                Op::Command { channel, on } => {
                    let state = if on { OutputState::On } else { OutputState::Off };
                    engine.handle_command(1, channel, state, &mut sink).unwrap();
                }
                Op::Tick { ms } => {
                    now = now.wrapping_add(ms);
                    engine.process(now, &mut sink);
                }
            }
            let both_on =
                engine.state(0).unwrap().is_on() && engine.state(1).unwrap().is_on();
            prop_assert!(!both_on, "interlocked pair became simultaneously active");
        }
    }

    /// Every reported transition is a real change: replaying the event
    /// stream from the initial all-off state reconstructs the engine's
    /// final states.
    #[test]
    fn event_stream_mirrors_state(ops in proptest::collection::vec(arb_op(), 1..100)) {
        let mut engine = OutputEngine::default();
        let mut shadow = [OutputState::Off; 2];
        let mut now = 0u32;

        for op in ops {
            let mut fired: Vec<OutputEvent> = Vec::new();
            let mut sink = |e: &OutputEvent| fired.push(*e);
            match op {
                Op::Command { channel, on } => {
                    let state = if on { OutputState::On } else { OutputState::Off };
                    engine.handle_command(1, channel, state, &mut sink).unwrap();
                }
                Op::Tick { ms } => {
                    now = now.wrapping_add(ms);
                    engine.process(now, &mut sink);
                }
            }
            for event in fired {
                let slot = &mut shadow[event.channel as usize];
                prop_assert!(*slot != event.state, "event reported without a state change");
                *slot = event.state;
            }
        }

        prop_assert_eq!(shadow[0], engine.state(0).unwrap());
        prop_assert_eq!(shadow[1], engine.state(1).unwrap());
    }
}

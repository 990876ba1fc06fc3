//! Input event engine — 16 channels of debounce and gesture detection.
//!
//! The host loop samples the expander once per iteration and hands the raw
//! 16-bit word plus its millisecond clock to [`InputEngine::process`]. Each
//! channel runs one of three per-type state machines:
//!
//! - a 5-state debounce machine shared by BUTTON, CONTACT, PRESS, SWITCH
//!   and TOGGLE, with multi-click and hold detection layered on for BUTTON;
//! - the quadrature decode tables in [`rotary`] for ROTARY channel pairs;
//! - the 4-wire loop classifier in [`security`] for SECURITY groups.
//!
//! Polarity follows pull-up wiring: a raw `1` is inactive/open, `0` is
//! active/closed, and the per-channel invert flag XORs the sampled bit.
//!
//! Time is tracked as a per-channel milliseconds-in-state accumulator fed
//! by wrapping deltas of the caller's u32 clock, so multi-millisecond poll
//! gaps and 32-bit clock wraparound never corrupt comparisons.

pub mod rotary;
pub mod security;

use log::debug;

use crate::error::{Error, Result};
use crate::events::{CHANNEL_COUNT, InputCode, InputEvent, InputType};
use crate::ports::InputSink;
use security::SecurityState;

// Debounce windows. BUTTON and ROTARY need short windows so fast
// multi-clicks and rapid rotations are not swallowed; simple transition
// types can afford longer ones.
const BUTTON_DEBOUNCE_LOW_MS: u32 = 15;
const BUTTON_DEBOUNCE_HIGH_MS: u32 = 30;
const OTHER_DEBOUNCE_LOW_MS: u32 = 50;
const OTHER_DEBOUNCE_HIGH_MS: u32 = 100;

/// How long to wait for another click before reporting a multi-click.
const MULTI_CLICK_MS: u32 = 200;
/// How long before a press is considered a hold.
const HOLD_MS: u32 = 500;
/// Maximum count reported in a multi-click event.
const MAX_CLICKS: u8 = 5;

/// Phase of the shared debounce machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DebouncePhase {
    /// Stable inactive.
    IsHigh,
    /// Confirming an inactive → active transition.
    DebounceLow,
    /// Stable active.
    IsLow,
    /// Confirming an active → inactive transition.
    DebounceHigh,
    /// BUTTON only: waiting for a repeat click.
    AwaitMulti,
}

/// Per-channel runtime state. The variant always matches the configured
/// type role; `set_type` resets it to the baseline for the new type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChannelState {
    Debounce {
        phase: DebouncePhase,
        clicks: u8,
        holding: bool,
    },
    Rotary {
        table: u8,
    },
    Security {
        loop_state: SecurityState,
    },
}

#[derive(Debug, Clone, Copy)]
struct Channel {
    ty: InputType,
    invert: bool,
    disabled: bool,
    /// Milliseconds spent in the current state; reset on every state entry.
    elapsed_ms: u32,
    state: ChannelState,
}

impl Channel {
    fn new(ty: InputType) -> Self {
        Self {
            ty,
            invert: false,
            disabled: false,
            elapsed_ms: 0,
            state: baseline_state(ty),
        }
    }
}

fn baseline_state(ty: InputType) -> ChannelState {
    match ty {
        InputType::Rotary => ChannelState::Rotary {
            table: rotary::START,
        },
        InputType::Security => ChannelState::Security {
            loop_state: SecurityState::Unknown,
        },
        _ => ChannelState::Debounce {
            phase: DebouncePhase::IsHigh,
            clicks: 0,
            holding: false,
        },
    }
}

fn debounce_low_ms(ty: InputType) -> u32 {
    match ty {
        InputType::Button | InputType::Rotary => BUTTON_DEBOUNCE_LOW_MS,
        _ => OTHER_DEBOUNCE_LOW_MS,
    }
}

fn debounce_high_ms(ty: InputType) -> u32 {
    match ty {
        InputType::Button | InputType::Rotary => BUTTON_DEBOUNCE_HIGH_MS,
        _ => OTHER_DEBOUNCE_HIGH_MS,
    }
}

/// The input event engine for one bank of 16 channels.
pub struct InputEngine {
    channels: [Channel; CHANNEL_COUNT],
    /// Clock value at the previous `process` call.
    last_update_ms: u32,
    /// False until the first `process` call establishes the clock baseline.
    primed: bool,
}

impl Default for InputEngine {
    fn default() -> Self {
        Self::new(InputType::Switch)
    }
}

impl InputEngine {
    /// Create an engine with every channel set to `default_type`,
    /// not inverted, enabled, and in the stable inactive state.
    pub fn new(default_type: InputType) -> Self {
        Self {
            channels: [Channel::new(default_type); CHANNEL_COUNT],
            last_update_ms: 0,
            primed: false,
        }
    }

    // ── Configuration ─────────────────────────────────────────────

    pub fn get_type(&self, channel: u8) -> Result<InputType> {
        Ok(self.channel(channel)?.ty)
    }

    /// Set a channel's type and reset its runtime state to the inactive
    /// baseline. Changing semantics mid-flight must not leave a stale
    /// state behind.
    pub fn set_type(&mut self, channel: u8, ty: InputType) -> Result<()> {
        let ch = self.channel_mut(channel)?;
        ch.ty = ty;
        ch.state = baseline_state(ty);
        ch.elapsed_ms = 0;
        Ok(())
    }

    pub fn get_invert(&self, channel: u8) -> Result<bool> {
        Ok(self.channel(channel)?.invert)
    }

    pub fn set_invert(&mut self, channel: u8, invert: bool) -> Result<()> {
        self.channel_mut(channel)?.invert = invert;
        Ok(())
    }

    pub fn get_disabled(&self, channel: u8) -> Result<bool> {
        Ok(self.channel(channel)?.disabled)
    }

    /// Freeze or unfreeze a channel. A disabled ROTARY or SECURITY channel
    /// freezes its whole pair or loop without shifting how later pairs and
    /// loops are grouped.
    pub fn set_disabled(&mut self, channel: u8, disabled: bool) -> Result<()> {
        self.channel_mut(channel)?.disabled = disabled;
        Ok(())
    }

    // ── Processing ────────────────────────────────────────────────

    /// Advance every channel by the time elapsed since the previous call
    /// and report resulting events through `sink`, in ascending channel
    /// order, before returning.
    ///
    /// `sample` is the raw expander word (bit `n` = channel `n`);
    /// `now_ms` is the caller's monotonic millisecond clock, which may
    /// wrap. `id` is echoed back on every event.
    pub fn process<S: InputSink>(&mut self, id: u8, sample: u16, now_ms: u32, sink: &mut S) {
        let delta = if self.primed {
            now_ms.wrapping_sub(self.last_update_ms)
        } else {
            0
        };
        self.primed = true;
        self.last_update_ms = now_ms;

        let mut events: heapless::Vec<InputEvent, CHANNEL_COUNT> = heapless::Vec::new();

        // Rotary channels consume values in pairs and security channels in
        // groups of four, accumulated in pass order (gaps allowed).
        // Membership is by type alone: a disabled member freezes its own
        // pair or loop but never shifts a later group's window.
        let mut rotary_pending: Option<(bool, bool)> = None;
        let mut loop_bits = [false; 4];
        let mut loop_len = 0usize;
        let mut loop_frozen = false;

        for i in 0..CHANNEL_COUNT {
            let ch = &mut self.channels[i];

            // Disabled channels keep ticking so in-state timings stay
            // aligned when re-enabled, but the machine itself is frozen.
            ch.elapsed_ms = ch.elapsed_ms.wrapping_add(delta);

            let raw = (sample >> i) & 1 == 1;
            // Effective logical value; 1 = inactive/open under pull-up wiring.
            let value = raw ^ ch.invert;
            let active = !value;

            let code = match ch.ty {
                InputType::Rotary => match rotary_pending.take() {
                    None => {
                        rotary_pending = Some((value, ch.disabled));
                        None
                    }
                    Some((first, first_disabled)) => {
                        if ch.disabled || first_disabled {
                            None
                        } else {
                            let gray = (usize::from(value) << 1) | usize::from(first);
                            Self::step_rotary(ch, gray)
                        }
                    }
                },
                InputType::Security => {
                    loop_bits[loop_len] = raw;
                    loop_frozen |= ch.disabled;
                    loop_len += 1;
                    if loop_len == 4 {
                        loop_len = 0;
                        let frozen = core::mem::take(&mut loop_frozen);
                        if frozen {
                            None
                        } else {
                            Self::step_security(ch, loop_bits)
                        }
                    } else {
                        None
                    }
                }
                _ if ch.disabled => None,
                _ => Self::step_debounce(ch, active),
            };

            if let Some(code) = code {
                // Capacity is CHANNEL_COUNT and each channel reports at
                // most once per pass, so the push cannot fail.
                let _ = events.push(InputEvent {
                    id,
                    channel: i as u8,
                    channel_type: self.channels[i].ty,
                    code,
                });
            }
        }

        for event in &events {
            debug!(
                "input event: ch={} type={:?} code={}",
                event.channel,
                event.channel_type,
                event.code.code()
            );
            sink.on_input_event(event);
        }
    }

    // ── Queries ───────────────────────────────────────────────────

    /// Re-announce a channel's current stable state without mutating
    /// anything — used to refresh host state after a reconnect.
    ///
    /// Only CONTACT/SWITCH channels and the reporting channel of a
    /// SECURITY loop answer; channels mid-debounce, disabled channels,
    /// and other types stay silent.
    pub fn query<S: InputSink>(&self, id: u8, channel: u8, sink: &mut S) -> Result<()> {
        let ch = self.channel(channel)?;
        if let Some(code) = self.query_code(channel, ch) {
            sink.on_input_event(&InputEvent {
                id,
                channel,
                channel_type: ch.ty,
                code,
            });
        }
        Ok(())
    }

    /// [`query`](Self::query) across every channel, in ascending order.
    pub fn query_all<S: InputSink>(&self, id: u8, sink: &mut S) {
        for channel in 0..CHANNEL_COUNT as u8 {
            // Index is always in range.
            let _ = self.query(id, channel, sink);
        }
    }

    // ── Internal ──────────────────────────────────────────────────

    fn channel(&self, channel: u8) -> Result<&Channel> {
        self.channels
            .get(usize::from(channel))
            .ok_or(Error::InvalidChannel(channel))
    }

    fn channel_mut(&mut self, channel: u8) -> Result<&mut Channel> {
        self.channels
            .get_mut(usize::from(channel))
            .ok_or(Error::InvalidChannel(channel))
    }

    fn query_code(&self, channel: u8, ch: &Channel) -> Option<InputCode> {
        if ch.disabled {
            return None;
        }
        match (ch.ty, ch.state) {
            (InputType::Contact | InputType::Switch, ChannelState::Debounce { phase, .. }) => {
                match phase {
                    DebouncePhase::IsHigh => Some(InputCode::High),
                    DebouncePhase::IsLow => Some(InputCode::Low),
                    _ => None,
                }
            }
            (InputType::Security, ChannelState::Security { loop_state }) => {
                if self.is_loop_reporter(channel) {
                    loop_state.event()
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    /// A security loop reports on its fourth channel, counting SECURITY
    /// channels in pass order. Disabled channels still count so a loop's
    /// window never moves while one of its members is disabled.
    fn is_loop_reporter(&self, channel: u8) -> bool {
        let mut count = 0usize;
        for (i, ch) in self.channels.iter().enumerate() {
            if ch.ty == InputType::Security {
                count += 1;
                if i == usize::from(channel) {
                    return count % 4 == 0;
                }
            }
        }
        false
    }

    fn step_rotary(ch: &mut Channel, gray: usize) -> Option<InputCode> {
        let ChannelState::Rotary { table } = &mut ch.state else {
            // Type changed without a reset cannot happen through the
            // public surface; recover to the baseline.
            ch.state = baseline_state(InputType::Rotary);
            return None;
        };
        let code = rotary::ROTARY_EVENT[usize::from(*table)][gray];
        *table = rotary::ROTARY_STATE[usize::from(*table)][gray];
        code
    }

    fn step_security(ch: &mut Channel, bits: [bool; 4]) -> Option<InputCode> {
        let invert = ch.invert;
        let ChannelState::Security { loop_state } = &mut ch.state else {
            ch.state = baseline_state(InputType::Security);
            return None;
        };
        let classified = security::classify(bits, invert);
        if classified == *loop_state {
            return None;
        }
        *loop_state = classified;
        classified.event()
    }

    fn step_debounce(ch: &mut Channel, active: bool) -> Option<InputCode> {
        let ty = ch.ty;
        let ChannelState::Debounce {
            phase,
            clicks,
            holding,
        } = &mut ch.state
        else {
            ch.state = baseline_state(ty);
            return None;
        };

        match *phase {
            DebouncePhase::IsHigh => {
                *clicks = 0;
                *holding = false;
                if active {
                    *phase = DebouncePhase::DebounceLow;
                    ch.elapsed_ms = 0;
                }
                None
            }

            DebouncePhase::DebounceLow => {
                if !active {
                    // Bounced before the window elapsed — a glitch.
                    *phase = DebouncePhase::IsHigh;
                    ch.elapsed_ms = 0;
                    None
                } else if ch.elapsed_ms > debounce_low_ms(ty) {
                    *phase = DebouncePhase::IsLow;
                    ch.elapsed_ms = 0;
                    // BUTTON clicks are counted on release instead.
                    (ty != InputType::Button).then_some(InputCode::Low)
                } else {
                    None
                }
            }

            DebouncePhase::IsLow => {
                if !active {
                    *phase = DebouncePhase::DebounceHigh;
                    ch.elapsed_ms = 0;
                    None
                } else if ty == InputType::Button && !*holding && ch.elapsed_ms > HOLD_MS {
                    // Hold fires exactly once at onset.
                    *holding = true;
                    ch.elapsed_ms = 0;
                    Some(InputCode::Hold)
                } else {
                    None
                }
            }

            DebouncePhase::DebounceHigh => {
                if active {
                    // Glitch on the release edge.
                    *phase = DebouncePhase::IsLow;
                    ch.elapsed_ms = 0;
                    None
                } else if ch.elapsed_ms > debounce_high_ms(ty) {
                    if ty != InputType::Button {
                        *phase = DebouncePhase::IsHigh;
                        ch.elapsed_ms = 0;
                        // PRESS only reports the active transition.
                        (ty != InputType::Press).then_some(InputCode::High)
                    } else if *holding {
                        *phase = DebouncePhase::IsHigh;
                        ch.elapsed_ms = 0;
                        *holding = false;
                        Some(InputCode::Release)
                    } else {
                        *clicks = (*clicks + 1).min(MAX_CLICKS);
                        *phase = DebouncePhase::AwaitMulti;
                        ch.elapsed_ms = 0;
                        None
                    }
                } else {
                    None
                }
            }

            DebouncePhase::AwaitMulti => {
                if active {
                    // Another press within the window — keep counting.
                    *phase = DebouncePhase::DebounceLow;
                    ch.elapsed_ms = 0;
                    None
                } else if ch.elapsed_ms > MULTI_CLICK_MS {
                    let count = *clicks;
                    *phase = DebouncePhase::IsHigh;
                    ch.elapsed_ms = 0;
                    Some(InputCode::Clicks(count))
                } else {
                    None
                }
            }
        }
    }
}

//! Channel types, event codes, and the event records delivered to sinks.
//!
//! Both engines report through a narrow synchronous callback contract:
//! `(correlation id, channel, channel type, code/state)`. The numeric
//! codes are part of the wire contract with host applications and must
//! not be renumbered:
//!
//! | Code  | Meaning                                            |
//! |-------|----------------------------------------------------|
//! | 1..=5 | multi-click count (BUTTON)                         |
//! | 10    | LOW — closed / alarm / clockwise, per channel type |
//! | 11    | HIGH — open / normal / counter-clockwise           |
//! | 12    | HOLD — button held past the hold threshold         |
//! | 13    | TAMPER — security loop tamper pattern              |
//! | 14    | SHORT — security loop short pattern                |
//! | 15    | FAULT — security loop unrecognised pattern         |
//! | 16    | RELEASE — button released after a hold             |

use serde::{Deserialize, Serialize};

/// Number of channels per bank — one MCP23017-class expander word.
pub const CHANNEL_COUNT: usize = 16;

/// Semantic type of an input channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputType {
    /// Momentary push button with multi-click and hold detection.
    Button,
    /// Door/window contact — reports both transitions.
    Contact,
    /// Momentary sense line — reports only the active transition.
    Press,
    /// One half of a quadrature rotary encoder pair.
    Rotary,
    /// One wire of a 4-wire security sensor loop.
    Security,
    /// Wall switch — reports both transitions.
    Switch,
    /// Retractive toggle — reports both transitions.
    Toggle,
}

/// Semantic type of an output channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputType {
    /// Motorised load — long interlock settling delay.
    Motor,
    /// Plain relay — short interlock settling delay.
    Relay,
    /// Relay with automatic off after a configured duration.
    Timer,
}

/// Physical state of an output channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputState {
    Off,
    On,
}

impl OutputState {
    pub const fn is_on(self) -> bool {
        matches!(self, Self::On)
    }
}

/// Event code reported by the input engine.
///
/// `Clicks(n)` carries `1..=5`; the remaining variants map to the fixed
/// numeric codes documented at module level. There is no "no event"
/// variant — silent channels simply produce nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputCode {
    Clicks(u8),
    Low,
    High,
    Hold,
    Tamper,
    Short,
    Fault,
    Release,
}

impl InputCode {
    /// Numeric code carried on the host wire.
    pub const fn code(self) -> u8 {
        match self {
            Self::Clicks(n) => n,
            Self::Low => 10,
            Self::High => 11,
            Self::Hold => 12,
            Self::Tamper => 13,
            Self::Short => 14,
            Self::Fault => 15,
            Self::Release => 16,
        }
    }

    /// Reverse mapping for hosts that deal in raw codes.
    pub fn from_code(raw: u8) -> Option<Self> {
        match raw {
            1..=5 => Some(Self::Clicks(raw)),
            10 => Some(Self::Low),
            11 => Some(Self::High),
            12 => Some(Self::Hold),
            13 => Some(Self::Tamper),
            14 => Some(Self::Short),
            15 => Some(Self::Fault),
            16 => Some(Self::Release),
            _ => None,
        }
    }
}

/// One semantic input event, delivered synchronously during `process`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputEvent {
    /// Caller-supplied correlation id, echoed back untouched.
    pub id: u8,
    /// Channel index `0..CHANNEL_COUNT`.
    pub channel: u8,
    /// Configured type of the channel at the time of the event.
    pub channel_type: InputType,
    pub code: InputCode,
}

/// One physical output transition, delivered only on actual state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputEvent {
    /// Request id of the command that caused the transition.
    pub id: u8,
    pub channel: u8,
    pub channel_type: OutputType,
    pub state: OutputState,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_roundtrip() {
        for raw in [1, 2, 3, 4, 5, 10, 11, 12, 13, 14, 15, 16] {
            let code = InputCode::from_code(raw).unwrap();
            assert_eq!(code.code(), raw);
        }
    }

    #[test]
    fn reserved_codes_rejected() {
        assert_eq!(InputCode::from_code(0), None);
        assert_eq!(InputCode::from_code(6), None);
        assert_eq!(InputCode::from_code(9), None);
        assert_eq!(InputCode::from_code(17), None);
    }

    #[test]
    fn output_state_is_on() {
        assert!(OutputState::On.is_on());
        assert!(!OutputState::Off.is_on());
    }
}

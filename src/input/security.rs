//! 4-wire security loop classification.
//!
//! A security loop encodes its condition as a bit pattern across four
//! adjacent channels (CH1..CH4 in wiring order):
//!
//! | CH1 CH2 CH3 CH4 | Condition |
//! |-----------------|-----------|
//! | 1 0 1 0         | Normal    |
//! | 1 0 0 0         | Alarm     |
//! | 0 1 0 0         | Tamper    |
//! | 1 0 1 1         | Short     |
//! | anything else   | Fault     |
//!
//! Unrecognised patterns are not errors — a cut or miswired loop is a
//! reportable condition like any other, so they classify as `Fault`.
//!
//! The invert flag of the loop's fourth channel selects normally-open vs
//! normally-closed wiring; it swaps only the Normal/Alarm classification.

use crate::events::InputCode;

/// Classified condition of one 4-wire loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecurityState {
    /// No sample classified yet — the first classification always reports.
    Unknown,
    Normal,
    Alarm,
    Tamper,
    Short,
    Fault,
}

impl SecurityState {
    /// Event code announcing this condition.
    /// `Unknown` has no announcement — nothing has been observed yet.
    pub fn event(self) -> Option<InputCode> {
        match self {
            Self::Unknown => None,
            Self::Normal => Some(InputCode::High),
            Self::Alarm => Some(InputCode::Low),
            Self::Tamper => Some(InputCode::Tamper),
            Self::Short => Some(InputCode::Short),
            Self::Fault => Some(InputCode::Fault),
        }
    }
}

/// Classify one sampled loop. `bits` are the raw values of CH1..CH4.
pub fn classify(bits: [bool; 4], invert: bool) -> SecurityState {
    let state = match bits {
        [true, false, true, false] => SecurityState::Normal,
        [true, false, false, false] => SecurityState::Alarm,
        [false, true, false, false] => SecurityState::Tamper,
        [true, false, true, true] => SecurityState::Short,
        _ => SecurityState::Fault,
    };

    if invert {
        match state {
            SecurityState::Normal => SecurityState::Alarm,
            SecurityState::Alarm => SecurityState::Normal,
            other => other,
        }
    } else {
        state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_patterns() {
        assert_eq!(classify([true, false, true, false], false), SecurityState::Normal);
        assert_eq!(classify([true, false, false, false], false), SecurityState::Alarm);
        assert_eq!(classify([false, true, false, false], false), SecurityState::Tamper);
        assert_eq!(classify([true, false, true, true], false), SecurityState::Short);
    }

    #[test]
    fn unknown_patterns_are_fault() {
        assert_eq!(classify([false, false, false, false], false), SecurityState::Fault);
        assert_eq!(classify([true, true, true, true], false), SecurityState::Fault);
        assert_eq!(classify([false, false, true, false], false), SecurityState::Fault);
    }

    #[test]
    fn invert_swaps_normal_and_alarm_only() {
        assert_eq!(classify([true, false, true, false], true), SecurityState::Alarm);
        assert_eq!(classify([true, false, false, false], true), SecurityState::Normal);
        assert_eq!(classify([false, true, false, false], true), SecurityState::Tamper);
        assert_eq!(classify([true, false, true, true], true), SecurityState::Short);
        assert_eq!(classify([true, true, false, false], true), SecurityState::Fault);
    }

    #[test]
    fn event_codes_match_conditions() {
        assert_eq!(SecurityState::Normal.event(), Some(InputCode::High));
        assert_eq!(SecurityState::Alarm.event(), Some(InputCode::Low));
        assert_eq!(SecurityState::Tamper.event(), Some(InputCode::Tamper));
        assert_eq!(SecurityState::Short.event(), Some(InputCode::Short));
        assert_eq!(SecurityState::Fault.event(), Some(InputCode::Fault));
        assert_eq!(SecurityState::Unknown.event(), None);
    }
}

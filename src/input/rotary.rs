//! Quadrature decode tables for single-detent rotary encoders.
//!
//! The two contacts of an encoder produce a cyclic 2-bit Gray code. The
//! decoder is a 7-state machine driven by that code; a detent only counts
//! once the full forward (or reverse) sequence has been walked, which
//! makes the decode inherently debounced — contact bounce walks the
//! machine back towards [`START`] without ever completing a detent.
//!
//! These tables are a literal protocol definition. Any change alters the
//! observable rotation counting.

use crate::events::InputCode;

pub const START: u8 = 0x0;
pub const CW_FINAL: u8 = 0x1;
pub const CW_BEGIN: u8 = 0x2;
pub const CW_NEXT: u8 = 0x3;
pub const CCW_BEGIN: u8 = 0x4;
pub const CCW_FINAL: u8 = 0x5;
pub const CCW_NEXT: u8 = 0x6;

/// Next state, indexed by `[current state][gray code]`.
pub const ROTARY_STATE: [[u8; 4]; 7] = [
    // START
    [START, CW_BEGIN, CCW_BEGIN, START],
    // CW_FINAL
    [CW_NEXT, START, CW_FINAL, START],
    // CW_BEGIN
    [CW_NEXT, CW_BEGIN, START, START],
    // CW_NEXT
    [CW_NEXT, CW_BEGIN, CW_FINAL, START],
    // CCW_BEGIN
    [CCW_NEXT, START, CCW_BEGIN, START],
    // CCW_FINAL
    [CCW_NEXT, CCW_FINAL, START, START],
    // CCW_NEXT
    [CCW_NEXT, CCW_FINAL, CCW_BEGIN, START],
];

/// Event emitted by each transition, indexed the same way. A completed
/// clockwise detent reports [`InputCode::Low`], counter-clockwise
/// [`InputCode::High`]; every intermediate transition is silent.
pub const ROTARY_EVENT: [[Option<InputCode>; 4]; 7] = [
    // START
    [None, None, None, None],
    // CW_FINAL
    [None, None, None, Some(InputCode::Low)],
    // CW_BEGIN
    [None, None, None, None],
    // CW_NEXT
    [None, None, None, None],
    // CCW_BEGIN
    [None, None, None, None],
    // CCW_FINAL
    [None, None, None, Some(InputCode::High)],
    // CCW_NEXT
    [None, None, None, None],
];
